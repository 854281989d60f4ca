// Copyright 2025 PRAGMA
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Parameterization of the protocol's plutus scripts.
//!
//! Compiled validators come from a CIP-57 blueprint. Their parameters are bound by rewriting the
//! untyped plutus core program (see [`flat`]), and the resulting script determines the policy
//! id or address under which the protocol operates.

pub mod blueprint;
pub use blueprint::{Blueprint, Parameter, Preamble, Validator};

pub mod cbor;
pub use cbor::{
    apply_double_cbor_encoding, is_double_cbor_encoded, single_cbor_encoding, wrapping_depth,
};

pub mod contracts;
pub use contracts::{
    OBJECT_EVENT_VALIDATOR, SINGLETON_POLICY, object_event_validator, singleton_policy,
};

pub mod flat;

pub mod script;
pub use script::{ParameterizedContract, PlutusVersion, ScriptError, apply_params_to_script};
