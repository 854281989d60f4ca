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

//! The two contracts of the protocol, instantiated from a blueprint.

use crate::{Blueprint, ParameterizedContract, ScriptError};
use winter_kernel::{AssetName, KeyHash, OutputReference, ToPlutusData, constr};

pub const OBJECT_EVENT_VALIDATOR: &str = "object_event.object_event";

pub const SINGLETON_POLICY: &str = "singleton.singleton_mint_and_burn";

/// The spending validator shared by every event of a deployment, parameterized by the payment
/// credential receiving protocol fees and the fee amount.
pub fn object_event_validator(
    blueprint: &Blueprint,
    fee_credential: &KeyHash,
    fee_lovelace: u64,
) -> Result<ParameterizedContract, ScriptError> {
    blueprint.instantiate(
        OBJECT_EVENT_VALIDATOR,
        &[
            // VerificationKeyCredential
            constr!(0, [*fee_credential]),
            fee_lovelace.to_plutus_data(),
        ],
    )
}

/// A one-shot minting policy: it can only mint while `seed` is being consumed, so at most one
/// token is ever minted under it.
pub fn singleton_policy(
    blueprint: &Blueprint,
    token_name: &AssetName,
    seed: &OutputReference,
) -> Result<ParameterizedContract, ScriptError> {
    blueprint.instantiate(
        SINGLETON_POLICY,
        &[token_name.as_bytes().to_plutus_data(), seed.to_plutus_data()],
    )
}
