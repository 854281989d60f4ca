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

//! Transactions driving events of the object-event protocol through their lifecycle.

pub mod builder;
pub use builder::{BuildError, BuilderParameters, Price, StagingTxBuilder};

pub mod config;
pub use config::{FactoryConfig, FeeSchedule};

pub mod error;
pub use error::EventError;

pub mod factory;
pub use factory::{EventFactory, address_key_hash, sign_and_submit, utxos_by_out_ref};

pub mod lookup;
pub use lookup::{HttpScriptRegistry, ScriptLookup};

pub mod provider;
pub use provider::{
    ExUnits, HttpFetcher, ProviderError, RedeemerBudget, RedeemerPurpose, TxEvaluator,
    TxSubmitter, UtxoSource, Wallet,
};

pub mod skeleton;
pub use skeleton::{MintStep, OutputStep, ScriptInput, TxBuilder, TxSkeleton, UnsignedTx};

#[cfg(test)]
mod fixtures;
