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

use crate::{BuildError, ProviderError};
use winter_kernel::{
    AddressKindError, AssetIdError, DatumError, OutputReference, PolicyId, ScriptHash,
};
use winter_koios::LookupError;
use winter_plutus::ScriptError;

#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("object contract not configured")]
    Setup,
    #[error("no funding output to seed the minting policy with")]
    NoFundingInputs,
    #[error("no event output to operate on")]
    NoEvents,
    #[error("{events} event output(s) but {given} {what}")]
    LengthMismatch {
        events: usize,
        given: usize,
        what: &'static str,
    },
    #[error("issue with datum of event #{index} ({input}): {source}")]
    Datum {
        index: usize,
        input: OutputReference,
        #[source]
        source: DatumError,
    },
    #[error("invalid object datum: {0}")]
    InvalidDatum(#[source] DatumError),
    #[error("data references cannot be the same (event #{index}, {input})")]
    IdenticalDataReference { index: usize, input: OutputReference },
    #[error("event #{index} ({input}) holds no token")]
    MissingAsset { index: usize, input: OutputReference },
    #[error("script given for event #{index} hashes to {actual}, not to its policy {expected}")]
    ScriptMismatch {
        index: usize,
        expected: PolicyId,
        actual: ScriptHash,
    },
    #[error("no unspent output found at {0}")]
    UnresolvedOutput(OutputReference),
    #[error(transparent)]
    AssetName(#[from] AssetIdError),
    #[error("script lookup failed: {0}")]
    ScriptLookup(#[from] LookupError),
    #[error(transparent)]
    Script(#[from] ScriptError),
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error(transparent)]
    Address(#[from] AddressKindError),
    #[error(transparent)]
    Provider(#[from] ProviderError),
}
