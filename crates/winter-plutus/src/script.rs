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

use crate::{
    cbor::{apply_double_cbor_encoding, flat_bytes, single_cbor_encoding},
    flat::{FlatError, Program, Term},
};
use serde::{Deserialize, Serialize};
use winter_kernel::{
    Address, NetworkName, PlutusData, PolicyId, ScriptHash, ShelleyAddress, ShelleyDelegationPart,
    ShelleyPaymentPart, tagged_script_hash, to_cbor,
};

#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("script is not a valid flat program: {0}")]
    Flat(#[from] FlatError),
    #[error("script is not valid hex: {0}")]
    Hex(#[from] hex::FromHexError),
    #[error("no validator titled '{0}' in the blueprint")]
    UnknownValidator(String),
    #[error("validator '{title}' expects {expected} parameter(s), got {given}")]
    ParameterCount {
        title: String,
        expected: usize,
        given: usize,
    },
    #[error("validator '{title}' hashes to {actual}, but the blueprint declares {declared}")]
    HashMismatch {
        title: String,
        declared: String,
        actual: ScriptHash,
    },
    #[error("unsupported plutus version '{0}'")]
    UnsupportedVersion(String),
    #[error("malformed blueprint: {0}")]
    Blueprint(#[source] serde_json::Error),
    #[error("malformed embedded blueprint: {0}")]
    EmbeddedBlueprint(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlutusVersion {
    V1,
    V2,
    V3,
}

impl PlutusVersion {
    /// The byte prepended to a script before hashing it.
    pub fn tag(self) -> u8 {
        match self {
            PlutusVersion::V1 => 1,
            PlutusVersion::V2 => 2,
            PlutusVersion::V3 => 3,
        }
    }
}

impl std::str::FromStr for PlutusVersion {
    type Err = ScriptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "v1" => Ok(PlutusVersion::V1),
            "v2" => Ok(PlutusVersion::V2),
            "v3" => Ok(PlutusVersion::V3),
            _ => Err(ScriptError::UnsupportedVersion(s.to_string())),
        }
    }
}

/// Bind parameters into a compiled script, in order: the result is `[[script p1] p2] ...`.
///
/// The script may come at any wrapping depth; the result is always wrapped once. Applying no
/// parameter only normalises the wrapping.
pub fn apply_params_to_script(
    script: &[u8],
    params: &[PlutusData],
) -> Result<Vec<u8>, ScriptError> {
    if params.is_empty() {
        return Ok(single_cbor_encoding(script));
    }

    let program = params.iter().fold(
        Program::from_flat(flat_bytes(script))?,
        |program, param| program.apply(Term::data(to_cbor(param))),
    );

    Ok(single_cbor_encoding(&program.to_flat()))
}

/// A script with all of its parameters applied, ready to be hashed or attached to a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterizedContract {
    script: Vec<u8>,
    version: PlutusVersion,
}

impl ParameterizedContract {
    /// Wrap an already-applied script, whatever its wrapping depth.
    pub fn new(script: &[u8], version: PlutusVersion) -> Self {
        Self {
            script: single_cbor_encoding(script),
            version,
        }
    }

    pub fn apply(
        script: &[u8],
        version: PlutusVersion,
        params: &[PlutusData],
    ) -> Result<Self, ScriptError> {
        Ok(Self {
            script: apply_params_to_script(script, params)?,
            version,
        })
    }

    pub fn version(&self) -> PlutusVersion {
        self.version
    }

    /// The script wrapped once.
    pub fn script(&self) -> &[u8] {
        &self.script
    }

    pub fn double_cbor_encoded(&self) -> Vec<u8> {
        apply_double_cbor_encoding(&self.script)
    }

    pub fn hash(&self) -> ScriptHash {
        tagged_script_hash(self.version.tag(), &self.script)
    }

    pub fn policy_id(&self) -> PolicyId {
        self.hash()
    }

    /// The address paying to this script, with an optional stake part.
    pub fn address(&self, network: NetworkName, stake: Option<ShelleyDelegationPart>) -> Address {
        Address::Shelley(ShelleyAddress::new(
            network.into(),
            ShelleyPaymentPart::Script(self.hash()),
            stake.unwrap_or(ShelleyDelegationPart::Null),
        ))
    }
}
