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

//! CIP-57 blueprints, as produced by the on-chain toolchain.

use crate::script::{ParameterizedContract, PlutusVersion, ScriptError};
use serde::Deserialize;
use std::sync::LazyLock;
use tracing::debug;
use winter_kernel::{PlutusData, ScriptHash};

static EMBEDDED: LazyLock<Result<Blueprint, String>> = LazyLock::new(|| {
    Blueprint::from_json(include_str!("../blueprint/plutus.json")).map_err(|e| e.to_string())
});

#[derive(Debug, Clone, Deserialize)]
pub struct Blueprint {
    pub preamble: Preamble,
    pub validators: Vec<Validator>,
    #[serde(default)]
    pub definitions: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preamble {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub version: String,
    pub plutus_version: String,
    #[serde(default)]
    pub license: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Validator {
    pub title: String,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    pub compiled_code: String,
    pub hash: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Parameter {
    pub title: String,
    pub schema: serde_json::Value,
}

impl Blueprint {
    pub fn from_json(json: &str) -> Result<Self, ScriptError> {
        serde_json::from_str(json).map_err(ScriptError::Blueprint)
    }

    /// The blueprint of the deployed protocol contracts, parsed on first use.
    pub fn embedded() -> Result<&'static Blueprint, ScriptError> {
        EMBEDDED
            .as_ref()
            .map_err(|e| ScriptError::EmbeddedBlueprint(e.clone()))
    }

    pub fn plutus_version(&self) -> Result<PlutusVersion, ScriptError> {
        self.preamble.plutus_version.parse()
    }

    pub fn validator(&self, title: &str) -> Result<&Validator, ScriptError> {
        self.validators
            .iter()
            .find(|validator| validator.title == title)
            .ok_or_else(|| ScriptError::UnknownValidator(title.to_string()))
    }

    /// Apply a validator's parameters, after checking that its compiled code is the one the
    /// blueprint declares.
    pub fn instantiate(
        &self,
        title: &str,
        params: &[PlutusData],
    ) -> Result<ParameterizedContract, ScriptError> {
        let validator = self.validator(title)?;
        if validator.parameters.len() != params.len() {
            return Err(ScriptError::ParameterCount {
                title: title.to_string(),
                expected: validator.parameters.len(),
                given: params.len(),
            });
        }

        let version = self.plutus_version()?;
        validator.verify(version)?;
        let contract = ParameterizedContract::apply(&validator.compiled_code()?, version, params)?;
        debug!(title, hash = %contract.hash(), "instantiated validator");
        Ok(contract)
    }
}

impl Validator {
    pub fn compiled_code(&self) -> Result<Vec<u8>, ScriptError> {
        Ok(hex::decode(&self.compiled_code)?)
    }

    /// Hash of the unparameterized code, checked against the declared one.
    pub fn verify(&self, version: PlutusVersion) -> Result<ScriptHash, ScriptError> {
        let actual = ParameterizedContract::new(&self.compiled_code()?, version).hash();
        if hex::encode(actual) != self.hash.to_lowercase() {
            return Err(ScriptError::HashMismatch {
                title: self.title.clone(),
                declared: self.hash.clone(),
                actual,
            });
        }
        Ok(actual)
    }
}
