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

use crate::{PolicyId, hash_from_slice, size};
use std::{fmt, str::FromStr};

/// The maximum length, in bytes, of a native asset name.
pub const MAX_ASSET_NAME_LENGTH: usize = 32;

/// Raw bytes naming an asset under a minting policy. Names are arbitrary bytes; they are usually,
/// but not necessarily, UTF-8 text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct AssetName(Vec<u8>);

impl AssetName {
    pub fn new(bytes: Vec<u8>) -> Result<Self, AssetIdError> {
        if bytes.len() > MAX_ASSET_NAME_LENGTH {
            return Err(AssetIdError::NameTooLong(bytes.len()));
        }
        Ok(Self(bytes))
    }

    pub fn from_text(text: &str) -> Result<Self, AssetIdError> {
        Self::new(text.as_bytes().to_vec())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl AsRef<[u8]> for AssetName {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<AssetName> for Vec<u8> {
    fn from(name: AssetName) -> Self {
        name.0
    }
}

/// A native asset identifier: the policy under which it is minted and its name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AssetId {
    pub policy: PolicyId,
    pub name: AssetName,
}

impl AssetId {
    pub fn new(policy: PolicyId, name: AssetName) -> Self {
        Self { policy, name }
    }

    /// Split a 'unit', i.e. the hex-encoded concatenation of a policy id and an asset name.
    pub fn from_unit(unit: &str) -> Result<Self, AssetIdError> {
        let bytes = hex::decode(unit).map_err(|_| AssetIdError::NotHex(unit.to_string()))?;
        if bytes.len() < size::SCRIPT {
            return Err(AssetIdError::TooShort(unit.to_string()));
        }
        let (policy, name) = bytes.split_at(size::SCRIPT);
        let policy =
            hash_from_slice(policy).ok_or_else(|| AssetIdError::TooShort(unit.to_string()))?;
        Ok(Self {
            policy,
            name: AssetName::new(name.to_vec())?,
        })
    }

    pub fn to_unit(&self) -> String {
        format!("{}{}", self.policy, self.name.to_hex())
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_unit())
    }
}

impl FromStr for AssetId {
    type Err = AssetIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_unit(s)
    }
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum AssetIdError {
    #[error("asset unit {0} is not valid hex")]
    NotHex(String),
    #[error("asset unit {0} is shorter than a policy id")]
    TooShort(String),
    #[error("asset name is {0} bytes long, beyond the {MAX_ASSET_NAME_LENGTH} bytes limit")]
    NameTooLong(usize),
}
