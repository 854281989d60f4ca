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

use crate::TransactionId;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr};

/// A pointer to a transaction output: the transaction that produced it and the output's
/// position in that transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OutputReference {
    pub transaction_id: TransactionId,
    pub index: u64,
}

impl OutputReference {
    pub fn new(transaction_id: TransactionId, index: u64) -> Self {
        Self {
            transaction_id,
            index,
        }
    }
}

impl fmt::Display for OutputReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.transaction_id, self.index)
    }
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum OutputReferenceError {
    #[error("malformed output reference {0}: expected <transaction id>#<index>")]
    Malformed(String),
    #[error("invalid transaction id in output reference {0}")]
    InvalidTransactionId(String),
    #[error("invalid output index in output reference {0}")]
    InvalidIndex(String),
}

impl FromStr for OutputReference {
    type Err = OutputReferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (transaction_id, index) = s
            .split_once('#')
            .ok_or_else(|| OutputReferenceError::Malformed(s.to_string()))?;

        Ok(Self {
            transaction_id: transaction_id
                .parse()
                .map_err(|_| OutputReferenceError::InvalidTransactionId(s.to_string()))?,
            index: index
                .parse()
                .map_err(|_| OutputReferenceError::InvalidIndex(s.to_string()))?,
        })
    }
}

impl Serialize for OutputReference {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for OutputReference {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
