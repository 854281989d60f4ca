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

//! Redeemers understood by the object-event validator and the singleton minting policy. Both
//! carry no field: the constructor index alone selects the branch.

use crate::{
    PlutusData, ToPlutusData, constr_index, from_cbor_no_leftovers, object_datum::expect_constr,
    to_cbor,
};

#[derive(Debug, thiserror::Error)]
pub enum RedeemerError {
    #[error("redeemer is not well-formed plutus data: {0}")]
    Malformed(#[source] minicbor::decode::Error),
    #[error("unknown redeemer constructor {0:?}")]
    UnknownConstructor(Option<u64>),
}

/// Spending branches of the object-event validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventAction {
    /// Consume an event output and re-create it with a new data reference.
    Recreate,
    /// Consume an event output for good, alongside the burn of its singleton.
    Spend,
}

/// Branches of the one-shot singleton policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SingletonAction {
    Mint,
    Burn,
}

impl EventAction {
    pub fn index(self) -> u64 {
        match self {
            Self::Recreate => 0,
            Self::Spend => 1,
        }
    }

    pub fn to_cbor(self) -> Vec<u8> {
        encode_empty_redeemer(self.index())
    }
}

impl SingletonAction {
    pub fn index(self) -> u64 {
        match self {
            Self::Mint => 0,
            Self::Burn => 1,
        }
    }

    pub fn to_cbor(self) -> Vec<u8> {
        encode_empty_redeemer(self.index())
    }
}

impl ToPlutusData for EventAction {
    fn to_plutus_data(&self) -> PlutusData {
        crate::constr!(self.index())
    }
}

impl ToPlutusData for SingletonAction {
    fn to_plutus_data(&self) -> PlutusData {
        crate::constr!(self.index())
    }
}

impl TryFrom<&[u8]> for EventAction {
    type Error = RedeemerError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        match decode_empty_redeemer(bytes)? {
            0 => Ok(Self::Recreate),
            1 => Ok(Self::Spend),
            other => Err(RedeemerError::UnknownConstructor(Some(other))),
        }
    }
}

impl TryFrom<&[u8]> for SingletonAction {
    type Error = RedeemerError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        match decode_empty_redeemer(bytes)? {
            0 => Ok(Self::Mint),
            1 => Ok(Self::Burn),
            other => Err(RedeemerError::UnknownConstructor(Some(other))),
        }
    }
}

/// CBOR of a field-less constructor.
pub fn encode_empty_redeemer(index: u64) -> Vec<u8> {
    to_cbor(&crate::constr!(index))
}

fn decode_empty_redeemer(bytes: &[u8]) -> Result<u64, RedeemerError> {
    let data: PlutusData = from_cbor_no_leftovers(bytes).map_err(RedeemerError::Malformed)?;
    let index = match &data {
        PlutusData::Constr(constr) => constr_index(constr),
        PlutusData::Map(..)
        | PlutusData::BigInt(..)
        | PlutusData::BoundedBytes(..)
        | PlutusData::Array(..) => None,
    };
    match index {
        Some(index) if expect_constr(&data, index, 0).is_ok() => Ok(index),
        _ => Err(RedeemerError::UnknownConstructor(index)),
    }
}
