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

//! The on-chain record of an event, and its plutus-data codec.
//!
//! The record is laid out as `constr#0(int, bytes, bytes, list<bytes>)`:
//!
//! ```text
//! ObjectDatum {
//!   protocol_version: Int,
//!   data_reference: ByteArray,
//!   event_creation_info: ByteArray,
//!   signers: List<ByteArray>,
//! }
//! ```

use crate::{
    BigInt, Constr, OutputReference, PlutusData, ToPlutusData, constr_index,
    from_cbor_no_leftovers, list_of, to_cbor,
};
use serde::{Deserialize, Serialize};

const OBJECT_DATUM_INDEX: u64 = 0;

const OBJECT_DATUM_ARITY: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectDatum {
    pub protocol_version: u64,
    #[serde(with = "hex_bytes")]
    pub data_reference: Vec<u8>,
    /// Transaction id of the event's genesis; empty until the first recreation.
    #[serde(with = "hex_bytes")]
    pub event_creation_info: Vec<u8>,
    #[serde(with = "hex_bytes_list")]
    pub signers: Vec<Vec<u8>>,
}

/// Whether an object datum may be written without any signer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignersPolicy {
    #[default]
    RequireNonEmpty,
    AllowEmpty,
}

#[derive(Debug, thiserror::Error)]
pub enum DatumError {
    #[error("no inline datum")]
    Missing,
    #[error("datum is not well-formed plutus data: {0}")]
    Malformed(#[source] minicbor::decode::Error),
    #[error("datum is not a constructor")]
    NotAConstructor,
    #[error("unexpected constructor index {found:?}, expected {expected}")]
    UnexpectedConstructor { expected: u64, found: Option<u64> },
    #[error("unexpected number of fields {found}, expected {expected}")]
    UnexpectedArity { expected: usize, found: usize },
    #[error("field '{field}' is not {expected}")]
    UnexpectedField {
        field: &'static str,
        expected: &'static str,
    },
    #[error("an object datum must list at least one signer")]
    NoSigners,
}

impl ObjectDatum {
    /// The datum carried by the successor of an event output.
    ///
    /// Protocol version and signers are carried forward; the event creation info is written
    /// once, on the first recreation, with the id of the transaction that produced `consumed`.
    pub fn recreated(&self, data_reference: Vec<u8>, consumed: &OutputReference) -> Self {
        let event_creation_info = if self.event_creation_info.is_empty() {
            consumed.transaction_id.to_vec()
        } else {
            self.event_creation_info.clone()
        };

        Self {
            protocol_version: self.protocol_version,
            data_reference,
            event_creation_info,
            signers: self.signers.clone(),
        }
    }
}

impl ToPlutusData for ObjectDatum {
    fn to_plutus_data(&self) -> PlutusData {
        crate::constr!(
            OBJECT_DATUM_INDEX,
            [
                self.protocol_version,
                self.data_reference,
                self.event_creation_info,
                list_of(&self.signers),
            ]
        )
    }
}

impl TryFrom<&PlutusData> for ObjectDatum {
    type Error = DatumError;

    fn try_from(data: &PlutusData) -> Result<Self, Self::Error> {
        let fields = expect_constr(data, OBJECT_DATUM_INDEX, OBJECT_DATUM_ARITY)?;

        Ok(Self {
            protocol_version: expect_natural(&fields[0], "protocol_version")?,
            data_reference: expect_bytes(&fields[1], "data_reference")?,
            event_creation_info: expect_bytes(&fields[2], "event_creation_info")?,
            signers: expect_list(&fields[3], "signers")?
                .iter()
                .map(|signer| expect_bytes(signer, "signers"))
                .collect::<Result<_, _>>()?,
        })
    }
}

/// Serialise an object datum, refusing signer-less datums unless the policy allows them.
pub fn encode_object_datum(
    datum: &ObjectDatum,
    policy: SignersPolicy,
) -> Result<Vec<u8>, DatumError> {
    if datum.signers.is_empty() && policy == SignersPolicy::RequireNonEmpty {
        return Err(DatumError::NoSigners);
    }
    Ok(to_cbor(&datum.to_plutus_data()))
}

pub fn decode_object_datum(bytes: &[u8]) -> Result<ObjectDatum, DatumError> {
    let data: PlutusData = from_cbor_no_leftovers(bytes).map_err(DatumError::Malformed)?;
    ObjectDatum::try_from(&data)
}

// ----------------------------------------------------------------------------
// Shape checks
// ----------------------------------------------------------------------------

/// The fields of a constructor, once its index and arity have been checked.
pub(crate) fn expect_constr(
    data: &PlutusData,
    index: u64,
    arity: usize,
) -> Result<&[PlutusData], DatumError> {
    let PlutusData::Constr(constr) = data else {
        return Err(DatumError::NotAConstructor);
    };
    check_constr(constr, index, arity)
}

fn check_constr(
    constr: &Constr<PlutusData>,
    index: u64,
    arity: usize,
) -> Result<&[PlutusData], DatumError> {
    let found = constr_index(constr);
    if found != Some(index) {
        return Err(DatumError::UnexpectedConstructor {
            expected: index,
            found,
        });
    }
    if constr.fields.len() != arity {
        return Err(DatumError::UnexpectedArity {
            expected: arity,
            found: constr.fields.len(),
        });
    }
    Ok(&constr.fields)
}

fn expect_natural(data: &PlutusData, field: &'static str) -> Result<u64, DatumError> {
    let invalid = DatumError::UnexpectedField {
        field,
        expected: "a natural number",
    };
    match data {
        PlutusData::BigInt(BigInt::Int(int)) => {
            u64::try_from(i128::from(int.0)).map_err(|_| invalid)
        }
        PlutusData::BigInt(BigInt::BigUInt(bytes)) => {
            let digits = bytes.iter().skip_while(|b| **b == 0).collect::<Vec<_>>();
            if digits.len() > 8 {
                return Err(invalid);
            }
            Ok(digits.into_iter().fold(0, |acc, b| (acc << 8) | u64::from(*b)))
        }
        PlutusData::BigInt(BigInt::BigNInt(..))
        | PlutusData::Constr(..)
        | PlutusData::Map(..)
        | PlutusData::BoundedBytes(..)
        | PlutusData::Array(..) => Err(invalid),
    }
}

fn expect_bytes(data: &PlutusData, field: &'static str) -> Result<Vec<u8>, DatumError> {
    match data {
        PlutusData::BoundedBytes(bytes) => Ok(bytes.to_vec()),
        PlutusData::BigInt(..)
        | PlutusData::Constr(..)
        | PlutusData::Map(..)
        | PlutusData::Array(..) => Err(DatumError::UnexpectedField {
            field,
            expected: "a byte string",
        }),
    }
}

fn expect_list<'a>(
    data: &'a PlutusData,
    field: &'static str,
) -> Result<&'a [PlutusData], DatumError> {
    match data {
        PlutusData::Array(items) => Ok(items),
        PlutusData::BigInt(..)
        | PlutusData::Constr(..)
        | PlutusData::Map(..)
        | PlutusData::BoundedBytes(..) => Err(DatumError::UnexpectedField {
            field,
            expected: "a list",
        }),
    }
}

// ----------------------------------------------------------------------------
// Serde helpers
// ----------------------------------------------------------------------------

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let s = <String>::deserialize(d)?;
        hex::decode(s).map_err(serde::de::Error::custom)
    }
}

mod hex_bytes_list {
    use serde::{Deserialize, Deserializer, Serializer, ser::SerializeSeq};

    pub fn serialize<S: Serializer>(items: &[Vec<u8>], s: S) -> Result<S::Ok, S::Error> {
        let mut seq = s.serialize_seq(Some(items.len()))?;
        for item in items {
            seq.serialize_element(&hex::encode(item))?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Vec<u8>>, D::Error> {
        let items = <Vec<String>>::deserialize(d)?;
        items
            .into_iter()
            .map(|s| hex::decode(s).map_err(serde::de::Error::custom))
            .collect()
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub use test_utils::*;

#[cfg(any(test, feature = "test-utils"))]
mod test_utils {
    use super::ObjectDatum;
    use proptest::{collection, prelude::*};

    pub fn any_object_datum() -> impl Strategy<Value = ObjectDatum> {
        (
            any::<u64>(),
            collection::vec(any::<u8>(), 0..128),
            prop_oneof![Just(vec![]), collection::vec(any::<u8>(), 32)],
            collection::vec(collection::vec(any::<u8>(), 28), 1..5),
        )
            .prop_map(
                |(protocol_version, data_reference, event_creation_info, signers)| ObjectDatum {
                    protocol_version,
                    data_reference,
                    event_creation_info,
                    signers,
                },
            )
    }
}
