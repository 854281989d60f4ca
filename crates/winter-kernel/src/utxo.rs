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

use crate::{Address, DatumError, ObjectDatum, OutputReference, Value, decode_object_datum};

/// An unspent transaction output, as reported by a chain provider.
///
/// The inline datum is kept as the raw CBOR found on-chain; it is only interpreted when an
/// operation needs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utxo {
    pub input: OutputReference,
    pub address: Address,
    pub value: Value,
    pub inline_datum: Option<Vec<u8>>,
}

impl Utxo {
    pub fn new(input: OutputReference, address: Address, value: Value) -> Self {
        Self {
            input,
            address,
            value,
            inline_datum: None,
        }
    }

    pub fn with_inline_datum(mut self, datum: Vec<u8>) -> Self {
        self.inline_datum = Some(datum);
        self
    }

    /// Interpret the inline datum as an object datum.
    pub fn object_datum(&self) -> Result<ObjectDatum, DatumError> {
        let bytes = self.inline_datum.as_deref().ok_or(DatumError::Missing)?;
        decode_object_datum(bytes)
    }
}
