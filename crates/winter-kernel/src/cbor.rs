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

pub use minicbor::{Decode, Decoder, Encode, Encoder, data::Type, decode, encode};

use std::convert::Infallible;

/// Encode any serialisable value `T` into bytes.
#[allow(clippy::unwrap_used)]
pub fn to_cbor<T: Encode<()>>(value: &T) -> Vec<u8> {
    let mut buffer = Vec::new();
    let result: Result<(), encode::Error<Infallible>> = minicbor::encode(value, &mut buffer);
    result.unwrap(); // Infallible
    buffer
}

/// Decode raw bytes into a structured type `T`, assuming no context.
pub fn from_cbor<T: for<'d> Decode<'d, ()>>(bytes: &[u8]) -> Option<T> {
    minicbor::decode(bytes).ok()
}

/// Decode a CBOR input, ensuring that there are no bytes leftovers once decoded.
pub fn from_cbor_no_leftovers<T: for<'d> Decode<'d, ()>>(bytes: &[u8]) -> Result<T, decode::Error> {
    let mut d = Decoder::new(bytes);
    let value = d.decode()?;
    if d.position() != bytes.len() {
        return Err(decode::Error::message(format!(
            "{} leftover byte(s) after position {}",
            bytes.len() - d.position(),
            d.position()
        )));
    }
    Ok(value)
}
