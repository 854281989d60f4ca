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

//! Scripts travel wrapped in CBOR byte strings, sometimes twice: blueprints and indexers hand out
//! the flat program wrapped once (which is what the ledger hashes), while some transaction
//! tooling expects a second wrapping. Everything here is a pure function over the byte layout.

use minicbor::{Decoder, bytes::ByteVec};
use winter_kernel::to_cbor;

/// The inner bytes of a definite CBOR byte string spanning the entire input.
pub fn unwrap_byte_string(bytes: &[u8]) -> Option<&[u8]> {
    let mut decoder = Decoder::new(bytes);
    let inner = decoder.bytes().ok()?;
    (decoder.position() == bytes.len()).then_some(inner)
}

pub fn wrap_byte_string(bytes: &[u8]) -> Vec<u8> {
    to_cbor(&ByteVec::from(bytes.to_vec()))
}

/// Number of CBOR byte-string layers around a flat program: 0 for the bare program, 1 for the
/// form found in blueprints, 2 for the double-encoded form.
///
/// A flat program always starts with its major version (`0x01`), which never reads as a CBOR
/// byte-string header, so peeling stops exactly at the program.
pub fn wrapping_depth(script: &[u8]) -> usize {
    let mut depth = 0;
    let mut current = script;
    while let Some(inner) = unwrap_byte_string(current) {
        depth += 1;
        current = inner;
    }
    depth
}

pub fn is_double_cbor_encoded(script: &[u8]) -> bool {
    wrapping_depth(script) >= 2
}

/// The flat program, with every wrapping layer removed.
pub fn flat_bytes(script: &[u8]) -> &[u8] {
    let mut current = script;
    while let Some(inner) = unwrap_byte_string(current) {
        current = inner;
    }
    current
}

/// The script wrapped exactly once, as hashed by the ledger.
pub fn single_cbor_encoding(script: &[u8]) -> Vec<u8> {
    wrap_byte_string(flat_bytes(script))
}

/// The script wrapped exactly twice; already double-wrapped scripts are returned untouched.
pub fn apply_double_cbor_encoding(script: &[u8]) -> Vec<u8> {
    match wrapping_depth(script) {
        0 => wrap_byte_string(&wrap_byte_string(script)),
        1 => wrap_byte_string(script),
        _ => script.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        apply_double_cbor_encoding, flat_bytes, is_double_cbor_encoded, single_cbor_encoding,
        unwrap_byte_string, wrapping_depth,
    };
    use test_case::test_case;

    // (program 1.0.0 (con integer -3))
    const FLAT: &str = "010000480141";

    #[test_case(FLAT, 0)]
    #[test_case("46010000480141", 1)]
    #[test_case("4746010000480141", 2)]
    fn depth(script: &str, expected: usize) {
        let script = hex::decode(script).unwrap();
        assert_eq!(wrapping_depth(&script), expected);
        assert_eq!(is_double_cbor_encoded(&script), expected >= 2);
        assert_eq!(hex::encode(flat_bytes(&script)), FLAT);
    }

    #[test]
    fn double_encoding_is_applied_once() {
        let flat = hex::decode(FLAT).unwrap();
        let once = apply_double_cbor_encoding(&flat);
        assert_eq!(hex::encode(&once), "4746010000480141");
        assert_eq!(apply_double_cbor_encoding(&once), once);
        assert_eq!(
            apply_double_cbor_encoding(&single_cbor_encoding(&flat)),
            once
        );
    }

    #[test]
    fn single_encoding_normalises_every_depth() {
        let flat = hex::decode(FLAT).unwrap();
        let single = single_cbor_encoding(&flat);
        assert_eq!(hex::encode(&single), "46010000480141");
        assert_eq!(single_cbor_encoding(&single), single);
        assert_eq!(single_cbor_encoding(&apply_double_cbor_encoding(&flat)), single);
    }

    #[test]
    fn partial_byte_strings_are_not_wrappers() {
        // Declares 7 bytes but carries 6.
        assert_eq!(unwrap_byte_string(&hex::decode("47010000480141").unwrap()), None);
        // A complete byte string followed by garbage.
        assert_eq!(unwrap_byte_string(&hex::decode("4601000048014100").unwrap()), None);
    }

    #[test]
    fn large_scripts_use_long_headers() {
        let flat = vec![0x01; 300];
        let single = single_cbor_encoding(&flat);
        assert_eq!(&single[..3], &[0x59, 0x01, 0x2c]);
        assert_eq!(wrapping_depth(&single), 1);
    }
}
