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

use crate::{Hash, Hasher};

// -----------------------------------------------------------------------------
// Hash sizes
// -----------------------------------------------------------------------------

pub mod size {
    pub const CREDENTIAL: usize = 28;

    pub const KEY: usize = CREDENTIAL;

    pub const SCRIPT: usize = CREDENTIAL;

    pub const TRANSACTION_BODY: usize = 32;
}

// -----------------------------------------------------------------------------
// Aliases
// -----------------------------------------------------------------------------

pub type KeyHash = Hash<{ size::KEY }>;

pub type ScriptHash = Hash<{ size::SCRIPT }>;

/// Minting policies are identified by the hash of their script.
pub type PolicyId = ScriptHash;

pub type TransactionId = Hash<{ size::TRANSACTION_BODY }>;

// -----------------------------------------------------------------------------
// Constants
// -----------------------------------------------------------------------------

pub const NULL_HASH28: Hash<28> = Hash::new([0; 28]);

pub const NULL_HASH32: Hash<32> = Hash::new([0; 32]);

/// Interpret a byte slice as a hash, provided it has exactly the right length.
pub fn hash_from_slice<const BYTES: usize>(bytes: &[u8]) -> Option<Hash<BYTES>> {
    <[u8; BYTES]>::try_from(bytes).ok().map(Hash::new)
}

/*
    A script hash is the blake2b-224 digest of the script bytes prefixed with a
    language tag:

      0 for native scripts
      1 for Plutus V1 scripts
      2 for Plutus V2 scripts
      3 for Plutus V3 scripts
*/
pub fn tagged_script_hash(tag: u8, bytes: &[u8]) -> ScriptHash {
    Hasher::<{ 8 * size::SCRIPT }>::hash_tagged(bytes, tag)
}

#[cfg(any(test, feature = "test-utils"))]
pub use tests::*;

#[cfg(any(test, feature = "test-utils"))]
mod tests {
    use super::*;
    use proptest::prelude::*;

    pub fn any_hash28() -> impl Strategy<Value = Hash<28>> {
        any::<[u8; 28]>().prop_map(Hash::from)
    }

    pub fn any_hash32() -> impl Strategy<Value = Hash<32>> {
        any::<[u8; 32]>().prop_map(Hash::from)
    }

    #[test]
    fn hash_from_slice_checks_length() {
        assert_eq!(hash_from_slice::<28>(&[0; 28]), Some(NULL_HASH28));
        assert_eq!(hash_from_slice::<28>(&[0; 32]), None);
        assert_eq!(hash_from_slice::<32>(&[0; 32]), Some(NULL_HASH32));
    }
}
