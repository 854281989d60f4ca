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

pub use pallas_addresses::{
    Address, Error as AddressError, Network, ShelleyAddress, ShelleyDelegationPart,
    ShelleyPaymentPart,
};
pub use pallas_codec::utils::{Int, KeyValuePairs, MaybeIndefArray};
pub use pallas_crypto::hash::{Hash, Hasher};
pub use pallas_primitives::conway::{BigInt, BoundedBytes, Constr, PlutusData};

pub mod address;
pub use address::{AddressKindError, address_from_str, address_to_string, payment_key_hash};
#[cfg(any(test, feature = "test-utils"))]
pub use address::key_address;

pub mod asset;
pub use asset::{AssetId, AssetIdError, AssetName};

pub mod cbor;
pub use cbor::{from_cbor, from_cbor_no_leftovers, to_cbor};

pub mod hash;
pub use hash::{
    KeyHash, NULL_HASH28, NULL_HASH32, PolicyId, ScriptHash, TransactionId, hash_from_slice, size,
    tagged_script_hash,
};
#[cfg(any(test, feature = "test-utils"))]
pub use hash::{any_hash28, any_hash32};

pub mod network_name;
pub use network_name::NetworkName;
#[cfg(any(test, feature = "test-utils"))]
pub use network_name::any_network_name;

pub mod object_datum;
pub use object_datum::{
    DatumError, ObjectDatum, SignersPolicy, decode_object_datum, encode_object_datum,
};
#[cfg(any(test, feature = "test-utils"))]
pub use object_datum::any_object_datum;

pub mod output_reference;
pub use output_reference::{OutputReference, OutputReferenceError};

pub mod plutus_data;
pub use plutus_data::{ToPlutusData, array, constr_index, list_of, to_constr_tag};

pub mod redeemer;
pub use redeemer::{EventAction, RedeemerError, SingletonAction, encode_empty_redeemer};

pub mod utxo;
pub use utxo::Utxo;

pub mod value;
pub use value::{Value, checked_sum};
