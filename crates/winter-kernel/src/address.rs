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

use crate::{Address, AddressError, KeyHash, ShelleyPaymentPart};

#[derive(Debug, thiserror::Error)]
pub enum AddressKindError {
    #[error("address {0} is not payable to a verification key")]
    NotAKeyAddress(String),
    #[error("unable to parse address {address}: {source}")]
    Unparseable {
        address: String,
        #[source]
        source: AddressError,
    },
}

/// Parse an address given either as bech32 or as hex-encoded bytes.
pub fn address_from_str(address: &str) -> Result<Address, AddressKindError> {
    Address::from_bech32(address)
        .or_else(|_| Address::from_hex(address))
        .map_err(|source| AddressKindError::Unparseable {
            address: address.to_string(),
            source,
        })
}

/// Bech32 rendering of an address, falling back to hex for address kinds without a bech32 form.
pub fn address_to_string(address: &Address) -> String {
    address.to_bech32().unwrap_or_else(|_| address.to_hex())
}

/// The verification key hash of the payment part of a Shelley address.
pub fn payment_key_hash(address: &Address) -> Result<KeyHash, AddressKindError> {
    match address {
        Address::Shelley(shelley) => match shelley.payment() {
            ShelleyPaymentPart::Key(hash) => Ok(*hash),
            ShelleyPaymentPart::Script(..) => Err(AddressKindError::NotAKeyAddress(
                address_to_string(address),
            )),
        },
        Address::Byron(..) | Address::Stake(..) => Err(AddressKindError::NotAKeyAddress(
            address_to_string(address),
        )),
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub use test_utils::*;

#[cfg(any(test, feature = "test-utils"))]
mod test_utils {
    use crate::{
        Address, KeyHash, Network, ShelleyAddress, ShelleyDelegationPart, ShelleyPaymentPart,
    };

    /// An enterprise address paying to the given verification key hash.
    pub fn key_address(network: Network, key_hash: KeyHash) -> Address {
        Address::Shelley(ShelleyAddress::new(
            network,
            ShelleyPaymentPart::Key(key_hash),
            ShelleyDelegationPart::Null,
        ))
    }
}
