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

use crate::Network;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum NetworkName {
    Mainnet,
    Preprod,
    Preview,
    Testnet(u32),
}

impl std::fmt::Display for NetworkName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mainnet => write!(f, "mainnet"),
            Self::Preprod => write!(f, "preprod"),
            Self::Preview => write!(f, "preview"),
            Self::Testnet(magic) => write!(f, "testnet:{}", magic),
        }
    }
}

impl std::str::FromStr for NetworkName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mainnet" => Ok(Self::Mainnet),
            "preprod" => Ok(Self::Preprod),
            "preview" => Ok(Self::Preview),
            other => {
                let magic = other
                    .strip_prefix("testnet:")
                    .ok_or(format!("Invalid network name {}", s))?;

                magic
                    .parse::<u32>()
                    .map(NetworkName::Testnet)
                    .map_err(|e| e.to_string())
            }
        }
    }
}

impl From<NetworkName> for Network {
    fn from(value: NetworkName) -> Self {
        if value.is_mainnet() {
            Network::Mainnet
        } else {
            Network::Testnet
        }
    }
}

impl NetworkName {
    pub fn is_mainnet(self) -> bool {
        self == NetworkName::Mainnet
    }

    /// The network id found in addresses and transaction bodies: 1 for mainnet and 0 for every
    /// test network.
    pub fn network_id(self) -> u8 {
        if self.is_mainnet() { 1 } else { 0 }
    }

    pub fn to_network_magic(self) -> u32 {
        match self {
            Self::Mainnet => 764824073,
            Self::Preprod => 1,
            Self::Preview => 2,
            Self::Testnet(magic) => magic,
        }
    }
}

impl Serialize for NetworkName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for NetworkName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub use test_utils::*;

#[cfg(any(test, feature = "test-utils"))]
mod test_utils {
    use super::NetworkName::{self, *};
    use proptest::{prelude::*, prop_oneof};

    pub fn any_network_name() -> impl Strategy<Value = NetworkName> {
        prop_oneof![
            Just(Mainnet),
            Just(Preprod),
            Just(Preview),
            (3..u32::MAX).prop_map(Testnet)
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::{
        NetworkName::{self, *},
        any_network_name,
    };
    use crate::Network;
    use proptest::prelude::*;
    use std::str::FromStr;
    use test_case::test_case;

    proptest! {
        #[test]
        fn prop_can_parse_pretty_print_network_name(network in any_network_name()) {
            let name = format!("{}", network);
            assert_eq!(
                FromStr::from_str(&name),
                Ok(network),
            )
        }
    }

    #[test_case(Mainnet, 1; "mainnet")]
    #[test_case(Preprod, 0; "preprod")]
    #[test_case(Preview, 0; "preview")]
    #[test_case(Testnet(42), 0; "custom testnet")]
    fn network_ids(network: NetworkName, expected: u8) {
        assert_eq!(network.network_id(), expected);
        assert_eq!(Network::from(network).value(), expected);
    }

    #[test]
    fn unknown_names_are_rejected() {
        assert!(NetworkName::from_str("testnet2").is_err());
        assert!(NetworkName::from_str("invalidnet").is_err());
        assert_eq!(NetworkName::from_str("Mainnet"), Ok(Mainnet));
    }
}
