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

use serde::{Deserialize, Serialize};
use winter_kernel::{Address, NetworkName, SignersPolicy};

/// Where protocol fees go and how much they are. Test networks share one fee address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    #[serde(with = "address")]
    pub mainnet: Address,
    #[serde(with = "address")]
    pub testnet: Address,
    pub lovelace: u64,
}

impl FeeSchedule {
    pub fn address_for(&self, network: NetworkName) -> &Address {
        if network.is_mainnet() {
            &self.mainnet
        } else {
            &self.testnet
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactoryConfig {
    pub network: NetworkName,
    pub fees: FeeSchedule,
    #[serde(default)]
    pub signers: SignersPolicy,
}

impl FactoryConfig {
    pub fn new(network: NetworkName, fees: FeeSchedule) -> Self {
        Self {
            network,
            fees,
            signers: SignersPolicy::default(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn fee_address(&self) -> &Address {
        self.fees.address_for(self.network)
    }
}

mod address {
    use serde::{Deserialize, Deserializer, Serializer, de};
    use winter_kernel::{Address, address_from_str, address_to_string};

    pub fn serialize<S: Serializer>(address: &Address, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&address_to_string(address))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Address, D::Error> {
        let text = String::deserialize(deserializer)?;
        address_from_str(&text).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::FactoryConfig;
    use winter_kernel::{NetworkName, SignersPolicy, address_to_string};

    const CONFIG: &str = r#"{
        "network": "preprod",
        "fees": {
            "mainnet": "addr1vx2fxv4umyhttkxyxp8x0dlpdt3k6cwng5pxj3jhsydzersazypxn",
            "testnet": "addr_test1vz2fxv4umyhttkxyxp8x0dlpdt3k6cwng5pxj3jhsydzersx2safk",
            "lovelace": 1000000
        }
    }"#;

    #[test]
    fn loads_from_json() {
        let config = FactoryConfig::from_json(CONFIG).unwrap();
        assert_eq!(config.network, NetworkName::Preprod);
        assert_eq!(config.fees.lovelace, 1_000_000);
        assert_eq!(config.signers, SignersPolicy::RequireNonEmpty);
    }

    #[test]
    fn picks_fee_address_by_network() {
        let mut config = FactoryConfig::from_json(CONFIG).unwrap();
        assert!(address_to_string(config.fee_address()).starts_with("addr_test1"));
        config.network = NetworkName::Mainnet;
        assert!(address_to_string(config.fee_address()).starts_with("addr1"));
    }

    #[test]
    fn json_roundtrip() {
        let config = FactoryConfig::from_json(CONFIG).unwrap();
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(FactoryConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn rejects_malformed_addresses() {
        let config = CONFIG.replace("addr1vx2", "addr1zz2");
        assert!(FactoryConfig::from_json(&config).is_err());
    }
}
