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

use crate::LookupError;
use serde::{Deserialize, Serialize};
use winter_kernel::{
    AssetId, OutputReference, ScriptHash, TransactionId, Utxo, Value, address_from_str,
    hash_from_slice,
};

/// An entry of `/script_info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptInfo {
    pub script_hash: String,
    #[serde(default)]
    pub creation_tx_hash: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    /// The script, wrapped once in CBOR. Absent for native scripts.
    #[serde(default)]
    pub bytes: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
}

/// An entry of `/asset_utxos` (extended).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtxoInfo {
    pub tx_hash: String,
    pub tx_index: u64,
    pub address: String,
    /// Lovelace, as a decimal string.
    pub value: String,
    #[serde(default)]
    pub inline_datum: Option<InlineDatum>,
    #[serde(default)]
    pub asset_list: Option<Vec<AssetInfo>>,
    #[serde(default)]
    pub is_spent: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineDatum {
    pub bytes: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetInfo {
    pub policy_id: String,
    #[serde(default)]
    pub asset_name: Option<String>,
    pub quantity: String,
}

impl ScriptInfo {
    pub fn hash(&self) -> Result<ScriptHash, LookupError> {
        hex::decode(&self.script_hash)
            .ok()
            .and_then(|bytes| hash_from_slice(&bytes))
            .ok_or_else(|| malformed("script_hash", &self.script_hash))
    }

    pub fn script_bytes(&self) -> Result<Option<Vec<u8>>, LookupError> {
        self.bytes
            .as_deref()
            .map(|bytes| hex::decode(bytes).map_err(|_| malformed("bytes", bytes)))
            .transpose()
    }
}

impl UtxoInfo {
    pub fn output_reference(&self) -> Result<OutputReference, LookupError> {
        let transaction_id: TransactionId = hex::decode(&self.tx_hash)
            .ok()
            .and_then(|bytes| hash_from_slice(&bytes))
            .ok_or_else(|| malformed("tx_hash", &self.tx_hash))?;
        Ok(OutputReference::new(transaction_id, self.tx_index))
    }

    pub fn to_utxo(&self) -> Result<Utxo, LookupError> {
        let address =
            address_from_str(&self.address).map_err(|_| malformed("address", &self.address))?;

        let mut value = Value::new(parse_quantity("value", &self.value)?);
        for asset in self.asset_list.iter().flatten() {
            value.insert(asset.asset_id()?, parse_quantity("quantity", &asset.quantity)?);
        }

        let utxo = Utxo::new(self.output_reference()?, address, value);
        match &self.inline_datum {
            None => Ok(utxo),
            Some(datum) => Ok(utxo.with_inline_datum(
                hex::decode(&datum.bytes).map_err(|_| malformed("inline_datum", &datum.bytes))?,
            )),
        }
    }
}

impl AssetInfo {
    pub fn asset_id(&self) -> Result<AssetId, LookupError> {
        let unit = format!(
            "{}{}",
            self.policy_id,
            self.asset_name.as_deref().unwrap_or_default()
        );
        AssetId::from_unit(&unit).map_err(|_| malformed("asset", &unit))
    }
}

fn parse_quantity(field: &'static str, quantity: &str) -> Result<u64, LookupError> {
    quantity.parse().map_err(|_| malformed(field, quantity))
}

fn malformed(field: &'static str, value: &str) -> LookupError {
    LookupError::Malformed {
        field,
        value: value.to_string(),
    }
}

/// The `[policy, name]` pairs expected by `/asset_utxos`.
pub(crate) fn asset_list(assets: &[AssetId]) -> Vec<[String; 2]> {
    assets
        .iter()
        .map(|asset| [hex::encode(asset.policy), asset.name.to_hex()])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{ScriptInfo, UtxoInfo};
    use crate::LookupError;
    use pretty_assertions::assert_eq;
    use winter_kernel::{AssetId, address_to_string};

    const UTXO: &str = r#"{
        "tx_hash": "6773419548e12aad793c1c38c8dfdf1d93bac0689c4c5cab68b26f5f26532c90",
        "tx_index": 1,
        "address": "addr_test1wqkva4m3wrp3jtrpupyethye9p992saqwck9rslv754xgrs62ngp4",
        "value": "2000000",
        "stake_address": null,
        "epoch_no": 120,
        "inline_datum": { "bytes": "d87980", "value": { "constructor": 0, "fields": [] } },
        "reference_script": null,
        "asset_list": [{
            "decimals": 0,
            "quantity": "1",
            "policy_id": "af349fbec5cbf3b8c211b27aae50eaebc68e35ef7654df1c403581ee",
            "asset_name": "426c61636b205465612054657374",
            "fingerprint": "asset1"
        }],
        "is_spent": false
    }"#;

    #[test]
    fn utxo_conversion() {
        let info: UtxoInfo = serde_json::from_str(UTXO).unwrap();
        let utxo = info.to_utxo().unwrap();

        assert_eq!(
            utxo.input.to_string(),
            "6773419548e12aad793c1c38c8dfdf1d93bac0689c4c5cab68b26f5f26532c90#1"
        );
        assert_eq!(
            address_to_string(&utxo.address),
            "addr_test1wqkva4m3wrp3jtrpupyethye9p992saqwck9rslv754xgrs62ngp4"
        );
        assert_eq!(utxo.value.lovelace(), 2_000_000);
        let token = AssetId::from_unit(
            "af349fbec5cbf3b8c211b27aae50eaebc68e35ef7654df1c403581ee426c61636b205465612054657374",
        )
        .unwrap();
        assert_eq!(utxo.value.quantity_of(&token), 1);
        assert_eq!(utxo.inline_datum, Some(vec![0xd8, 0x79, 0x80]));
    }

    #[test]
    fn malformed_quantities_are_reported() {
        let info: UtxoInfo = serde_json::from_str(&UTXO.replace("\"2000000\"", "\"lots\"")).unwrap();
        assert!(matches!(
            info.to_utxo(),
            Err(LookupError::Malformed { field: "value", .. })
        ));
    }

    #[test]
    fn script_info_fields() {
        let info: ScriptInfo = serde_json::from_str(
            r#"{
                "script_hash": "81cbb6417e3213bc9006a2647a82a45fad19bd379a8a44121587faca",
                "creation_tx_hash": null,
                "type": "plutusV2",
                "value": null,
                "bytes": "46010000480141",
                "size": 7
            }"#,
        )
        .unwrap();
        assert_eq!(
            hex::encode(info.hash().unwrap()),
            "81cbb6417e3213bc9006a2647a82a45fad19bd379a8a44121587faca"
        );
        assert_eq!(info.kind.as_deref(), Some("plutusV2"));
        assert_eq!(
            info.script_bytes().unwrap(),
            Some(hex::decode("46010000480141").unwrap())
        );
    }
}
