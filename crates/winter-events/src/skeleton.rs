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

use async_trait::async_trait;
use std::fmt;
use winter_kernel::{Address, AssetId, KeyHash, TransactionId, Utxo, Value};
use winter_plutus::ParameterizedContract;

/// A script-locked output to consume, with what unlocks it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptInput {
    pub utxo: Utxo,
    /// CBOR-encoded redeemer.
    pub redeemer: Vec<u8>,
    pub script: ParameterizedContract,
    /// Whether the output carries its datum inline, in which case no datum witness is attached.
    pub inline_datum: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintStep {
    pub asset: AssetId,
    /// Negative when burning.
    pub quantity: i64,
    /// CBOR-encoded redeemer.
    pub redeemer: Vec<u8>,
    pub script: ParameterizedContract,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputStep {
    pub address: Address,
    /// The value to send. Lovelace may be raised to the ledger minimum by the builder.
    pub value: Value,
    /// CBOR-encoded datum, attached inline.
    pub inline_datum: Option<Vec<u8>>,
}

/// Everything a lifecycle transaction must do, before balancing, fees and budgets are worked out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxSkeleton {
    pub network_id: u8,
    /// Wallet outputs the transaction must consume.
    pub required_inputs: Vec<Utxo>,
    /// Wallet outputs the builder may pick from to cover outputs and fees.
    pub selectable_inputs: Vec<Utxo>,
    pub script_inputs: Vec<ScriptInput>,
    pub mints: Vec<MintStep>,
    pub outputs: Vec<OutputStep>,
    pub collateral: Vec<Utxo>,
    pub required_signers: Vec<KeyHash>,
    pub change_address: Address,
}

impl TxSkeleton {
    pub fn new(network_id: u8, change_address: Address) -> Self {
        Self {
            network_id,
            required_inputs: Vec::new(),
            selectable_inputs: Vec::new(),
            script_inputs: Vec::new(),
            mints: Vec::new(),
            outputs: Vec::new(),
            collateral: Vec::new(),
            required_signers: Vec::new(),
            change_address,
        }
    }

    pub fn outputs_to<'a>(&'a self, address: &'a Address) -> impl Iterator<Item = &'a OutputStep> {
        self.outputs
            .iter()
            .filter(move |output| &output.address == address)
    }

    /// Outputs paying the protocol fee, i.e. datum-less outputs to the fee address.
    pub fn fee_outputs<'a>(
        &'a self,
        fee_address: &'a Address,
    ) -> impl Iterator<Item = &'a OutputStep> {
        self.outputs_to(fee_address)
            .filter(|output| output.inline_datum.is_none())
    }

    pub(crate) fn require_signer(&mut self, signer: KeyHash) {
        if !self.required_signers.contains(&signer) {
            self.required_signers.push(signer);
        }
    }
}

/// A balanced transaction, without any witness.
#[derive(Clone, PartialEq, Eq)]
pub struct UnsignedTx {
    pub id: TransactionId,
    pub cbor: Vec<u8>,
    pub fee: u64,
}

impl UnsignedTx {
    pub fn to_hex(&self) -> String {
        hex::encode(&self.cbor)
    }
}

impl fmt::Debug for UnsignedTx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnsignedTx")
            .field("id", &self.id)
            .field("size", &self.cbor.len())
            .field("fee", &self.fee)
            .finish()
    }
}

/// Turns a skeleton into a transaction: selects inputs, balances, prices.
#[async_trait]
pub trait TxBuilder: Send + Sync {
    async fn complete(&self, skeleton: &TxSkeleton) -> Result<UnsignedTx, crate::BuildError>;
}

#[cfg(test)]
mod tests {
    use super::{OutputStep, TxSkeleton};
    use crate::fixtures::{config, wallet_address, wallet_key};
    use winter_kernel::Value;

    #[test]
    fn fee_outputs_carry_no_datum() {
        let fee_address = config().fee_address().clone();
        let mut skeleton = TxSkeleton::new(0, wallet_address());
        skeleton.outputs.push(OutputStep {
            address: fee_address.clone(),
            value: Value::new(1_000_000),
            inline_datum: None,
        });
        skeleton.outputs.push(OutputStep {
            address: fee_address.clone(),
            value: Value::new(2_000_000),
            inline_datum: Some(vec![0xd8, 0x79, 0x80]),
        });

        assert_eq!(skeleton.outputs_to(&fee_address).count(), 2);
        assert_eq!(skeleton.fee_outputs(&fee_address).count(), 1);
        assert_eq!(skeleton.outputs_to(&wallet_address()).count(), 0);
    }

    #[test]
    fn signers_are_required_once() {
        let mut skeleton = TxSkeleton::new(0, wallet_address());
        skeleton.require_signer(wallet_key());
        skeleton.require_signer(wallet_key());
        assert_eq!(skeleton.required_signers, vec![wallet_key()]);
    }
}
