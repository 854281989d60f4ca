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

use crate::{
    BuildError, EventFactory, FactoryConfig, FeeSchedule, TxBuilder, TxSkeleton, UnsignedTx,
};
use async_trait::async_trait;
use std::sync::Mutex;
use winter_kernel::{
    Address, AssetId, AssetName, Hash, KeyHash, NULL_HASH32, Network, NetworkName, ObjectDatum,
    OutputReference, SignersPolicy, TransactionId, Utxo, Value, address_from_str,
    encode_object_datum, key_address,
};

pub const FEE_LOVELACE: u64 = 1_000_000;

pub fn fee_schedule() -> FeeSchedule {
    FeeSchedule {
        mainnet: address_from_str("addr1vx2fxv4umyhttkxyxp8x0dlpdt3k6cwng5pxj3jhsydzersazypxn")
            .unwrap(),
        testnet: address_from_str(
            "addr_test1vz2fxv4umyhttkxyxp8x0dlpdt3k6cwng5pxj3jhsydzersx2safk",
        )
        .unwrap(),
        lovelace: FEE_LOVELACE,
    }
}

pub fn config() -> FactoryConfig {
    FactoryConfig::new(NetworkName::Preprod, fee_schedule())
}

pub fn transaction_id(byte: u8) -> TransactionId {
    Hash::new([byte; 32])
}

pub fn wallet_key() -> KeyHash {
    Hash::new([7; 28])
}

pub fn wallet_address() -> Address {
    key_address(Network::Testnet, wallet_key())
}

pub fn wallet_utxo(tx: u8, index: u64, lovelace: u64) -> Utxo {
    Utxo::new(
        OutputReference::new(transaction_id(tx), index),
        wallet_address(),
        Value::new(lovelace),
    )
}

pub fn object_datum(data_reference: &[u8], event_creation_info: &[u8]) -> ObjectDatum {
    ObjectDatum {
        protocol_version: 1,
        data_reference: data_reference.to_vec(),
        event_creation_info: event_creation_info.to_vec(),
        signers: vec![wallet_key().to_vec()],
    }
}

/// A builder handing back a placeholder transaction, keeping every skeleton it is given.
#[derive(Default)]
pub struct RecordingBuilder {
    pub skeletons: Mutex<Vec<TxSkeleton>>,
}

impl RecordingBuilder {
    pub fn calls(&self) -> usize {
        self.skeletons.lock().unwrap().len()
    }
}

#[async_trait]
impl TxBuilder for RecordingBuilder {
    async fn complete(&self, skeleton: &TxSkeleton) -> Result<UnsignedTx, BuildError> {
        self.skeletons.lock().unwrap().push(skeleton.clone());
        Ok(UnsignedTx {
            id: NULL_HASH32,
            cbor: Vec::new(),
            fee: 0,
        })
    }
}

pub fn factory() -> EventFactory<RecordingBuilder> {
    EventFactory::new(config(), wallet_address(), RecordingBuilder::default()).unwrap()
}

/// The token of an event minted under `name` from `seed`.
pub fn event_token<B: TxBuilder>(
    factory: &EventFactory<B>,
    name: &str,
    seed: &OutputReference,
) -> AssetId {
    let name = AssetName::from_text(name).unwrap();
    let policy = factory.singleton_contract(&name, seed).unwrap();
    AssetId::new(policy.policy_id(), name)
}

/// An event output sitting at the validator, as left by a mint from `seed`.
pub fn event_utxo<B: TxBuilder>(
    factory: &EventFactory<B>,
    at: OutputReference,
    seed: &OutputReference,
    datum: &ObjectDatum,
) -> Utxo {
    Utxo::new(
        at,
        factory.validator_address().clone(),
        Value::new(2_000_000).with_asset(event_token(factory, "event", seed), 1),
    )
    .with_inline_datum(encode_object_datum(datum, SignersPolicy::RequireNonEmpty).unwrap())
}

/// Log to the test output, filtered by `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
