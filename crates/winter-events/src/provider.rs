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

//! Capabilities the lifecycle operations borrow from the outside world: a chain provider, a
//! wallet, and whatever evaluates scripts. None of them is implemented here.

use crate::UnsignedTx;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::{error::Error, fmt};
use winter_kernel::{Address, TransactionId, Utxo};

/// Failure reported by a provider or a wallet, carried through unchanged.
#[derive(Debug, thiserror::Error)]
#[error("{context}")]
pub struct ProviderError {
    context: String,
    #[source]
    source: Option<Box<dyn Error + Send + Sync>>,
}

impl ProviderError {
    pub fn new(context: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            source: None,
        }
    }

    pub fn with_source(
        context: impl Into<String>,
        source: impl Into<Box<dyn Error + Send + Sync>>,
    ) -> Self {
        Self {
            context: context.into(),
            source: Some(source.into()),
        }
    }
}

#[async_trait]
pub trait UtxoSource: Send + Sync {
    /// Every output of the given transaction that is still unspent.
    async fn fetch_utxos(&self, transaction_id: &TransactionId) -> Result<Vec<Utxo>, ProviderError>;

    async fn fetch_address_utxos(&self, address: &Address) -> Result<Vec<Utxo>, ProviderError>;
}

#[async_trait]
pub trait TxSubmitter: Send + Sync {
    async fn submit_tx(&self, signed_tx: &[u8]) -> Result<TransactionId, ProviderError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedeemerPurpose {
    Spend,
    Mint,
}

impl fmt::Display for RedeemerPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RedeemerPurpose::Spend => f.write_str("spend"),
            RedeemerPurpose::Mint => f.write_str("mint"),
        }
    }
}

/// Execution units consumed by a script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExUnits {
    pub mem: u64,
    pub steps: u64,
}

impl From<ExUnits> for pallas_txbuilder::ExUnits {
    fn from(units: ExUnits) -> Self {
        pallas_txbuilder::ExUnits {
            mem: units.mem,
            steps: units.steps,
        }
    }
}

/// The measured cost of one redeemer, addressed the way the ledger addresses it: by purpose and
/// by position among the sorted inputs (spend) or sorted policies (mint).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedeemerBudget {
    pub purpose: RedeemerPurpose,
    pub index: u32,
    pub ex_units: ExUnits,
}

#[async_trait]
pub trait TxEvaluator: Send + Sync {
    /// Run every script of `tx`; `utxos` resolves the outputs it consumes.
    async fn evaluate(
        &self,
        tx: &UnsignedTx,
        utxos: &[Utxo],
    ) -> Result<Vec<RedeemerBudget>, ProviderError>;
}

/// Plain HTTP GET returning JSON, for lookups no dedicated client covers.
#[async_trait]
pub trait HttpFetcher: Send + Sync {
    async fn get(&self, url: &str) -> Result<serde_json::Value, ProviderError>;
}

#[async_trait]
pub trait Wallet: Send + Sync {
    async fn change_address(&self) -> Result<Address, ProviderError>;

    async fn utxos(&self) -> Result<Vec<Utxo>, ProviderError>;

    async fn collateral(&self) -> Result<Vec<Utxo>, ProviderError>;

    /// The fully witnessed transaction, ready for submission.
    async fn sign_tx(&self, tx: &UnsignedTx) -> Result<Vec<u8>, ProviderError>;
}
