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

//! A [`TxBuilder`] staging transactions with `pallas-txbuilder`.
//!
//! Balancing is done here: the staging transaction only serialises what it is given. A skeleton
//! goes through the following rounds:
//!
//! 1. outputs are topped up to the ledger minimum;
//! 2. wallet inputs are selected (largest first) until they cover outputs, burns and the current
//!    fee estimate, with change worth an output of its own;
//! 3. the transaction is serialised and its fee re-estimated from its size, the expected key
//!    witnesses and the execution budgets, until the estimate stops growing.
//!
//! Execution budgets come from [`BuilderParameters`] unless a [`TxEvaluator`] is provided, in
//! which case a first draft is evaluated and the measured budgets replace the defaults.

use crate::{
    ExUnits, OutputStep, ProviderError, RedeemerBudget, RedeemerPurpose, TxBuilder, TxEvaluator,
    TxSkeleton, UnsignedTx,
};
use async_trait::async_trait;
use pallas_txbuilder::{BuildConway, Input, Output, ScriptKind, StagingTransaction, TxBuilderError};
use serde::{Deserialize, Serialize};
use std::{
    cmp::Reverse,
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};
use tracing::{debug, trace};
use winter_kernel::{
    OutputReference, PolicyId, TransactionId, Utxo, Value, checked_sum, payment_key_hash,
};
use winter_plutus::{ParameterizedContract, PlutusVersion};

/// Bytes accounted for each UTxO entry on top of its serialised output.
const UTXO_ENTRY_OVERHEAD: u64 = 160;

/// A verification key and its signature, with their CBOR framing.
const VKEY_WITNESS_SIZE: u64 = 101;

const MAX_FEE_ROUNDS: usize = 4;

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("insufficient funds: inputs hold {available:?}, the transaction needs {needed:?}")]
    InsufficientFunds { available: Value, needed: Value },
    #[error("collateral holds {available} lovelace, {required} are required")]
    InsufficientCollateral { available: u64, required: u64 },
    #[error("the transaction runs scripts but no collateral was provided")]
    NoCollateral,
    #[error("no cost model configured for plutus {0:?}")]
    MissingCostModel(PlutusVersion),
    #[error("value overflow while balancing")]
    ValueOverflow,
    #[error("evaluator returned a budget for unknown {purpose} redeemer #{index}")]
    UnknownRedeemer {
        purpose: RedeemerPurpose,
        index: u32,
    },
    #[error("script evaluation failed: {0}")]
    Evaluation(#[source] ProviderError),
    #[error("fee estimation did not settle after {MAX_FEE_ROUNDS} rounds")]
    FeeDidNotConverge,
    #[error("unable to stage transaction: {0}")]
    Staging(#[from] TxBuilderError),
}

/// A price per execution unit, as a fraction of lovelace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    pub numerator: u64,
    pub denominator: u64,
}

impl Price {
    fn of(&self, units: u64) -> u64 {
        if self.denominator == 0 {
            return 0;
        }
        let cost = (units as u128 * self.numerator as u128).div_ceil(self.denominator as u128);
        u64::try_from(cost).unwrap_or(u64::MAX)
    }
}

/// The protocol parameters a transaction is priced and balanced against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuilderParameters {
    pub min_fee_a: u64,
    pub min_fee_b: u64,
    pub coins_per_utxo_byte: u64,
    pub price_mem: Price,
    pub price_steps: Price,
    pub collateral_percentage: u64,
    /// Budget assumed for each spending redeemer when no evaluator is available.
    pub spend_ex_units: ExUnits,
    /// Budget assumed for each minting redeemer when no evaluator is available.
    pub mint_ex_units: ExUnits,
    #[serde(default)]
    pub cost_models: BTreeMap<PlutusVersion, Vec<i64>>,
}

impl Default for BuilderParameters {
    fn default() -> Self {
        Self {
            min_fee_a: 44,
            min_fee_b: 155_381,
            coins_per_utxo_byte: 4_310,
            price_mem: Price {
                numerator: 577,
                denominator: 10_000,
            },
            price_steps: Price {
                numerator: 721,
                denominator: 10_000_000,
            },
            collateral_percentage: 150,
            spend_ex_units: ExUnits {
                mem: 3_500_000,
                steps: 1_400_000_000,
            },
            mint_ex_units: ExUnits {
                mem: 1_500_000,
                steps: 600_000_000,
            },
            cost_models: BTreeMap::new(),
        }
    }
}

impl BuilderParameters {
    pub fn with_cost_model(mut self, version: PlutusVersion, cost_model: Vec<i64>) -> Self {
        self.cost_models.insert(version, cost_model);
        self
    }

    pub fn linear_fee(&self, size: u64) -> u64 {
        self.min_fee_a.saturating_mul(size).saturating_add(self.min_fee_b)
    }

    pub fn execution_fee(&self, units: ExUnits) -> u64 {
        self.price_mem
            .of(units.mem)
            .saturating_add(self.price_steps.of(units.steps))
    }

    pub fn collateral_for(&self, fee: u64) -> u64 {
        let required = (fee as u128 * self.collateral_percentage as u128).div_ceil(100);
        u64::try_from(required).unwrap_or(u64::MAX)
    }

    /// The least lovelace an output must hold to be accepted by the ledger.
    pub fn min_lovelace(&self, output: &OutputStep) -> u64 {
        self.coins_per_utxo_byte
            .saturating_mul(UTXO_ENTRY_OVERHEAD + estimated_output_size(output))
    }
}

/// An upper bound on the serialised size of a post-Alonzo output.
fn estimated_output_size(output: &OutputStep) -> u64 {
    // map header, address, coin
    let mut size = 1 + 3 + output.address.to_vec().len() as u64 + 1 + 9;
    if output.value.has_assets() {
        size += 1 + 3;
        size += output.value.policies().count() as u64 * (3 + 28 + 3);
        size += output
            .value
            .assets()
            .map(|(asset, _)| 2 + asset.name.as_bytes().len() as u64 + 9)
            .sum::<u64>();
    }
    if let Some(datum) = &output.inline_datum {
        // key, [1, #6.24(bytes)]
        size += 1 + 1 + 1 + 2 + 5 + datum.len() as u64;
    }
    size
}

/// Execution budgets per redeemer. Several mint steps under one policy share a redeemer.
#[derive(Debug, Clone, Default)]
struct Budgets {
    spend: BTreeMap<OutputReference, ExUnits>,
    mint: BTreeMap<PolicyId, ExUnits>,
}

impl Budgets {
    fn defaults(skeleton: &TxSkeleton, parameters: &BuilderParameters) -> Self {
        Self {
            spend: skeleton
                .script_inputs
                .iter()
                .map(|step| (step.utxo.input, parameters.spend_ex_units))
                .collect(),
            mint: skeleton
                .mints
                .iter()
                .map(|step| (step.asset.policy, parameters.mint_ex_units))
                .collect(),
        }
    }

    fn spend_units(&self, input: &OutputReference) -> ExUnits {
        self.spend.get(input).copied().unwrap_or_default()
    }

    fn mint_units(&self, policy: &PolicyId) -> ExUnits {
        self.mint.get(policy).copied().unwrap_or_default()
    }

    fn total(&self) -> ExUnits {
        self.spend
            .values()
            .chain(self.mint.values())
            .fold(ExUnits::default(), |total, units| ExUnits {
                mem: total.mem.saturating_add(units.mem),
                steps: total.steps.saturating_add(units.steps),
            })
    }

    /// Replace defaults with measured budgets. Redeemers are indexed against the sorted inputs
    /// and the sorted policies of the transaction.
    fn record(
        &mut self,
        inputs: &[OutputReference],
        measured: &[RedeemerBudget],
    ) -> Result<(), BuildError> {
        let policies = self.mint.keys().copied().collect::<Vec<_>>();
        for budget in measured {
            let unknown = || BuildError::UnknownRedeemer {
                purpose: budget.purpose,
                index: budget.index,
            };
            match budget.purpose {
                RedeemerPurpose::Spend => {
                    let input = inputs.get(budget.index as usize).ok_or_else(unknown)?;
                    let slot = self.spend.get_mut(input).ok_or_else(unknown)?;
                    *slot = budget.ex_units;
                }
                RedeemerPurpose::Mint => {
                    let policy = policies.get(budget.index as usize).ok_or_else(unknown)?;
                    self.mint.insert(*policy, budget.ex_units);
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug)]
struct Selection {
    inputs: Vec<Utxo>,
    change: Option<OutputStep>,
}

#[derive(Debug)]
struct Draft {
    tx: UnsignedTx,
    selection: Selection,
}

impl Draft {
    /// Every input of the transaction, in ledger order.
    fn sorted_inputs(&self, skeleton: &TxSkeleton) -> Vec<OutputReference> {
        let mut inputs = self
            .selection
            .inputs
            .iter()
            .chain(skeleton.script_inputs.iter().map(|step| &step.utxo))
            .map(|utxo| utxo.input)
            .collect::<Vec<_>>();
        inputs.sort();
        inputs.dedup();
        inputs
    }

    /// The outputs the transaction consumes, collateral included.
    fn resolved(&self, skeleton: &TxSkeleton) -> Vec<Utxo> {
        self.selection
            .inputs
            .iter()
            .chain(skeleton.script_inputs.iter().map(|step| &step.utxo))
            .chain(&skeleton.collateral)
            .cloned()
            .collect()
    }
}

pub struct StagingTxBuilder {
    parameters: BuilderParameters,
    evaluator: Option<Arc<dyn TxEvaluator>>,
}

impl StagingTxBuilder {
    pub fn new(parameters: BuilderParameters) -> Self {
        Self {
            parameters,
            evaluator: None,
        }
    }

    pub fn with_evaluator(mut self, evaluator: Arc<dyn TxEvaluator>) -> Self {
        self.evaluator = Some(evaluator);
        self
    }

    pub fn parameters(&self) -> &BuilderParameters {
        &self.parameters
    }

    fn assemble(&self, skeleton: &TxSkeleton, budgets: &Budgets) -> Result<Draft, BuildError> {
        let outputs = skeleton
            .outputs
            .iter()
            .map(|output| {
                let mut output = output.clone();
                let minimum = self.parameters.min_lovelace(&output);
                if output.value.lovelace() < minimum {
                    output.value.set_lovelace(minimum);
                }
                output
            })
            .collect::<Vec<_>>();

        let execution_fee = self.parameters.execution_fee(budgets.total());

        let mut fee = 0;
        for _ in 0..MAX_FEE_ROUNDS {
            let selection = self.select(skeleton, &outputs, fee)?;
            let tx = self.stage(skeleton, &outputs, &selection, budgets, fee)?;
            let witnesses = key_witnesses(skeleton, &selection) * VKEY_WITNESS_SIZE;
            let size = tx.cbor.len() as u64 + witnesses;
            let required = self
                .parameters
                .linear_fee(size)
                .saturating_add(execution_fee);
            if required <= fee {
                return Ok(Draft { tx, selection });
            }
            trace!(size, fee = required, "re-estimating fee");
            fee = required;
        }

        Err(BuildError::FeeDidNotConverge)
    }

    fn select(
        &self,
        skeleton: &TxSkeleton,
        outputs: &[OutputStep],
        fee: u64,
    ) -> Result<Selection, BuildError> {
        let (minted, burned) = mint_delta(skeleton);

        let needed = checked_sum(outputs.iter().map(|output| &output.value))
            .and_then(|value| value.checked_add(&burned))
            .and_then(|value| value.checked_add(&Value::new(fee)))
            .ok_or(BuildError::ValueOverflow)?;

        let unlocked = checked_sum(skeleton.script_inputs.iter().map(|step| &step.utxo.value))
            .and_then(|value| value.checked_add(&minted))
            .ok_or(BuildError::ValueOverflow)?;

        let is_script_input = |utxo: &Utxo| {
            skeleton
                .script_inputs
                .iter()
                .any(|step| step.utxo.input == utxo.input)
        };

        let mut chosen = skeleton.required_inputs.clone();
        let mut candidates = skeleton
            .selectable_inputs
            .iter()
            .filter(|utxo| !is_script_input(*utxo))
            .collect::<Vec<_>>();
        candidates.sort_by_key(|utxo| Reverse(utxo.value.lovelace()));
        let mut candidates = candidates.into_iter();

        loop {
            let available = checked_sum(chosen.iter().map(|utxo| &utxo.value))
                .and_then(|value| value.checked_add(&unlocked))
                .ok_or(BuildError::ValueOverflow)?;

            if let Some(remainder) = available.checked_sub(&needed) {
                if remainder.is_zero() {
                    return Ok(Selection {
                        inputs: chosen,
                        change: None,
                    });
                }
                let change = OutputStep {
                    address: skeleton.change_address.clone(),
                    value: remainder,
                    inline_datum: None,
                };
                if change.value.lovelace() >= self.parameters.min_lovelace(&change) {
                    return Ok(Selection {
                        inputs: chosen,
                        change: Some(change),
                    });
                }
            }

            match candidates.find(|utxo| chosen.iter().all(|c| c.input != utxo.input)) {
                Some(utxo) => chosen.push(utxo.clone()),
                None => return Err(BuildError::InsufficientFunds { available, needed }),
            }
        }
    }

    fn stage(
        &self,
        skeleton: &TxSkeleton,
        outputs: &[OutputStep],
        selection: &Selection,
        budgets: &Budgets,
        fee: u64,
    ) -> Result<UnsignedTx, BuildError> {
        let mut tx = StagingTransaction::new()
            .network_id(skeleton.network_id)
            .change_address(skeleton.change_address.clone())
            .fee(fee);

        for utxo in &selection.inputs {
            tx = tx.input(staging_input(&utxo.input));
        }

        let mut scripts: BTreeMap<_, &ParameterizedContract> = BTreeMap::new();

        for step in &skeleton.script_inputs {
            let input = staging_input(&step.utxo.input);
            tx = tx.input(input.clone()).add_spend_redeemer(
                input,
                step.redeemer.clone(),
                Some(budgets.spend_units(&step.utxo.input).into()),
            );
            scripts.insert(step.script.hash(), &step.script);
        }

        for step in &skeleton.mints {
            tx = tx
                .mint_asset(
                    step.asset.policy,
                    step.asset.name.as_bytes().to_vec(),
                    step.quantity,
                )?
                .add_mint_redeemer(
                    step.asset.policy,
                    step.redeemer.clone(),
                    Some(budgets.mint_units(&step.asset.policy).into()),
                );
            scripts.insert(step.script.hash(), &step.script);
        }

        let mut languages = BTreeSet::new();
        for script in scripts.values() {
            tx = tx.script(script_kind(script.version()), script.script().to_vec());
            languages.insert(script.version());
        }
        for version in languages {
            let cost_model = self
                .parameters
                .cost_models
                .get(&version)
                .ok_or(BuildError::MissingCostModel(version))?;
            tx = tx.language_view(script_kind(version), cost_model.clone());
        }

        for output in outputs.iter().chain(selection.change.as_ref()) {
            tx = tx.output(staging_output(output)?);
        }

        if !scripts.is_empty() {
            tx = self.stage_collateral(tx, skeleton, fee)?;
        }

        for signer in &skeleton.required_signers {
            tx = tx.disclosed_signer(*signer);
        }

        let built = tx.build_conway_raw()?;

        Ok(UnsignedTx {
            id: TransactionId::from(built.tx_hash.0),
            cbor: built.tx_bytes.0,
            fee,
        })
    }

    /// Attach collateral, returning whatever exceeds the required amount to the change address.
    fn stage_collateral(
        &self,
        mut tx: StagingTransaction,
        skeleton: &TxSkeleton,
        fee: u64,
    ) -> Result<StagingTransaction, BuildError> {
        if skeleton.collateral.is_empty() {
            return Err(BuildError::NoCollateral);
        }

        let total = checked_sum(skeleton.collateral.iter().map(|utxo| &utxo.value))
            .ok_or(BuildError::ValueOverflow)?;
        let required = self.parameters.collateral_for(fee);
        let insufficient = || BuildError::InsufficientCollateral {
            available: total.lovelace(),
            required,
        };

        let returned = OutputStep {
            address: skeleton.change_address.clone(),
            value: total
                .checked_sub(&Value::new(required))
                .ok_or_else(insufficient)?,
            inline_datum: None,
        };

        for utxo in &skeleton.collateral {
            tx = tx.collateral_input(staging_input(&utxo.input));
        }

        if returned.value.lovelace() >= self.parameters.min_lovelace(&returned) {
            tx = tx.collateral_output(staging_output(&returned)?);
        } else if returned.value.has_assets() {
            return Err(insufficient());
        }

        Ok(tx)
    }
}

#[async_trait]
impl TxBuilder for StagingTxBuilder {
    async fn complete(&self, skeleton: &TxSkeleton) -> Result<UnsignedTx, BuildError> {
        let mut budgets = Budgets::defaults(skeleton, &self.parameters);
        let mut draft = self.assemble(skeleton, &budgets)?;

        if let Some(evaluator) = &self.evaluator {
            if !budgets.spend.is_empty() || !budgets.mint.is_empty() {
                let measured = evaluator
                    .evaluate(&draft.tx, &draft.resolved(skeleton))
                    .await
                    .map_err(BuildError::Evaluation)?;
                budgets.record(&draft.sorted_inputs(skeleton), &measured)?;
                draft = self.assemble(skeleton, &budgets)?;
            }
        }

        debug!(
            id = %draft.tx.id,
            fee = draft.tx.fee,
            size = draft.tx.cbor.len(),
            inputs = draft.selection.inputs.len() + skeleton.script_inputs.len(),
            "transaction balanced"
        );

        Ok(draft.tx)
    }
}

/// Net minted and burned assets.
fn mint_delta(skeleton: &TxSkeleton) -> (Value, Value) {
    let mut minted = Value::default();
    let mut burned = Value::default();
    for step in &skeleton.mints {
        if step.quantity >= 0 {
            minted.insert(step.asset.clone(), step.quantity.unsigned_abs());
        } else {
            burned.insert(step.asset.clone(), step.quantity.unsigned_abs());
        }
    }
    (minted, burned)
}

/// Distinct verification keys expected to sign the transaction.
fn key_witnesses(skeleton: &TxSkeleton, selection: &Selection) -> u64 {
    let mut keys = selection
        .inputs
        .iter()
        .chain(&skeleton.collateral)
        .filter_map(|utxo| payment_key_hash(&utxo.address).ok())
        .collect::<BTreeSet<_>>();
    keys.extend(skeleton.required_signers.iter().copied());
    keys.len() as u64
}

fn staging_input(reference: &OutputReference) -> Input {
    Input::new(reference.transaction_id, reference.index)
}

fn staging_output(output: &OutputStep) -> Result<Output, BuildError> {
    let mut staged = Output::new(output.address.clone(), output.value.lovelace());
    for (asset, quantity) in output.value.assets() {
        staged = staged.add_asset(asset.policy, asset.name.into(), quantity)?;
    }
    if let Some(datum) = &output.inline_datum {
        staged = staged.set_inline_datum(datum.clone());
    }
    Ok(staged)
}

fn script_kind(version: PlutusVersion) -> ScriptKind {
    match version {
        PlutusVersion::V1 => ScriptKind::PlutusV1,
        PlutusVersion::V2 => ScriptKind::PlutusV2,
        PlutusVersion::V3 => ScriptKind::PlutusV3,
    }
}
