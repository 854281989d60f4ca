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

//! Lifecycle of an event: minted along with its singleton token, recreated any number of times
//! with a new data reference, and finally spent, burning the token.
//!
//! Each operation comes in two flavours: `plan_*` lays out the [`TxSkeleton`] without any I/O,
//! the other hands that skeleton to the factory's [`TxBuilder`].

use crate::{
    EventError, FactoryConfig, MintStep, OutputStep, ScriptInput, ScriptLookup, TxBuilder,
    TxSkeleton, TxSubmitter, UnsignedTx, UtxoSource, Wallet,
};
use futures_util::future::try_join_all;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, instrument};
use winter_kernel::{
    Address, AssetId, AssetName, EventAction, KeyHash, ObjectDatum, OutputReference,
    ScriptHash, SingletonAction, TransactionId, Utxo, Value, encode_object_datum,
    payment_key_hash,
};
use winter_koios::LookupError;
use winter_plutus::{
    Blueprint, ParameterizedContract, PlutusVersion, object_event_validator, singleton_policy,
};

pub struct EventFactory<B> {
    config: FactoryConfig,
    blueprint: Blueprint,
    version: PlutusVersion,
    validator: ParameterizedContract,
    validator_address: Address,
    change_address: Address,
    builder: B,
    object_datum: Option<ObjectDatum>,
}

impl<B: TxBuilder> EventFactory<B> {
    /// A factory for the contracts of the embedded blueprint.
    pub fn new(
        config: FactoryConfig,
        change_address: Address,
        builder: B,
    ) -> Result<Self, EventError> {
        Self::with_blueprint(
            Blueprint::embedded()?.clone(),
            config,
            change_address,
            builder,
        )
    }

    pub fn with_blueprint(
        blueprint: Blueprint,
        config: FactoryConfig,
        change_address: Address,
        builder: B,
    ) -> Result<Self, EventError> {
        let fee_credential = payment_key_hash(config.fee_address())?;
        let validator = object_event_validator(&blueprint, &fee_credential, config.fees.lovelace)?;
        let validator_address = validator.address(config.network, None);

        info!(
            network = %config.network,
            validator = %validator.hash(),
            fee = config.fees.lovelace,
            "object event validator ready"
        );

        Ok(Self {
            version: blueprint.plutus_version()?,
            config,
            blueprint,
            validator,
            validator_address,
            change_address,
            builder,
            object_datum: None,
        })
    }

    pub fn config(&self) -> &FactoryConfig {
        &self.config
    }

    pub fn validator(&self) -> &ParameterizedContract {
        &self.validator
    }

    pub fn validator_address(&self) -> &Address {
        &self.validator_address
    }

    pub fn fee_address(&self) -> &Address {
        self.config.fee_address()
    }

    /// The one-shot policy of the token named `name`, seeded by `seed`.
    pub fn singleton_contract(
        &self,
        name: &AssetName,
        seed: &OutputReference,
    ) -> Result<ParameterizedContract, EventError> {
        Ok(singleton_policy(&self.blueprint, name, seed)?)
    }

    /// Store the datum used by [`Self::mint_with_configured`]. Must not be called while such a
    /// mint is in flight.
    pub fn configure_object_datum(&mut self, datum: ObjectDatum) -> Result<&mut Self, EventError> {
        encode_object_datum(&datum, self.config.signers).map_err(EventError::InvalidDatum)?;
        self.object_datum = Some(datum);
        Ok(self)
    }

    pub fn configured_object_datum(&self) -> Option<&ObjectDatum> {
        self.object_datum.as_ref()
    }

    fn skeleton(&self) -> TxSkeleton {
        TxSkeleton::new(self.config.network.network_id(), self.change_address.clone())
    }

    fn pay_fee(&self, skeleton: &mut TxSkeleton) {
        skeleton.outputs.push(OutputStep {
            address: self.fee_address().clone(),
            value: Value::new(self.config.fees.lovelace),
            inline_datum: None,
        });
    }

    pub fn plan_mint(
        &self,
        name: &str,
        datum: &ObjectDatum,
        funding: &[Utxo],
    ) -> Result<TxSkeleton, EventError> {
        let seed = funding.first().ok_or(EventError::NoFundingInputs)?;
        let name = AssetName::from_text(name)?;
        let inline_datum =
            encode_object_datum(datum, self.config.signers).map_err(EventError::InvalidDatum)?;

        let policy = self.singleton_contract(&name, &seed.input)?;
        let token = AssetId::new(policy.policy_id(), name);
        debug!(token = %token, seed = %seed.input, "minting singleton");

        let mut skeleton = self.skeleton();
        skeleton.required_inputs.push(seed.clone());
        skeleton.selectable_inputs.extend(funding.iter().skip(1).cloned());
        skeleton.mints.push(MintStep {
            asset: token.clone(),
            quantity: 1,
            redeemer: SingletonAction::Mint.to_cbor(),
            script: policy,
        });
        skeleton.outputs.push(OutputStep {
            address: self.validator_address.clone(),
            value: Value::default().with_asset(token, 1),
            inline_datum: Some(inline_datum),
        });
        self.pay_fee(&mut skeleton);
        skeleton.collateral = funding.to_vec();

        Ok(skeleton)
    }

    /// Mint a new event and its singleton token. The first funding output seeds the token's
    /// policy, so minting twice from the same funding can only succeed once on-chain.
    #[instrument(skip_all, fields(name = name, funding = funding.len()))]
    pub async fn mint_singleton(
        &self,
        name: &str,
        datum: &ObjectDatum,
        funding: &[Utxo],
    ) -> Result<UnsignedTx, EventError> {
        let skeleton = self.plan_mint(name, datum, funding)?;
        let tx = self.builder.complete(&skeleton).await?;
        info!(id = %tx.id, "mint transaction built");
        Ok(tx)
    }

    /// [`Self::mint_singleton`] with the datum set by [`Self::configure_object_datum`].
    pub async fn mint_with_configured(
        &self,
        name: &str,
        funding: &[Utxo],
    ) -> Result<UnsignedTx, EventError> {
        let datum = self.object_datum.as_ref().ok_or(EventError::Setup)?;
        self.mint_singleton(name, datum, funding).await
    }

    pub fn plan_recreate(
        &self,
        signer: &Address,
        collateral: &[Utxo],
        events: &[Utxo],
        new_references: &[Vec<u8>],
    ) -> Result<TxSkeleton, EventError> {
        if events.is_empty() {
            return Err(EventError::NoEvents);
        }
        if events.len() != new_references.len() {
            return Err(EventError::LengthMismatch {
                events: events.len(),
                given: new_references.len(),
                what: "data reference(s)",
            });
        }

        let mut skeleton = self.skeleton();
        skeleton.require_signer(address_key_hash(signer)?);

        for (index, (event, data_reference)) in events.iter().zip(new_references).enumerate() {
            let datum = event_datum(index, event)?;
            if &datum.data_reference == data_reference {
                return Err(EventError::IdenticalDataReference {
                    index,
                    input: event.input,
                });
            }
            let bundle = event_bundle(index, event)?;

            let recreated = datum.recreated(data_reference.clone(), &event.input);
            let inline_datum = encode_object_datum(&recreated, self.config.signers)
                .map_err(|source| EventError::Datum {
                    index,
                    input: event.input,
                    source,
                })?;

            debug!(input = %event.input, index, "recreating event");

            skeleton.script_inputs.push(ScriptInput {
                utxo: event.clone(),
                redeemer: EventAction::Recreate.to_cbor(),
                script: self.validator.clone(),
                inline_datum: true,
            });
            skeleton.outputs.push(OutputStep {
                address: event.address.clone(),
                value: bundle,
                inline_datum: Some(inline_datum),
            });
        }

        self.pay_fee(&mut skeleton);
        skeleton.selectable_inputs = collateral.to_vec();
        skeleton.collateral = collateral.to_vec();

        Ok(skeleton)
    }

    /// Move each event forward to a new data reference. Either every event is recreated, or no
    /// transaction is built.
    #[instrument(skip_all, fields(events = events.len()))]
    pub async fn recreate(
        &self,
        signer: &Address,
        collateral: &[Utxo],
        events: &[Utxo],
        new_references: &[Vec<u8>],
    ) -> Result<UnsignedTx, EventError> {
        let skeleton = self.plan_recreate(signer, collateral, events, new_references)?;
        let tx = self.builder.complete(&skeleton).await?;
        info!(id = %tx.id, "recreate transaction built");
        Ok(tx)
    }

    /// Lay out the spending of `events`, given the minting script of each event's token, in the
    /// same order.
    pub fn plan_spend(
        &self,
        recipient: &Address,
        signer: &Address,
        collateral: &[Utxo],
        events: &[Utxo],
        scripts: &[Vec<u8>],
    ) -> Result<TxSkeleton, EventError> {
        let candidates = burn_candidates(events)?;
        if scripts.len() != events.len() {
            return Err(EventError::LengthMismatch {
                events: events.len(),
                given: scripts.len(),
                what: "minting script(s)",
            });
        }

        let mut skeleton = self.skeleton();
        skeleton.require_signer(address_key_hash(signer)?);

        for (index, ((event, candidates), script)) in
            events.iter().zip(candidates).zip(scripts).enumerate()
        {
            let policy = ParameterizedContract::new(script, self.version);
            let token = match candidates
                .iter()
                .find(|token| token.policy == policy.policy_id())
            {
                Some(token) => token.clone(),
                None => {
                    return Err(EventError::ScriptMismatch {
                        index,
                        expected: candidates[0].policy,
                        actual: policy.hash(),
                    });
                }
            };

            debug!(input = %event.input, token = %token, "spending event");

            skeleton.script_inputs.push(ScriptInput {
                utxo: event.clone(),
                redeemer: EventAction::Spend.to_cbor(),
                script: self.validator.clone(),
                inline_datum: true,
            });
            skeleton.mints.push(MintStep {
                asset: token.clone(),
                quantity: -1,
                redeemer: SingletonAction::Burn.to_cbor(),
                script: policy,
            });
            skeleton.outputs.push(OutputStep {
                address: recipient.clone(),
                value: event.value.without_lovelace().without_asset(&token),
                inline_datum: None,
            });
        }

        self.pay_fee(&mut skeleton);
        skeleton.selectable_inputs = collateral.to_vec();
        skeleton.collateral = collateral.to_vec();

        Ok(skeleton)
    }

    /// Spend events for good, burning their tokens. Every event is checked before any script is
    /// looked up.
    #[instrument(skip_all, fields(events = events.len()))]
    pub async fn spend(
        &self,
        recipient: &Address,
        signer: &Address,
        collateral: &[Utxo],
        events: &[Utxo],
        lookup: ScriptLookup<'_>,
    ) -> Result<UnsignedTx, EventError> {
        let candidates = burn_candidates(events)?;

        let skeleton = match lookup {
            ScriptLookup::Explicit(scripts) => {
                self.plan_spend(recipient, signer, collateral, events, scripts)?
            }
            ScriptLookup::Remote(registry) => {
                let mut policies = candidates
                    .iter()
                    .flatten()
                    .map(|token| token.policy)
                    .collect::<Vec<_>>();
                policies.sort();
                policies.dedup();
                let found = registry.lookup_scripts(&policies).await?;

                let scripts = events
                    .iter()
                    .zip(&candidates)
                    .enumerate()
                    .map(|(index, (event, candidates))| {
                        resolved_burn_script(index, event, candidates, &found)
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                self.plan_spend(recipient, signer, collateral, events, &scripts)?
            }
        };

        let tx = self.builder.complete(&skeleton).await?;
        info!(id = %tx.id, "spend transaction built");
        Ok(tx)
    }
}

/// The outputs behind `references`, fetching each transaction once.
pub async fn utxos_by_out_ref(
    source: &dyn UtxoSource,
    references: &[OutputReference],
) -> Result<Vec<Utxo>, EventError> {
    let transactions = references
        .iter()
        .map(|reference| reference.transaction_id)
        .collect::<BTreeSet<_>>();

    let fetched = try_join_all(transactions.iter().map(|id| source.fetch_utxos(id))).await?;

    let known = fetched
        .into_iter()
        .flatten()
        .map(|utxo| (utxo.input, utxo))
        .collect::<BTreeMap<_, _>>();

    references
        .iter()
        .map(|reference| {
            known
                .get(reference)
                .cloned()
                .ok_or(EventError::UnresolvedOutput(*reference))
        })
        .collect()
}

pub fn address_key_hash(address: &Address) -> Result<KeyHash, EventError> {
    Ok(payment_key_hash(address)?)
}

pub async fn sign_and_submit(
    wallet: &dyn Wallet,
    submitter: &dyn TxSubmitter,
    tx: &UnsignedTx,
) -> Result<TransactionId, EventError> {
    let signed = wallet.sign_tx(tx).await?;
    let id = submitter.submit_tx(&signed).await?;
    info!(%id, "transaction submitted");
    Ok(id)
}

fn event_datum(index: usize, event: &Utxo) -> Result<ObjectDatum, EventError> {
    event.object_datum().map_err(|source| EventError::Datum {
        index,
        input: event.input,
        source,
    })
}

/// The assets an event carries besides lovelace.
fn event_bundle(index: usize, event: &Utxo) -> Result<Value, EventError> {
    if !event.value.has_assets() {
        return Err(EventError::MissingAsset {
            index,
            input: event.input,
        });
    }
    Ok(event.value.without_lovelace())
}

/// The tokens each event could be burning: every asset it holds exactly one of. Every event is
/// checked before any is returned.
fn burn_candidates(events: &[Utxo]) -> Result<Vec<Vec<AssetId>>, EventError> {
    if events.is_empty() {
        return Err(EventError::NoEvents);
    }
    events
        .iter()
        .enumerate()
        .map(|(index, event)| {
            event_datum(index, event)?;
            let candidates = event
                .value
                .assets()
                .filter(|(_, quantity)| *quantity == 1)
                .map(|(token, _)| token)
                .collect::<Vec<_>>();
            if candidates.is_empty() {
                return Err(EventError::MissingAsset {
                    index,
                    input: event.input,
                });
            }
            Ok(candidates)
        })
        .collect()
}

/// The minting script of the one candidate whose policy the registry knows.
fn resolved_burn_script(
    index: usize,
    event: &Utxo,
    candidates: &[AssetId],
    found: &BTreeMap<ScriptHash, Vec<u8>>,
) -> Result<Vec<u8>, EventError> {
    let mut resolved = candidates
        .iter()
        .filter_map(|token| found.get(&token.policy));
    match (resolved.next(), resolved.next(), candidates) {
        (Some(script), None, _) => Ok(script.clone()),
        (None, _, [only]) => Err(LookupError::MissingScript(only.policy).into()),
        _ => Err(EventError::MissingAsset {
            index,
            input: event.input,
        }),
    }
}
