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

use crate::{AssetId, AssetName, PolicyId};
use std::collections::BTreeMap;

/// A bag of lovelace and native assets, as held by a transaction output.
///
/// Assets are kept in canonical (policy, name) order and entries with a null quantity are never
/// stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Value {
    lovelace: u64,
    assets: BTreeMap<PolicyId, BTreeMap<AssetName, u64>>,
}

impl Value {
    pub fn new(lovelace: u64) -> Self {
        Self {
            lovelace,
            assets: BTreeMap::new(),
        }
    }

    pub fn with_asset(mut self, asset: AssetId, quantity: u64) -> Self {
        self.insert(asset, quantity);
        self
    }

    pub fn lovelace(&self) -> u64 {
        self.lovelace
    }

    pub fn set_lovelace(&mut self, lovelace: u64) {
        self.lovelace = lovelace;
    }

    /// Add `quantity` units of `asset`, saturating on overflow.
    pub fn insert(&mut self, asset: AssetId, quantity: u64) {
        if quantity == 0 {
            return;
        }
        let slot = self
            .assets
            .entry(asset.policy)
            .or_default()
            .entry(asset.name)
            .or_default();
        *slot = slot.saturating_add(quantity);
    }

    pub fn quantity_of(&self, asset: &AssetId) -> u64 {
        self.assets
            .get(&asset.policy)
            .and_then(|names| names.get(&asset.name))
            .copied()
            .unwrap_or_default()
    }

    /// All native assets, in canonical order.
    pub fn assets(&self) -> impl Iterator<Item = (AssetId, u64)> + '_ {
        self.assets.iter().flat_map(|(policy, names)| {
            names
                .iter()
                .map(|(name, quantity)| (AssetId::new(*policy, name.clone()), *quantity))
        })
    }

    pub fn policies(&self) -> impl Iterator<Item = &PolicyId> {
        self.assets.keys()
    }

    pub fn has_assets(&self) -> bool {
        !self.assets.is_empty()
    }

    pub fn is_zero(&self) -> bool {
        self.lovelace == 0 && self.assets.is_empty()
    }

    /// The same bag, stripped of its lovelace.
    pub fn without_lovelace(&self) -> Self {
        Self {
            lovelace: 0,
            assets: self.assets.clone(),
        }
    }

    /// The same bag, stripped of every unit of `asset`.
    pub fn without_asset(&self, asset: &AssetId) -> Self {
        let mut value = self.clone();
        if let Some(names) = value.assets.get_mut(&asset.policy) {
            names.remove(&asset.name);
            if names.is_empty() {
                value.assets.remove(&asset.policy);
            }
        }
        value
    }

    pub fn checked_add(&self, other: &Value) -> Option<Value> {
        let mut sum = self.clone();
        sum.lovelace = sum.lovelace.checked_add(other.lovelace)?;
        for (asset, quantity) in other.assets() {
            let current = sum.quantity_of(&asset);
            let total = current.checked_add(quantity)?;
            sum.set_quantity(asset, total);
        }
        Some(sum)
    }

    /// Subtract `other` from this value; `None` if any component would become negative.
    pub fn checked_sub(&self, other: &Value) -> Option<Value> {
        let mut difference = self.clone();
        difference.lovelace = difference.lovelace.checked_sub(other.lovelace)?;
        for (asset, quantity) in other.assets() {
            let current = difference.quantity_of(&asset);
            let remaining = current.checked_sub(quantity)?;
            difference.set_quantity(asset, remaining);
        }
        Some(difference)
    }

    fn set_quantity(&mut self, asset: AssetId, quantity: u64) {
        if quantity == 0 {
            *self = self.without_asset(&asset);
        } else {
            self.assets
                .entry(asset.policy)
                .or_default()
                .insert(asset.name, quantity);
        }
    }
}

/// The total of many values; `None` on overflow.
pub fn checked_sum<'a>(values: impl IntoIterator<Item = &'a Value>) -> Option<Value> {
    values
        .into_iter()
        .try_fold(Value::default(), |acc, value| acc.checked_add(value))
}

#[cfg(test)]
mod tests {
    use super::{Value, checked_sum};
    use crate::{AssetId, AssetName, NULL_HASH28, any_hash28};
    use proptest::prelude::*;

    fn token(name: &str) -> AssetId {
        AssetId::new(NULL_HASH28, AssetName::from_text(name).unwrap())
    }

    proptest! {
        #[test]
        fn add_then_sub_is_identity(
            policy in any_hash28(),
            lovelace_a in 0..u32::MAX as u64,
            lovelace_b in 0..u32::MAX as u64,
            quantity in 1..u32::MAX as u64,
        ) {
            let asset = AssetId::new(policy, AssetName::default());
            let a = Value::new(lovelace_a).with_asset(asset, quantity);
            let b = Value::new(lovelace_b);
            prop_assert_eq!(a.checked_add(&b).and_then(|sum| sum.checked_sub(&b)), Some(a));
        }
    }

    #[test]
    fn subtraction_underflow_is_detected() {
        let a = Value::new(10).with_asset(token("a"), 1);
        let b = Value::new(5).with_asset(token("a"), 2);
        assert_eq!(a.checked_sub(&b), None);
        assert_eq!(Value::new(1).checked_sub(&Value::new(2)), None);
    }

    #[test]
    fn zero_quantities_disappear() {
        let a = Value::new(10).with_asset(token("a"), 1);
        let b = Value::new(0).with_asset(token("a"), 1);
        let difference = a.checked_sub(&b).unwrap();
        assert!(!difference.has_assets());
        assert_eq!(difference, Value::new(10));
    }

    #[test]
    fn without_lovelace_keeps_assets() {
        let value = Value::new(2_000_000)
            .with_asset(token("a"), 1)
            .with_asset(token("b"), 3);
        let assets = value.without_lovelace();
        assert_eq!(assets.lovelace(), 0);
        assert_eq!(assets.assets().count(), 2);
        assert_eq!(assets.quantity_of(&token("b")), 3);
    }

    #[test]
    fn sum_of_values() {
        let values = [Value::new(1).with_asset(token("a"), 1), Value::new(2)];
        assert_eq!(checked_sum(&values), Some(Value::new(3).with_asset(token("a"), 1)));
    }
}
