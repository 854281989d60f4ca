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

use crate::{KoiosClient, LookupError};
use async_trait::async_trait;
use std::collections::BTreeMap;
use winter_kernel::ScriptHash;

/// Somewhere scripts can be found by hash.
#[async_trait]
pub trait ScriptRegistry: Send + Sync {
    /// The scripts known for the given hashes, wrapped once in CBOR. Unknown hashes are absent
    /// from the result rather than an error.
    async fn lookup_scripts(
        &self,
        hashes: &[ScriptHash],
    ) -> Result<BTreeMap<ScriptHash, Vec<u8>>, LookupError>;
}

#[async_trait]
impl ScriptRegistry for KoiosClient {
    async fn lookup_scripts(
        &self,
        hashes: &[ScriptHash],
    ) -> Result<BTreeMap<ScriptHash, Vec<u8>>, LookupError> {
        let mut scripts = BTreeMap::new();
        for info in self.script_info(hashes).await? {
            if let Some(bytes) = info.script_bytes()? {
                scripts.insert(info.hash()?, bytes);
            }
        }
        Ok(scripts)
    }
}

/// A registry of scripts held locally.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRegistry {
    scripts: BTreeMap<ScriptHash, Vec<u8>>,
}

impl InMemoryRegistry {
    pub fn insert(&mut self, hash: ScriptHash, script: Vec<u8>) {
        self.scripts.insert(hash, script);
    }
}

impl FromIterator<(ScriptHash, Vec<u8>)> for InMemoryRegistry {
    fn from_iter<I: IntoIterator<Item = (ScriptHash, Vec<u8>)>>(iter: I) -> Self {
        Self {
            scripts: iter.into_iter().collect(),
        }
    }
}

#[async_trait]
impl ScriptRegistry for InMemoryRegistry {
    async fn lookup_scripts(
        &self,
        hashes: &[ScriptHash],
    ) -> Result<BTreeMap<ScriptHash, Vec<u8>>, LookupError> {
        Ok(hashes
            .iter()
            .filter_map(|hash| Some((*hash, self.scripts.get(hash)?.clone())))
            .collect())
    }
}

/// One script per requested hash, in the order of the request. Duplicate hashes are looked up
/// once.
pub async fn resolve_scripts(
    registry: &dyn ScriptRegistry,
    hashes: &[ScriptHash],
) -> Result<Vec<Vec<u8>>, LookupError> {
    let mut unique = hashes.to_vec();
    unique.sort();
    unique.dedup();

    let found = registry.lookup_scripts(&unique).await?;

    hashes
        .iter()
        .map(|hash| {
            found
                .get(hash)
                .cloned()
                .ok_or(LookupError::MissingScript(*hash))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{InMemoryRegistry, ScriptRegistry, resolve_scripts};
    use crate::LookupError;
    use async_trait::async_trait;
    use std::{
        collections::BTreeMap,
        sync::atomic::{AtomicUsize, Ordering},
    };
    use winter_kernel::{Hash, ScriptHash};

    #[tokio::test]
    async fn scripts_follow_request_order() {
        let registry: InMemoryRegistry = [
            (Hash::new([1; 28]), vec![0x01]),
            (Hash::new([2; 28]), vec![0x02]),
        ]
        .into_iter()
        .collect();

        let scripts = resolve_scripts(
            &registry,
            &[Hash::new([2; 28]), Hash::new([1; 28]), Hash::new([2; 28])],
        )
        .await
        .unwrap();

        assert_eq!(scripts, vec![vec![0x02], vec![0x01], vec![0x02]]);
    }

    #[tokio::test]
    async fn unknown_scripts_are_errors() {
        let registry = InMemoryRegistry::default();
        let hash = Hash::new([7; 28]);
        assert!(matches!(
            resolve_scripts(&registry, &[hash]).await,
            Err(LookupError::MissingScript(missing)) if missing == hash
        ));
    }

    struct Counting(AtomicUsize);

    #[async_trait]
    impl ScriptRegistry for Counting {
        async fn lookup_scripts(
            &self,
            hashes: &[ScriptHash],
        ) -> Result<BTreeMap<ScriptHash, Vec<u8>>, LookupError> {
            self.0.fetch_add(hashes.len(), Ordering::SeqCst);
            Ok(hashes.iter().map(|hash| (*hash, hash.to_vec())).collect())
        }
    }

    #[tokio::test]
    async fn duplicates_are_looked_up_once() {
        let registry = Counting(AtomicUsize::new(0));
        let hash = Hash::new([9; 28]);
        let scripts = resolve_scripts(&registry, &[hash, hash]).await.unwrap();
        assert_eq!(scripts.len(), 2);
        assert_eq!(registry.0.load(Ordering::SeqCst), 1);
    }
}
