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

use crate::HttpFetcher;
use async_trait::async_trait;
use futures_util::future::try_join_all;
use std::collections::BTreeMap;
use tracing::warn;
use winter_kernel::ScriptHash;
use winter_koios::{LookupError, ScriptRegistry};

/// Where the minting scripts of spent events come from.
#[derive(Clone, Copy)]
pub enum ScriptLookup<'a> {
    /// Looked up by policy id.
    Remote(&'a dyn ScriptRegistry),
    /// Given by the caller, one per event output and in the same order.
    Explicit(&'a [Vec<u8>]),
}

/// Scripts fetched one by one from an indexer serving `GET {base}/scripts/{hash}/cbor`, which
/// answers `{ "cbor": "<hex>" }`.
pub struct HttpScriptRegistry<F> {
    fetcher: F,
    base_url: String,
}

impl<F: HttpFetcher> HttpScriptRegistry<F> {
    pub fn new(fetcher: F, base_url: &str) -> Self {
        Self {
            fetcher,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn lookup_script(&self, hash: &ScriptHash) -> Result<Option<Vec<u8>>, LookupError> {
        let url = format!("{}/scripts/{hash}/cbor", self.base_url);

        let json = self
            .fetcher
            .get(&url)
            .await
            .map_err(|source| LookupError::Fetch {
                url: url.clone(),
                source: Box::new(source),
            })?;

        match json.get("cbor").and_then(serde_json::Value::as_str) {
            None => {
                warn!(%url, "no script in response");
                Ok(None)
            }
            Some(cbor) => hex::decode(cbor)
                .map(Some)
                .map_err(|_| LookupError::Malformed {
                    field: "cbor",
                    value: cbor.to_string(),
                }),
        }
    }
}

#[async_trait]
impl<F: HttpFetcher> ScriptRegistry for HttpScriptRegistry<F> {
    async fn lookup_scripts(
        &self,
        hashes: &[ScriptHash],
    ) -> Result<BTreeMap<ScriptHash, Vec<u8>>, LookupError> {
        let found = try_join_all(hashes.iter().map(|hash| self.lookup_script(hash))).await?;
        Ok(hashes
            .iter()
            .zip(found)
            .filter_map(|(hash, script)| Some((*hash, script?)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::HttpScriptRegistry;
    use crate::{HttpFetcher, ProviderError};
    use async_trait::async_trait;
    use serde_json::json;
    use std::{collections::BTreeMap, sync::Mutex};
    use winter_kernel::{Hash, ScriptHash};
    use winter_koios::{LookupError, ScriptRegistry, resolve_scripts};

    #[derive(Default)]
    struct Responses {
        by_url: BTreeMap<String, serde_json::Value>,
        requested: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl HttpFetcher for Responses {
        async fn get(&self, url: &str) -> Result<serde_json::Value, ProviderError> {
            self.requested.lock().unwrap().push(url.to_string());
            self.by_url
                .get(url)
                .cloned()
                .ok_or_else(|| ProviderError::new(format!("404 on {url}")))
        }
    }

    fn hash(byte: u8) -> ScriptHash {
        Hash::new([byte; 28])
    }

    #[tokio::test]
    async fn fetches_each_script() {
        let mut responses = Responses::default();
        responses.by_url.insert(
            format!("http://indexer/scripts/{}/cbor", hash(1)),
            json!({ "cbor": "4746010000480141" }),
        );
        responses.by_url.insert(
            format!("http://indexer/scripts/{}/cbor", hash(2)),
            json!({ "cbor": null }),
        );
        let registry = HttpScriptRegistry::new(responses, "http://indexer/");

        let found = registry.lookup_scripts(&[hash(1), hash(2)]).await.unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[&hash(1)], hex::decode("4746010000480141").unwrap());
        assert_eq!(registry.fetcher.requested.lock().unwrap().len(), 2);

        assert!(matches!(
            resolve_scripts(&registry, &[hash(2)]).await,
            Err(LookupError::MissingScript(h)) if h == hash(2)
        ));
    }

    #[tokio::test]
    async fn fetch_failures_are_propagated() {
        let registry = HttpScriptRegistry::new(Responses::default(), "http://indexer");
        assert!(matches!(
            registry.lookup_scripts(&[hash(3)]).await,
            Err(LookupError::Fetch { url, .. }) if url.ends_with("/cbor")
        ));
    }

    #[tokio::test]
    async fn rejects_non_hex_scripts() {
        let mut responses = Responses::default();
        responses.by_url.insert(
            format!("http://indexer/scripts/{}/cbor", hash(4)),
            json!({ "cbor": "zz" }),
        );
        let registry = HttpScriptRegistry::new(responses, "http://indexer");
        assert!(matches!(
            registry.lookup_scripts(&[hash(4)]).await,
            Err(LookupError::Malformed { field: "cbor", .. })
        ));
    }
}
