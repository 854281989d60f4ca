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

use crate::{ScriptInfo, UtxoInfo, types::asset_list};
use reqwest::{StatusCode, header};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::json;
use tracing::{debug, warn};
use winter_kernel::{AssetId, ScriptHash};

#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} responded with status {status}: {body}")]
    Status {
        url: String,
        status: StatusCode,
        body: String,
    },
    #[error("unexpected response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("lookup at {url} failed: {source}")]
    Fetch {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("no script found for hash {0}")]
    MissingScript(ScriptHash),
    #[error("malformed {field} in indexer response: '{value}'")]
    Malformed { field: &'static str, value: String },
}

/// A client for the subset of the Koios API needed to operate on events.
///
/// Requests are not retried: any transport failure or non-success status is returned as is.
#[derive(Debug, Clone)]
pub struct KoiosClient {
    base_url: String,
    http: reqwest::Client,
}

impl KoiosClient {
    pub fn new(base_url: &str) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    pub fn with_client(base_url: &str, http: reqwest::Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches(['/', '\\']).to_string(),
            http,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `POST /script_info`
    pub async fn script_info(&self, hashes: &[ScriptHash]) -> Result<Vec<ScriptInfo>, LookupError> {
        let hashes = hashes.iter().map(hex::encode).collect::<Vec<_>>();
        self.post("script_info", &json!({ "_script_hashes": hashes }))
            .await
    }

    /// `POST /asset_utxos`, extended so that inline datums and assets are included.
    pub async fn asset_utxos(&self, assets: &[AssetId]) -> Result<Vec<UtxoInfo>, LookupError> {
        self.post(
            "asset_utxos",
            &json!({ "_asset_list": asset_list(assets), "_extended": true }),
        )
        .await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T, LookupError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        debug!(%url, "querying indexer");

        let response = self
            .http
            .post(&url)
            .header(header::ACCEPT, "application/json")
            .json(body)
            .send()
            .await
            .map_err(|source| LookupError::Transport {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%url, %status, "indexer request rejected");
            return Err(LookupError::Status { url, status, body });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|source| LookupError::Transport {
                url: url.clone(),
                source,
            })?;

        serde_json::from_slice(&bytes).map_err(|source| LookupError::Decode { url, source })
    }
}

#[cfg(test)]
mod tests {
    use super::{KoiosClient, LookupError};
    use test_case::test_case;
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
        task::JoinHandle,
    };
    use winter_kernel::{AssetId, Hash};

    /// Serve a single canned HTTP response, handing back the raw request received.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buffer = [0_u8; 4096];
            loop {
                let n = socket.read(&mut buffer).await.unwrap();
                request.extend_from_slice(&buffer[..n]);
                if n == 0 || is_complete(&request) {
                    break;
                }
            }
            let response = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
            String::from_utf8(request).unwrap()
        });

        (format!("http://{address}/api/v1/"), handle)
    }

    fn is_complete(request: &[u8]) -> bool {
        let text = String::from_utf8_lossy(request);
        let Some((head, body)) = text.split_once("\r\n\r\n") else {
            return false;
        };
        let length = head
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        body.len() >= length
    }

    #[test_case("https://preprod.koios.rest/api/v1", "https://preprod.koios.rest/api/v1")]
    #[test_case("https://preprod.koios.rest/api/v1/", "https://preprod.koios.rest/api/v1")]
    #[test_case("https://preprod.koios.rest/api/v1//\\", "https://preprod.koios.rest/api/v1")]
    fn trailing_separators_are_trimmed(given: &str, expected: &str) {
        assert_eq!(KoiosClient::new(given).base_url(), expected);
    }

    #[tokio::test]
    async fn script_info_posts_hashes() {
        let (url, server) = serve_once(
            "200 OK",
            r#"[{"script_hash":"81cbb6417e3213bc9006a2647a82a45fad19bd379a8a44121587faca","type":"plutusV2","bytes":"46010000480141","size":7}]"#,
        )
        .await;

        let hash = Hash::new([0xab; 28]);
        let infos = KoiosClient::new(&url).script_info(&[hash]).await.unwrap();
        let request = server.await.unwrap();

        assert!(request.starts_with("POST /api/v1/script_info HTTP/1.1"));
        assert!(request.contains(&format!(r#"{{"_script_hashes":["{hash}"]}}"#)));
        assert_eq!(infos.len(), 1);
        assert_eq!(infos[0].bytes.as_deref(), Some("46010000480141"));
    }

    #[tokio::test]
    async fn asset_utxos_posts_asset_list() {
        let (url, server) = serve_once("200 OK", "[]").await;

        let asset = AssetId::from_unit(
            "af349fbec5cbf3b8c211b27aae50eaebc68e35ef7654df1c403581ee426c61636b",
        )
        .unwrap();
        let utxos = KoiosClient::new(&url).asset_utxos(&[asset]).await.unwrap();
        let request = server.await.unwrap();

        assert!(request.starts_with("POST /api/v1/asset_utxos HTTP/1.1"));
        assert!(request.contains(
            r#""_asset_list":[["af349fbec5cbf3b8c211b27aae50eaebc68e35ef7654df1c403581ee","426c61636b"]]"#
        ));
        assert!(request.contains(r#""_extended":true"#));
        assert!(utxos.is_empty());
    }

    #[tokio::test]
    async fn failures_are_not_retried() {
        let (url, server) = serve_once("503 Service Unavailable", r#"{"message":"down"}"#).await;

        let result = KoiosClient::new(&url).script_info(&[Hash::new([0; 28])]).await;
        server.await.unwrap();

        match result {
            Err(LookupError::Status { status, body, .. }) => {
                assert_eq!(status.as_u16(), 503);
                assert_eq!(body, r#"{"message":"down"}"#);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unexpected_payloads_are_decode_errors() {
        let (url, server) = serve_once("200 OK", r#"{"not":"a list"}"#).await;

        let result = KoiosClient::new(&url).script_info(&[Hash::new([0; 28])]).await;
        server.await.unwrap();

        assert!(matches!(result, Err(LookupError::Decode { .. })));
    }
}
