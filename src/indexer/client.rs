//! HTTP client for the Alchemy-compatible indexing API.

use alloy::primitives::Address;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;

use crate::config::schema::IndexerConfig;

#[derive(Debug, Error)]
pub enum IndexerError {
    #[error("no usable indexer API key configured")]
    MissingApiKey,

    #[error("invalid address '{0}'")]
    InvalidAddress(String),

    #[error("indexer request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("indexer returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("indexer RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("indexer response could not be decoded: {0}")]
    Decode(String),
}

pub type IndexerResult<T> = Result<T, IndexerError>;

#[derive(Debug, Deserialize)]
struct RpcEnvelope {
    #[serde(default)]
    result: serde_json::Value,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBalances {
    #[serde(default)]
    pub token_balances: Vec<TokenBalance>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBalance {
    pub contract_address: Address,
    /// Hex quantity; absent when the indexer failed to read this contract.
    #[serde(default)]
    pub token_balance: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenMetadata {
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub decimals: Option<u8>,
    pub logo: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OwnedNftsPage {
    #[serde(default)]
    owned_nfts: Vec<OwnedNft>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OwnedNft {
    pub contract: NftContract,
    pub id: NftId,
    pub title: Option<String>,
    pub balance: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NftContract {
    pub address: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NftId {
    pub token_id: String,
}

/// Thin client over the indexer's JSON-RPC and NFT REST endpoints.
pub struct IndexerClient {
    http: Client,
    rpc_url: String,
    nft_api_url: String,
    next_id: AtomicU64,
}

impl IndexerClient {
    pub fn new(config: &IndexerConfig, api_key: &str) -> IndexerResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            http,
            rpc_url: config.rpc_url(api_key),
            nft_api_url: config.nft_api_url(api_key),
            next_id: AtomicU64::new(1),
        })
    }

    async fn rpc<T: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> IndexerResult<T> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params });

        tracing::debug!(method, id, "Indexer RPC request");
        let response = self.http.post(&self.rpc_url).json(&body).send().await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(IndexerError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let envelope: RpcEnvelope = serde_json::from_str(&text)
            .map_err(|e| IndexerError::Decode(format!("{}: {}", method, e)))?;
        if let Some(error) = envelope.error {
            return Err(IndexerError::Rpc {
                code: error.code,
                message: error.message,
            });
        }
        // A null result is only valid where `T` is an `Option`.
        serde_json::from_value(envelope.result)
            .map_err(|e| IndexerError::Decode(format!("{}: {}", method, e)))
    }

    /// ERC-20 balances held by `owner`, zero balances included.
    pub async fn token_balances(&self, owner: Address) -> IndexerResult<Vec<TokenBalance>> {
        let balances: TokenBalances = self
            .rpc("alchemy_getTokenBalances", json!([owner]))
            .await?;
        Ok(balances.token_balances)
    }

    /// Name, symbol and decimals of `contract`. Fields the indexer does not know are `None`.
    pub async fn token_metadata(&self, contract: Address) -> IndexerResult<TokenMetadata> {
        let metadata: Option<TokenMetadata> = self
            .rpc("alchemy_getTokenMetadata", json!([contract]))
            .await?;
        Ok(metadata.unwrap_or_default())
    }

    /// NFTs held by `owner` (first page).
    pub async fn owned_nfts(&self, owner: Address) -> IndexerResult<Vec<OwnedNft>> {
        let url = format!("{}/getNFTs", self.nft_api_url);
        let response = self
            .http
            .get(&url)
            .query(&[("owner", owner.to_string())])
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(IndexerError::Status {
                status: status.as_u16(),
                body: text,
            });
        }
        let page: OwnedNftsPage =
            serde_json::from_str(&text).map_err(|e| IndexerError::Decode(format!("getNFTs: {}", e)))?;
        Ok(page.owned_nfts)
    }
}

impl std::fmt::Debug for IndexerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // URLs carry the API key.
        f.debug_struct("IndexerClient").finish_non_exhaustive()
    }
}
