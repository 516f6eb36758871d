//! Holdings lookup for an arbitrary address.

use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use futures_util::future::join_all;
use serde::Serialize;
use std::sync::Arc;

use super::client::{IndexerClient, IndexerError, IndexerResult, OwnedNft, TokenBalance};
use crate::blockchain::client::ChainClient;
use crate::blockchain::types::ChainResult;
use crate::config::schema::IndexerConfig;
use crate::sync::snapshot::format_amount;

const PLACEHOLDER_KEY: &str = "YOUR_ALCHEMY_API_KEY";

/// Native-currency balance source, independent of the indexer.
#[async_trait]
pub trait NativeBalance: Send + Sync {
    async fn native_balance(&self, address: Address) -> ChainResult<U256>;
}

#[async_trait]
impl NativeBalance for ChainClient {
    async fn native_balance(&self, address: Address) -> ChainResult<U256> {
        self.get_balance(address).await
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Holdings {
    pub address: Address,
    /// In ether; `None` when the lookup failed.
    pub native_balance: Option<String>,
    pub tokens: Vec<TokenHolding>,
    pub nfts: Vec<NftHolding>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenHolding {
    pub contract_address: Address,
    pub balance_raw: String,
    pub balance: String,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

#[derive(Debug, Clone, Serialize)]
pub struct NftHolding {
    pub contract_address: String,
    pub token_id: String,
    pub title: Option<String>,
    pub balance: Option<String>,
}

impl From<OwnedNft> for NftHolding {
    fn from(nft: OwnedNft) -> Self {
        Self {
            contract_address: nft.contract.address,
            token_id: nft.id.token_id,
            title: nft.title.filter(|t| !t.is_empty()),
            balance: nft.balance,
        }
    }
}

/// Whether `key` looks like a real API key rather than a blank or the template value.
pub fn is_usable_api_key(key: &str) -> bool {
    !key.trim().is_empty() && !key.contains(PLACEHOLDER_KEY)
}

pub struct AddressTracker {
    indexer: IndexerClient,
    chain: Arc<dyn NativeBalance>,
    api_key_usable: bool,
    max_tokens: usize,
    max_nfts: usize,
}

impl AddressTracker {
    pub fn new(
        config: &IndexerConfig,
        api_key: &str,
        chain: Arc<dyn NativeBalance>,
    ) -> IndexerResult<Self> {
        Ok(Self {
            indexer: IndexerClient::new(config, api_key)?,
            chain,
            api_key_usable: is_usable_api_key(api_key),
            max_tokens: config.max_tokens,
            max_nfts: config.max_nfts,
        })
    }

    /// Native balance, non-zero token balances and NFTs of `address`, fetched concurrently.
    pub async fn track(&self, address: &str) -> IndexerResult<Holdings> {
        let address: Address = address
            .trim()
            .parse()
            .map_err(|_| IndexerError::InvalidAddress(address.to_string()))?;
        if !self.api_key_usable {
            return Err(IndexerError::MissingApiKey);
        }

        tracing::info!(%address, "Tracking address holdings");
        let (native, tokens, nfts) = tokio::join!(
            self.native_balance(address),
            self.token_holdings(address),
            self.nft_holdings(address),
        );

        let holdings = Holdings {
            address,
            native_balance: native,
            tokens: tokens?,
            nfts: nfts?,
        };
        tracing::info!(
            %address,
            tokens = holdings.tokens.len(),
            nfts = holdings.nfts.len(),
            "Holdings lookup complete"
        );
        Ok(holdings)
    }

    async fn native_balance(&self, address: Address) -> Option<String> {
        match self.chain.native_balance(address).await {
            Ok(wei) => Some(format_amount(wei, 18)),
            Err(e) => {
                tracing::warn!(%address, error = %e, "Native balance lookup failed");
                None
            }
        }
    }

    async fn token_holdings(&self, address: Address) -> IndexerResult<Vec<TokenHolding>> {
        let balances = self.indexer.token_balances(address).await?;
        let non_zero: Vec<TokenBalance> = balances
            .into_iter()
            .filter(|b| b.token_balance.as_deref().is_some_and(|raw| !is_zero_quantity(raw)))
            .take(self.max_tokens)
            .collect();

        Ok(join_all(non_zero.into_iter().map(|b| self.describe(b))).await)
    }

    async fn describe(&self, balance: TokenBalance) -> TokenHolding {
        let contract = balance.contract_address;
        let metadata = match self.indexer.token_metadata(contract).await {
            Ok(metadata) => metadata,
            Err(e) => {
                tracing::warn!(%contract, error = %e, "Token metadata unavailable");
                Default::default()
            }
        };
        let decimals = metadata.decimals.unwrap_or(0);
        let raw = balance.token_balance.unwrap_or_default();
        let formatted = raw
            .parse::<U256>()
            .map(|value| format_amount(value, decimals))
            .unwrap_or_else(|_| raw.clone());

        TokenHolding {
            contract_address: contract,
            balance_raw: raw,
            balance: formatted,
            name: metadata.name.unwrap_or_else(|| "Unknown Token".to_string()),
            symbol: metadata.symbol.unwrap_or_else(|| "???".to_string()),
            decimals,
        }
    }

    async fn nft_holdings(&self, address: Address) -> IndexerResult<Vec<NftHolding>> {
        let nfts = self.indexer.owned_nfts(address).await?;
        Ok(nfts
            .into_iter()
            .take(self.max_nfts)
            .map(NftHolding::from)
            .collect())
    }
}

/// Unparsable quantities are kept and shown raw.
fn is_zero_quantity(raw: &str) -> bool {
    raw.parse::<U256>().is_ok_and(|value| value.is_zero())
}
