//! Configuration schema definitions.
//!
//! Every section is `#[serde(default)]`, so an empty file yields the reference deployment on
//! Sepolia. Secrets (the signing key, the indexer key) never live here; only the name of the environment
//! variable that holds them does.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct DappConfig {
    /// RPC endpoints and confirmation policy.
    pub network: NetworkConfig,

    /// Local signing wallet.
    pub wallet: WalletConfig,

    /// Deployed contract addresses.
    pub contracts: ContractsConfig,

    /// Snapshot polling.
    pub sync: SyncConfig,

    /// Third-party indexing API.
    pub indexer: IndexerConfig,

    /// Simulated deposit ledger.
    pub ledger: LedgerConfig,

    /// Logging and metrics.
    pub observability: ObservabilityConfig,
}

/// Chain RPC configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// Failover JSON-RPC endpoint URLs, tried in order.
    pub failover_urls: Vec<String>,

    /// Chain the contracts live on; writes are refused on any other chain.
    pub chain_id: u64,

    /// RPC request timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// Number of blocks (inclusion block counted) before a transaction is confirmed.
    pub confirmation_blocks: u32,

    /// How long a write is shown as pending before the caller stops waiting.
    pub confirmation_timeout_secs: u64,

    /// Receipt polling interval in milliseconds.
    pub receipt_poll_ms: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            rpc_url: "https://ethereum-sepolia-rpc.publicnode.com".to_string(),
            failover_urls: Vec::new(),
            chain_id: 11_155_111,
            rpc_timeout_secs: 10,
            confirmation_blocks: 1,
            confirmation_timeout_secs: 300,
            receipt_poll_ms: 2_000,
        }
    }
}

/// Local wallet configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WalletConfig {
    /// Environment variable holding the hex private key.
    pub private_key_env: String,

    /// Report the account on the silent account query, as a wallet that remembers a
    /// previous approval would.
    pub auto_connect: bool,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            private_key_env: "DAPP_SYNC_PRIVATE_KEY".to_string(),
            auto_connect: true,
        }
    }
}

/// Deployed contract addresses (hex strings, validated on load).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ContractsConfig {
    /// ERC-20 token that is minted and staked.
    pub stake_token: String,

    /// ERC-721 collection that is minted and staked.
    pub stake_nft: String,

    /// Reward token with a capped supply.
    pub earn_token: String,

    /// Launchpad staking contract.
    pub launchpad: String,
}

impl Default for ContractsConfig {
    fn default() -> Self {
        Self {
            stake_token: "0x73E416BE059B83A8d8FFcF024d024284ADbA0b88".to_string(),
            stake_nft: "0x836c806A676f8C9BE701eD6358667A01564f0e03".to_string(),
            earn_token: "0x0Fd8cF7dD90050B433d76Dd9Eb9fAdF708b9Da78".to_string(),
            launchpad: "0xeb487Bf1E0556340e6cDAb9aC2328038e21c9744".to_string(),
        }
    }
}

/// Snapshot synchronization settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Polling interval in milliseconds while an address is connected.
    pub poll_interval_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 15_000,
        }
    }
}

/// Indexing API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IndexerConfig {
    /// Environment variable holding the API key.
    pub api_key_env: String,

    /// Network-specific base URL, e.g. `https://eth-sepolia.g.alchemy.com`.
    pub base_url: String,

    /// Maximum token rows returned by a lookup.
    pub max_tokens: usize,

    /// Maximum NFT rows returned by a lookup.
    pub max_nfts: usize,

    /// HTTP request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl IndexerConfig {
    /// API key from the environment; empty when unset.
    pub fn api_key(&self) -> String {
        std::env::var(&self.api_key_env).unwrap_or_default()
    }

    /// JSON-RPC endpoint for balance and metadata calls. The key is part of the path.
    pub fn rpc_url(&self, api_key: &str) -> String {
        format!("{}/v2/{}", self.base_url.trim_end_matches('/'), api_key)
    }

    /// REST endpoint root for NFT enumeration.
    pub fn nft_api_url(&self, api_key: &str) -> String {
        format!("{}/nft/v2/{}", self.base_url.trim_end_matches('/'), api_key)
    }
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            api_key_env: "DAPP_SYNC_ALCHEMY_API_KEY".to_string(),
            base_url: "https://eth-sepolia.g.alchemy.com".to_string(),
            max_tokens: 20,
            max_nfts: 30,
            request_timeout_secs: 15,
        }
    }
}

/// Simulated deposit ledger configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// JSON file backing the ledger; `None` keeps it in memory.
    pub path: Option<String>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            path: Some("deposits.json".to_string()),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level used when `RUST_LOG` is unset.
    pub log_level: String,

    /// Expose a Prometheus scrape endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_page() {
        let config = DappConfig::default();
        assert_eq!(config.sync.poll_interval_ms, 15_000);
        assert_eq!(config.indexer.max_tokens, 20);
        assert_eq!(config.indexer.max_nfts, 30);
        assert_eq!(config.network.chain_id, 11_155_111);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: DappConfig = toml::from_str(
            r#"
            [sync]
            poll_interval_ms = 500

            [indexer]
            base_url = "https://eth-mainnet.g.alchemy.com/"
            "#,
        )
        .unwrap();
        assert_eq!(config.sync.poll_interval_ms, 500);
        assert_eq!(config.indexer.max_nfts, 30);
        assert_eq!(
            config.indexer.rpc_url("abc"),
            "https://eth-mainnet.g.alchemy.com/v2/abc"
        );
        assert_eq!(
            config.indexer.nft_api_url("abc"),
            "https://eth-mainnet.g.alchemy.com/nft/v2/abc"
        );
    }
}
