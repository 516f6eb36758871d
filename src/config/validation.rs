//! Configuration validation.
//!
//! Serde handles syntax; this checks values: URLs parse, addresses are well formed, and
//! intervals are non-zero. All problems are reported together.

use alloy::primitives::Address;

use crate::config::schema::DappConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Validate a configuration, collecting every error.
pub fn validate_config(config: &DappConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.network.rpc_url.parse::<url::Url>().is_err() {
        errors.push(ValidationError::new("network.rpc_url", "not a valid URL"));
    }
    for failover in &config.network.failover_urls {
        if failover.parse::<url::Url>().is_err() {
            errors.push(ValidationError::new(
                "network.failover_urls",
                format!("'{}' is not a valid URL", failover),
            ));
        }
    }
    if config.network.rpc_timeout_secs == 0 {
        errors.push(ValidationError::new("network.rpc_timeout_secs", "must be > 0"));
    }
    if config.network.confirmation_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "network.confirmation_timeout_secs",
            "must be > 0",
        ));
    }
    if config.network.receipt_poll_ms == 0 {
        errors.push(ValidationError::new("network.receipt_poll_ms", "must be > 0"));
    }

    let contracts = [
        ("contracts.stake_token", &config.contracts.stake_token),
        ("contracts.stake_nft", &config.contracts.stake_nft),
        ("contracts.earn_token", &config.contracts.earn_token),
        ("contracts.launchpad", &config.contracts.launchpad),
    ];
    for (field, value) in contracts {
        if value.parse::<Address>().is_err() {
            errors.push(ValidationError::new(field, format!("'{}' is not an address", value)));
        }
    }

    if config.sync.poll_interval_ms == 0 {
        errors.push(ValidationError::new("sync.poll_interval_ms", "must be > 0"));
    }
    if config.indexer.base_url.parse::<url::Url>().is_err() {
        errors.push(ValidationError::new("indexer.base_url", "not a valid URL"));
    }
    if config.indexer.max_tokens == 0 || config.indexer.max_nfts == 0 {
        errors.push(ValidationError::new(
            "indexer",
            "max_tokens and max_nfts must be > 0",
        ));
    }
    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<std::net::SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            "not a socket address",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
