//! Chain-specific types and error definitions.

use alloy::primitives::TxHash;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use crate::config::schema::NetworkConfig;

/// Chain ID type for strong typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChainId(pub u64);

/// Sepolia, the network the reference deployment lives on.
pub const SEPOLIA: ChainId = ChainId(11_155_111);

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<ChainId> for u64 {
    fn from(id: ChainId) -> Self {
        id.0
    }
}

impl std::fmt::Display for ChainId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            SEPOLIA => write!(f, "{} (sepolia)", self.0),
            _ => write!(f, "{}", self.0),
        }
    }
}

/// Errors that can occur while talking to the chain or the wallet.
#[derive(Debug, Clone, Error)]
pub enum ChainError {
    /// RPC connection or request failed.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// RPC request timed out.
    #[error("RPC timeout after {0} seconds")]
    Timeout(u64),

    /// Transaction was not confirmed within the display ceiling.
    #[error("transaction {0} still pending after the confirmation ceiling")]
    ConfirmationTimeout(TxHash),

    /// Transaction or call was reverted on-chain.
    #[error("execution reverted: {0}")]
    Reverted(String),

    /// Signer or key handling failed.
    #[error("Wallet error: {0}")]
    Wallet(String),

    /// The wallet holder dismissed a prompt.
    #[error("request rejected by the wallet: {0}")]
    UserRejected(String),

    /// Chain configuration mismatch.
    #[error("Chain ID mismatch: expected {expected}, got {actual}")]
    ChainMismatch { expected: u64, actual: u64 },

    /// The wallet cannot serve the requested network.
    #[error("wallet cannot switch to chain {0}")]
    UnsupportedChain(ChainId),

    /// Client not initialized or disabled.
    #[error("Blockchain not available: {0}")]
    NotAvailable(String),
}

/// Result type for chain operations.
pub type ChainResult<T> = Result<T, ChainError>;

/// Transaction confirmation status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationStatus {
    /// Transaction is confirmed with the required block depth.
    Confirmed { block_number: u64 },
    /// Transaction was mined but reverted.
    Failed(String),
}
