//! User-facing failures and write outcomes.

use alloy::primitives::TxHash;
use serde::Serialize;
use thiserror::Error;

use super::pending::ActionTag;
use crate::blockchain::types::{ChainError, ChainId};

/// Everything an operation can report to the holder. The display text is what lands in the
/// message field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error("no wallet detected")]
    WalletAbsent,

    #[error("wallet not connected")]
    NotConnected,

    #[error("request rejected in the wallet")]
    UserRejected,

    #[error("wrong network: expected {expected}, wallet is on {actual}{}", switch_hint(.switched))]
    WrongNetwork {
        expected: ChainId,
        actual: ChainId,
        /// Whether the wallet accepted the switch request.
        switched: bool,
    },

    #[error("another action is pending: {0}")]
    ActionPending(ActionTag),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("transaction reverted: {0}")]
    Reverted(String),

    #[error("transaction {0} is still pending; check it again later")]
    ConfirmationTimeout(TxHash),

    #[error("{0}")]
    Failed(String),
}

fn switch_hint(switched: &bool) -> &'static str {
    if *switched {
        " (switch requested, run the action again)"
    } else {
        " (switch the wallet network manually)"
    }
}

impl From<ChainError> for SyncError {
    fn from(err: ChainError) -> Self {
        match err {
            ChainError::Reverted(reason) => SyncError::Reverted(reason),
            ChainError::ConfirmationTimeout(tx_hash) => SyncError::ConfirmationTimeout(tx_hash),
            ChainError::UserRejected(_) => SyncError::UserRejected,
            other => SyncError::Failed(other.to_string()),
        }
    }
}

/// How a write settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum WriteOutcome {
    /// The primary transaction confirmed and the snapshot was refreshed.
    Completed { tx_hash: TxHash, block_number: u64 },
    /// Only the authorization was missing; it is now confirmed and the action must be run
    /// again.
    ApprovalConfirmed { tx_hash: TxHash, block_number: u64 },
}
