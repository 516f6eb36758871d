//! The wallet surface the synchronizer depends on.

use alloy::primitives::{Address, TxHash};
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::broadcast;

use crate::blockchain::types::{ChainId, ChainResult, ConfirmationStatus};

/// Notifications originated by the wallet, not by this client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletEvent {
    /// The exposed account list changed; empty means the wallet locked or revoked access.
    AccountsChanged(Vec<Address>),
    /// The wallet moved to another network.
    ChainChanged(ChainId),
}

/// Account access, network selection and transaction confirmation.
///
/// Implementations must never prompt from [`accounts`](Self::accounts).
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Accounts already authorized for this client. Silent.
    async fn accounts(&self) -> ChainResult<Vec<Address>>;

    /// Ask the holder for account access. May prompt; a dismissed prompt is
    /// `ChainError::UserRejected`.
    async fn request_accounts(&self) -> ChainResult<Vec<Address>>;

    /// Network the wallet currently signs for.
    async fn chain_id(&self) -> ChainResult<ChainId>;

    /// Ask the wallet to move to `chain_id`.
    async fn switch_chain(&self, chain_id: ChainId) -> ChainResult<()>;

    /// Wait until `tx_hash` is confirmed, giving up after `ceiling` with
    /// `ChainError::ConfirmationTimeout`.
    async fn wait_for_confirmation(
        &self,
        tx_hash: TxHash,
        ceiling: Duration,
    ) -> ChainResult<ConfirmationStatus>;

    /// Start receiving wallet events. Dropping the subscription unsubscribes.
    fn subscribe(&self) -> WalletSubscription;
}

/// Fan-out of wallet events to every live subscription.
#[derive(Debug, Clone)]
pub struct WalletEventBus {
    tx: broadcast::Sender<WalletEvent>,
}

impl WalletEventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(16);
        Self { tx }
    }

    pub fn emit(&self, event: WalletEvent) {
        tracing::debug!(?event, subscribers = self.tx.receiver_count(), "Wallet event");
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> WalletSubscription {
        WalletSubscription {
            rx: self.tx.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for WalletEventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle on a stream of [`WalletEvent`]s.
#[derive(Debug)]
pub struct WalletSubscription {
    rx: broadcast::Receiver<WalletEvent>,
}

impl WalletSubscription {
    /// Next event, or `None` once the wallet is gone. Lagged events are skipped; the next
    /// delivered event carries the current state anyway.
    pub async fn next(&mut self) -> Option<WalletEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Wallet event subscription lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
