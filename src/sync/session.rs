//! Wallet session and the state derived from it.

use alloy::primitives::Address;
use serde::Serialize;

use super::pending::ActionTag;
use crate::blockchain::types::ChainId;

/// The account and network the synchronizer currently mirrors. Replaced wholesale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WalletSession {
    pub address: Option<Address>,
    pub chain_id: Option<ChainId>,
}

impl WalletSession {
    pub fn connected(address: Address, chain_id: Option<ChainId>) -> Self {
        Self {
            address: Some(address),
            chain_id,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.address.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    Disconnected,
    /// Waiting on an interactive account request.
    Connecting,
    Connected { pending: Option<ActionTag> },
}

impl SessionState {
    pub fn derive(session: &WalletSession, connecting: bool, pending: Option<ActionTag>) -> Self {
        if connecting {
            SessionState::Connecting
        } else if session.is_connected() {
            SessionState::Connected { pending }
        } else {
            SessionState::Disconnected
        }
    }
}
