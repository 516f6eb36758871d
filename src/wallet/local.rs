//! Private-key wallet bound to a single RPC endpoint.
//!
//! # Security
//! - Private keys are loaded ONLY from environment variables
//! - Keys are never logged or serialized

use alloy::network::EthereumWallet;
use alloy::primitives::{Address, TxHash};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::blockchain::client::ChainClient;
use crate::blockchain::transaction::wait_for_confirmation;
use crate::blockchain::types::{ChainError, ChainId, ChainResult, ConfirmationStatus};
use crate::wallet::provider::{WalletEvent, WalletEventBus, WalletProvider, WalletSubscription};

/// A key-backed wallet.
///
/// It serves exactly the chain its RPC endpoint serves, so network switches to any other
/// chain are refused.
pub struct LocalWallet {
    signer: PrivateKeySigner,
    client: ChainClient,
    /// Provider that fills nonce, gas and signature for contract writes.
    signing_provider: DynProvider,
    /// Whether the account is exposed without an explicit request.
    authorized: AtomicBool,
    events: WalletEventBus,
}

impl LocalWallet {
    /// Create a wallet from a hex-encoded private key (with or without `0x`).
    pub fn from_private_key(
        private_key_hex: &str,
        client: ChainClient,
        auto_connect: bool,
    ) -> ChainResult<Self> {
        let key_hex = private_key_hex.trim();
        let key_hex = key_hex.strip_prefix("0x").unwrap_or(key_hex);

        let signer: PrivateKeySigner = key_hex
            .parse()
            .map_err(|e| ChainError::Wallet(format!("Invalid private key format: {}", e)))?;

        let rpc_url: url::Url = client.config().rpc_url.parse().map_err(|e| {
            ChainError::Rpc(format!("Invalid RPC URL '{}': {}", client.config().rpc_url, e))
        })?;
        let signing_provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer.clone()))
            .connect_http(rpc_url)
            .erased();

        tracing::info!(
            address = %signer.address(),
            chain_id = client.config().chain_id,
            "Wallet initialized"
        );

        Ok(Self {
            signer,
            client,
            signing_provider,
            authorized: AtomicBool::new(auto_connect),
            events: WalletEventBus::new(),
        })
    }

    /// Load the key from the environment variable `var`.
    pub fn from_env(var: &str, client: ChainClient, auto_connect: bool) -> ChainResult<Self> {
        let private_key = std::env::var(var).map_err(|_| {
            ChainError::Wallet(format!("Environment variable {} not set", var))
        })?;
        Self::from_private_key(&private_key, client, auto_connect)
    }

    /// The signing account.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Provider that signs with this wallet; contract bindings write through it.
    pub fn signing_provider(&self) -> DynProvider {
        self.signing_provider.clone()
    }

    /// Read-side client.
    pub fn client(&self) -> &ChainClient {
        &self.client
    }

    /// Withdraw access, as locking a browser wallet does.
    pub fn revoke(&self) {
        self.authorized.store(false, Ordering::SeqCst);
        self.events.emit(WalletEvent::AccountsChanged(Vec::new()));
    }

    fn exposed_accounts(&self) -> Vec<Address> {
        if self.authorized.load(Ordering::SeqCst) {
            vec![self.address()]
        } else {
            Vec::new()
        }
    }
}

#[async_trait]
impl WalletProvider for LocalWallet {
    async fn accounts(&self) -> ChainResult<Vec<Address>> {
        Ok(self.exposed_accounts())
    }

    async fn request_accounts(&self) -> ChainResult<Vec<Address>> {
        if !self.authorized.swap(true, Ordering::SeqCst) {
            self.events
                .emit(WalletEvent::AccountsChanged(vec![self.address()]));
        }
        Ok(self.exposed_accounts())
    }

    async fn chain_id(&self) -> ChainResult<ChainId> {
        self.client.get_chain_id().await
    }

    async fn switch_chain(&self, chain_id: ChainId) -> ChainResult<()> {
        let current = self.client.get_chain_id().await?;
        if current == chain_id {
            return Ok(());
        }
        Err(ChainError::UnsupportedChain(chain_id))
    }

    async fn wait_for_confirmation(
        &self,
        tx_hash: TxHash,
        ceiling: Duration,
    ) -> ChainResult<ConfirmationStatus> {
        let poll = Duration::from_millis(self.client.config().receipt_poll_ms);
        wait_for_confirmation(&self.client, tx_hash, poll, ceiling).await
    }

    fn subscribe(&self) -> WalletSubscription {
        self.events.subscribe()
    }
}

impl std::fmt::Debug for LocalWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalWallet")
            .field("address", &self.address())
            .field("authorized", &self.authorized.load(Ordering::SeqCst))
            .finish()
    }
}
