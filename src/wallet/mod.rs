//! Wallet provider interface and the key-backed implementation.
//!
//! # Data Flow
//! ```text
//! Environment variable (private key)
//!     → local.rs (LocalWallet: accounts, chain, confirmations, signing provider)
//!     → provider.rs (WalletProvider trait + WalletEvent stream)
//!     → sync::Synchronizer
//! ```

pub mod local;
pub mod provider;

pub use local::LocalWallet;
pub use provider::{WalletEvent, WalletEventBus, WalletProvider, WalletSubscription};
