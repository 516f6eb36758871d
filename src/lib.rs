//! Wallet-session and on-chain state synchronizer for the launchpad staking DApp.
//!
//! # Architecture Overview
//!
//! ```text
//!   ┌──────────────────────────── dapp-sync ─────────────────────────────┐
//!   │                                                                     │
//!   │  wallet::WalletProvider ──events──▶ sync::Synchronizer ──▶ snapshot │
//!   │          │                               │                          │
//!   │          ▼                               ▼                          │
//!   │  blockchain::ChainClient ◀──── contracts::ContractSet (sol! rpc)    │
//!   │                                                                     │
//!   │  indexer (holdings lookup)   ledger (deposits)   diagnostics        │
//!   │                                                                     │
//!   │  config · observability · lifecycle                                 │
//!   └─────────────────────────────────────────────────────────────────────┘
//! ```

// Chain access
pub mod blockchain;
pub mod contracts;
pub mod wallet;

// Session synchronization
pub mod sync;

// Auxiliary tools
pub mod diagnostics;
pub mod indexer;
pub mod ledger;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use config::DappConfig;
pub use sync::Synchronizer;
