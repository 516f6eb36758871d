//! Chain access subsystem.
//!
//! # Data Flow
//! ```text
//! NetworkConfig (RPC URLs, chain id, timeouts)
//!     → client.rs (failover RPC reads with timeouts)
//!     → transaction.rs (receipt polling up to a display ceiling)
//! ```
//!
//! # Constraints
//! - Every RPC call has a deadline
//! - Unreachable chains degrade to errors, never panics

pub mod client;
pub mod transaction;
pub mod types;

pub use client::ChainClient;
pub use transaction::wait_for_confirmation;
pub use types::{ChainError, ChainId, ChainResult, ConfirmationStatus, SEPOLIA};
