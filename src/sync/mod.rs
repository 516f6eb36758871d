//! Wallet-session synchronizer.
//!
//! # Data Flow
//! ```text
//! WalletProvider (accounts, chain, events)
//!     → synchronizer.rs (session, polling, guarded writes)
//!     → contracts::ContractSet (reads in one concurrent batch, writes)
//!     → snapshot.rs (AssetSnapshot, swapped atomically)
//! ```

pub mod error;
pub mod pending;
pub mod session;
pub mod snapshot;
pub mod synchronizer;

pub use error::{SyncError, WriteOutcome};
pub use pending::{ActionGuard, ActionTag, PendingSlot};
pub use session::{SessionState, WalletSession};
pub use snapshot::{
    format_amount, parse_amount, AssetSnapshot, MiningProgress, NftPosition, SnapshotReport,
    StakingPosition, TokenPosition, NFT_WEIGHT, REWARD_DECIMALS,
};
pub use synchronizer::{Authorization, SyncSettings, Synchronizer, MAX_NFT_MINT};
