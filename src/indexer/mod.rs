//! Address holdings lookup through a third-party indexing API.

pub mod client;
pub mod tracker;

pub use client::{IndexerClient, IndexerError, IndexerResult, TokenMetadata};
pub use tracker::{is_usable_api_key, AddressTracker, Holdings, NativeBalance, NftHolding, TokenHolding};
