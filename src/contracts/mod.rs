//! Typed capability sets over the deployed contracts.
//!
//! The synchronizer depends on these traits only. Each asset kind has a view side and an
//! action side; the umbrella traits ([`FungibleAsset`], [`NonFungibleAsset`], [`Staking`])
//! are blanket-implemented so one handle can be shared behind an `Arc<dyn _>`.
//!
//! Write methods return once the transaction is broadcast. Waiting for it is the wallet's
//! job ([`crate::wallet::WalletProvider::wait_for_confirmation`]).

pub mod bindings;
pub mod erc20;
pub mod erc721;
pub mod launchpad;

use alloy::primitives::{Address, TxHash, U256};
use alloy::providers::DynProvider;
use async_trait::async_trait;
use futures_util::future::try_join_all;
use std::sync::Arc;

use crate::blockchain::types::{ChainError, ChainResult};
use crate::config::schema::ContractsConfig;

pub use erc20::Erc20Contract;
pub use erc721::Erc721Contract;
pub use launchpad::LaunchpadContract;

/// Read side of a fungible token.
#[async_trait]
pub trait FungibleAssetView: Send + Sync {
    async fn name(&self) -> ChainResult<String>;
    async fn symbol(&self) -> ChainResult<String>;
    async fn decimals(&self) -> ChainResult<u8>;
    async fn balance_of(&self, account: Address) -> ChainResult<U256>;
    async fn allowance(&self, owner: Address, spender: Address) -> ChainResult<U256>;
    /// Contract owner; tokens without `Ownable` revert.
    async fn owner(&self) -> ChainResult<Address>;
    async fn total_supply(&self) -> ChainResult<U256>;
    /// Supply cap; tokens without a cap revert.
    async fn max_supply(&self) -> ChainResult<U256>;
}

/// Write side of a fungible token.
#[async_trait]
pub trait FungibleAssetActions: Send + Sync {
    async fn approve(&self, spender: Address, amount: U256) -> ChainResult<TxHash>;
    /// Owner-only mint of a fixed batch (100 tokens).
    async fn mint(&self) -> ChainResult<TxHash>;
}

/// Read side of a non-fungible token.
#[async_trait]
pub trait NonFungibleAssetView: Send + Sync {
    async fn name(&self) -> ChainResult<String>;
    async fn symbol(&self) -> ChainResult<String>;
    async fn balance_of(&self, owner: Address) -> ChainResult<U256>;
    async fn owner_of(&self, token_id: U256) -> ChainResult<Address>;
    async fn total_supply(&self) -> ChainResult<U256>;
    async fn token_uri(&self, token_id: U256) -> ChainResult<String>;
    async fn is_approved_for_all(&self, owner: Address, operator: Address) -> ChainResult<bool>;

    /// Ids held by `owner`, found by querying `ownerOf` for ids `0..totalSupply` concurrently.
    async fn owned_token_ids(&self, owner: Address) -> ChainResult<Vec<U256>> {
        let total = self.total_supply().await?.saturating_to::<u64>();
        let ids: Vec<U256> = (0..total).map(U256::from).collect();
        let owners = try_join_all(ids.iter().map(|id| self.owner_of(*id))).await?;
        Ok(ids
            .into_iter()
            .zip(owners)
            .filter(|(_, holder)| *holder == owner)
            .map(|(id, _)| id)
            .collect())
    }
}

/// Write side of a non-fungible token.
#[async_trait]
pub trait NonFungibleAssetActions: Send + Sync {
    async fn mint(&self, quantity: u32) -> ChainResult<TxHash>;
    async fn approve(&self, to: Address, token_id: U256) -> ChainResult<TxHash>;
    async fn set_approval_for_all(&self, operator: Address, approved: bool)
        -> ChainResult<TxHash>;
}

/// Per-user staking record as the contract reports it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StakerInfo {
    pub staked_tokens: U256,
    pub staked_nfts: U256,
    pub weight: U256,
    pub rewards: U256,
    pub reward_per_weight_paid: U256,
    pub claimed: U256,
}

/// Read side of the staking contract.
#[async_trait]
pub trait StakingView: Send + Sync {
    /// Contract address; the spender/operator for approvals.
    fn address(&self) -> Address;
    async fn user_info(&self, user: Address) -> ChainResult<StakerInfo>;
    async fn pending_rewards(&self, user: Address) -> ChainResult<U256>;
    async fn total_earned(&self, user: Address) -> ChainResult<U256>;
    async fn total_claimed(&self, user: Address) -> ChainResult<U256>;
    async fn staked_nft_ids(&self, user: Address) -> ChainResult<Vec<U256>>;
    async fn total_weight(&self) -> ChainResult<U256>;
    async fn daily_reward(&self) -> ChainResult<U256>;
    async fn total_rewards_accrued(&self) -> ChainResult<U256>;
    async fn total_rewards_claimed(&self) -> ChainResult<U256>;
    async fn total_rewards_pending(&self) -> ChainResult<U256>;
}

/// Write side of the staking contract.
#[async_trait]
pub trait StakingActions: Send + Sync {
    async fn stake_tokens(&self, amount: U256) -> ChainResult<TxHash>;
    async fn unstake_tokens(&self, amount: U256) -> ChainResult<TxHash>;
    async fn stake_nft(&self, token_id: U256) -> ChainResult<TxHash>;
    async fn unstake_nft(&self, token_id: U256) -> ChainResult<TxHash>;
    async fn claim(&self) -> ChainResult<TxHash>;
}

pub trait FungibleAsset: FungibleAssetView + FungibleAssetActions {}
impl<T: FungibleAssetView + FungibleAssetActions> FungibleAsset for T {}

pub trait NonFungibleAsset: NonFungibleAssetView + NonFungibleAssetActions {}
impl<T: NonFungibleAssetView + NonFungibleAssetActions> NonFungibleAsset for T {}

pub trait Staking: StakingView + StakingActions {}
impl<T: StakingView + StakingActions> Staking for T {}

/// The contract handles a synchronizer works against.
#[derive(Clone)]
pub struct ContractSet {
    pub stake_token: Arc<dyn FungibleAsset>,
    pub nft: Arc<dyn NonFungibleAsset>,
    pub staking: Arc<dyn Staking>,
    /// Reward token; only its supply cap is read.
    pub earn_token: Arc<dyn FungibleAssetView>,
}

impl ContractSet {
    /// Bind the configured addresses to `provider`. Writes are signed by whatever wallet
    /// the provider carries.
    pub fn connect(provider: DynProvider, config: &ContractsConfig) -> ChainResult<Self> {
        let stake_token = parse_address("stake_token", &config.stake_token)?;
        let stake_nft = parse_address("stake_nft", &config.stake_nft)?;
        let earn_token = parse_address("earn_token", &config.earn_token)?;
        let launchpad = parse_address("launchpad", &config.launchpad)?;

        if launchpad == Address::ZERO {
            tracing::warn!("Launchpad address is unset; staking reads will fail until configured");
        }

        Ok(Self {
            stake_token: Arc::new(Erc20Contract::new(stake_token, provider.clone())),
            nft: Arc::new(Erc721Contract::new(stake_nft, provider.clone())),
            staking: Arc::new(LaunchpadContract::new(launchpad, provider.clone())),
            earn_token: Arc::new(Erc20Contract::new(earn_token, provider)),
        })
    }
}

fn parse_address(name: &str, value: &str) -> ChainResult<Address> {
    value
        .parse()
        .map_err(|e| ChainError::NotAvailable(format!("invalid {} address '{}': {}", name, value, e)))
}

/// Map an alloy contract error, preferring the decoded revert reason.
pub(crate) fn contract_error(call: &'static str, err: alloy::contract::Error) -> ChainError {
    match revert_reason(&err) {
        Some(reason) => ChainError::Reverted(reason),
        None => ChainError::Rpc(format!("{}: {}", call, err)),
    }
}

fn revert_reason(err: &alloy::contract::Error) -> Option<String> {
    if let Some(data) = err.as_revert_data() {
        if let Some(reason) = alloy::sol_types::decode_revert_reason(&data) {
            return Some(reason);
        }
    }
    if let alloy::contract::Error::TransportError(transport) = err {
        let payload = transport.as_error_resp()?;
        let message = payload.message.as_ref();
        if let Some(reason) = message.strip_prefix("execution reverted: ") {
            return Some(reason.to_string());
        }
        if message.starts_with("execution reverted") {
            return Some(message.to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_address_names_the_field() {
        let err = parse_address("launchpad", "0xnope").unwrap_err();
        assert!(err.to_string().contains("invalid launchpad address"));
    }

    #[test]
    fn test_reference_addresses_parse() {
        let config = ContractsConfig::default();
        for value in [
            &config.stake_token,
            &config.stake_nft,
            &config.earn_token,
            &config.launchpad,
        ] {
            assert!(parse_address("contract", value).is_ok());
        }
    }
}
