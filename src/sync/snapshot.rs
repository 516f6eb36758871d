//! Immutable reflection of on-chain positions for one account.

use alloy::primitives::utils::{format_units, parse_units};
use alloy::primitives::{Address, U256};
use serde::Serialize;
use std::time::SystemTime;

use super::error::SyncError;

/// Weight one staked NFT contributes.
pub const NFT_WEIGHT: u64 = 300;

/// Decimals of staking weights and reward amounts.
pub const REWARD_DECIMALS: u8 = 18;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPosition {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub balance: U256,
    pub owner: Option<Address>,
}

impl Default for TokenPosition {
    fn default() -> Self {
        Self {
            name: String::new(),
            symbol: String::new(),
            decimals: 18,
            balance: U256::ZERO,
            owner: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NftPosition {
    pub name: String,
    pub symbol: String,
    pub balance: U256,
    pub owned_ids: Vec<U256>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StakingPosition {
    pub staked_tokens: U256,
    pub staked_nfts: U256,
    pub weight: U256,
    pub pending_rewards: U256,
    pub total_earned: U256,
    pub total_claimed: U256,
    pub staked_nft_ids: Vec<U256>,
    pub total_weight: U256,
    pub daily_reward: U256,
}

impl StakingPosition {
    /// This account's share of the daily emission.
    pub fn estimated_daily_reward(&self) -> U256 {
        if self.total_weight.is_zero() {
            return U256::ZERO;
        }
        self.weight.saturating_mul(self.daily_reward) / self.total_weight
    }

    pub fn nft_weight(&self) -> U256 {
        self.staked_nfts.saturating_mul(U256::from(NFT_WEIGHT))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MiningProgress {
    pub total_accrued: U256,
    pub total_claimed: U256,
    pub total_pending: U256,
    pub max_supply: U256,
}

impl MiningProgress {
    /// Accrued share of the supply cap, in percent with two decimals.
    pub fn progress_percent(&self) -> f64 {
        if self.max_supply.is_zero() {
            return 0.0;
        }
        let basis_points = self.total_accrued.saturating_mul(U256::from(10_000u64)) / self.max_supply;
        basis_points.saturating_to::<u64>() as f64 / 100.0
    }
}

/// Everything read for one account in one refresh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssetSnapshot {
    /// Account the values were read for; `None` for the zero snapshot.
    pub account: Option<Address>,
    pub token: TokenPosition,
    pub nft: NftPosition,
    pub staking: StakingPosition,
    pub mining: MiningProgress,
    pub refreshed_at: Option<SystemTime>,
}

impl AssetSnapshot {
    /// Zero values, as shown while disconnected.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_token_owner(&self) -> bool {
        self.account.is_some() && self.token.owner == self.account
    }

    /// Human-readable rendering of every field.
    pub fn report(&self) -> SnapshotReport {
        let decimals = self.token.decimals;
        SnapshotReport {
            account: self.account,
            token: TokenReport {
                name: self.token.name.clone(),
                symbol: self.token.symbol.clone(),
                decimals,
                balance: format_amount(self.token.balance, decimals),
                is_owner: self.is_token_owner(),
            },
            nft: NftReport {
                name: self.nft.name.clone(),
                symbol: self.nft.symbol.clone(),
                balance: self.nft.balance.to_string(),
                owned_ids: self.nft.owned_ids.iter().map(U256::to_string).collect(),
            },
            staking: StakingReport {
                staked_tokens: format_amount(self.staking.staked_tokens, decimals),
                staked_nfts: self.staking.staked_nfts.to_string(),
                staked_nft_ids: self
                    .staking
                    .staked_nft_ids
                    .iter()
                    .map(U256::to_string)
                    .collect(),
                nft_weight: self.staking.nft_weight().to_string(),
                weight: format_amount(self.staking.weight, REWARD_DECIMALS),
                total_weight: format_amount(self.staking.total_weight, REWARD_DECIMALS),
                pending_rewards: format_amount(self.staking.pending_rewards, REWARD_DECIMALS),
                total_earned: format_amount(self.staking.total_earned, REWARD_DECIMALS),
                total_claimed: format_amount(self.staking.total_claimed, REWARD_DECIMALS),
                daily_reward: format_amount(self.staking.daily_reward, REWARD_DECIMALS),
                estimated_daily_reward: format_amount(
                    self.staking.estimated_daily_reward(),
                    REWARD_DECIMALS,
                ),
            },
            mining: MiningReport {
                total_accrued: format_amount(self.mining.total_accrued, REWARD_DECIMALS),
                total_claimed: format_amount(self.mining.total_claimed, REWARD_DECIMALS),
                total_pending: format_amount(self.mining.total_pending, REWARD_DECIMALS),
                max_supply: format_amount(self.mining.max_supply, REWARD_DECIMALS),
                progress_percent: self.mining.progress_percent(),
            },
            refreshed_at: self
                .refreshed_at
                .and_then(|t| t.duration_since(SystemTime::UNIX_EPOCH).ok())
                .map(|d| d.as_secs()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SnapshotReport {
    pub account: Option<Address>,
    pub token: TokenReport,
    pub nft: NftReport,
    pub staking: StakingReport,
    pub mining: MiningReport,
    /// Unix seconds.
    pub refreshed_at: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenReport {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub balance: String,
    pub is_owner: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct NftReport {
    pub name: String,
    pub symbol: String,
    pub balance: String,
    pub owned_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StakingReport {
    pub staked_tokens: String,
    pub staked_nfts: String,
    pub staked_nft_ids: Vec<String>,
    pub nft_weight: String,
    pub weight: String,
    pub total_weight: String,
    pub pending_rewards: String,
    pub total_earned: String,
    pub total_claimed: String,
    pub daily_reward: String,
    pub estimated_daily_reward: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MiningReport {
    pub total_accrued: String,
    pub total_claimed: String,
    pub total_pending: String,
    pub max_supply: String,
    pub progress_percent: f64,
}

/// Render `value` scaled by `decimals`, keeping at least one fractional digit (`10.0`, `0.5`).
pub fn format_amount(value: U256, decimals: u8) -> String {
    let raw = format_units(value, decimals).unwrap_or_else(|_| value.to_string());
    match raw.split_once('.') {
        Some((whole, fraction)) => {
            let fraction = fraction.trim_end_matches('0');
            if fraction.is_empty() {
                format!("{}.0", whole)
            } else {
                format!("{}.{}", whole, fraction)
            }
        }
        None => format!("{}.0", raw),
    }
}

/// Parse a positive decimal amount into base units.
pub fn parse_amount(input: &str, decimals: u8) -> Result<U256, SyncError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(SyncError::InvalidInput("amount is required".to_string()));
    }
    if input.starts_with('-') {
        return Err(SyncError::InvalidInput("amount must be positive".to_string()));
    }
    let amount = parse_units(input, decimals)
        .map_err(|e| SyncError::InvalidInput(format!("'{}' is not a valid amount: {}", input, e)))?
        .get_absolute();
    if amount.is_zero() {
        return Err(SyncError::InvalidInput(
            "amount must be greater than zero".to_string(),
        ));
    }
    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ether(n: u64) -> U256 {
        U256::from(n) * U256::from(10u64).pow(U256::from(18u64))
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(ether(10), 18), "10.0");
        assert_eq!(format_amount(ether(1) / U256::from(2u64), 18), "0.5");
        assert_eq!(format_amount(U256::ZERO, 18), "0.0");
        assert_eq!(format_amount(U256::from(7u64), 0), "7.0");
        assert_eq!(format_amount(U256::from(1_234_500u64), 6), "1.2345");
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("10", 18).unwrap(), ether(10));
        assert_eq!(parse_amount(" 0.5 ", 18).unwrap(), ether(1) / U256::from(2u64));
        assert_eq!(parse_amount("3", 0).unwrap(), U256::from(3u64));
    }

    #[test]
    fn test_parse_amount_rejects_bad_input() {
        for input in ["", "   ", "0", "0.0", "-1", "abc"] {
            assert!(
                matches!(parse_amount(input, 18), Err(SyncError::InvalidInput(_))),
                "accepted {:?}",
                input
            );
        }
    }

    #[test]
    fn test_estimated_daily_reward() {
        let staking = StakingPosition {
            weight: ether(100),
            total_weight: ether(400),
            daily_reward: ether(1000),
            ..Default::default()
        };
        assert_eq!(staking.estimated_daily_reward(), ether(250));

        let empty_pool = StakingPosition {
            weight: ether(100),
            daily_reward: ether(1000),
            ..Default::default()
        };
        assert_eq!(empty_pool.estimated_daily_reward(), U256::ZERO);
    }

    #[test]
    fn test_nft_weight() {
        let staking = StakingPosition {
            staked_nfts: U256::from(3u64),
            ..Default::default()
        };
        assert_eq!(staking.nft_weight(), U256::from(900u64));
    }

    #[test]
    fn test_progress_percent() {
        let mining = MiningProgress {
            total_accrued: ether(1234),
            max_supply: ether(10_000),
            ..Default::default()
        };
        assert!((mining.progress_percent() - 12.34).abs() < f64::EPSILON);
        assert_eq!(MiningProgress::default().progress_percent(), 0.0);
    }

    #[test]
    fn test_token_ownership() {
        let owner = Address::repeat_byte(7);
        let mut snapshot = AssetSnapshot {
            account: Some(owner),
            ..Default::default()
        };
        assert!(!snapshot.is_token_owner());

        snapshot.token.owner = Some(owner);
        assert!(snapshot.is_token_owner());
        assert!(!AssetSnapshot::empty().is_token_owner());
    }

    #[test]
    fn test_empty_snapshot_defaults() {
        let snapshot = AssetSnapshot::empty();
        assert_eq!(snapshot.token.decimals, 18);
        assert!(snapshot.refreshed_at.is_none());
        let report = snapshot.report();
        assert_eq!(report.token.balance, "0.0");
        assert_eq!(report.mining.progress_percent, 0.0);
    }
}
