//! Staking contract handle over the generated `LaunchpadStaking` bindings.

use alloy::primitives::{Address, TxHash, U256};
use alloy::providers::DynProvider;
use async_trait::async_trait;

use super::bindings::LaunchpadStaking::{self, LaunchpadStakingInstance};
use super::{contract_error, StakerInfo, StakingActions, StakingView};
use crate::blockchain::types::ChainResult;

#[derive(Clone)]
pub struct LaunchpadContract {
    inner: LaunchpadStakingInstance<DynProvider>,
}

impl LaunchpadContract {
    pub fn new(address: Address, provider: DynProvider) -> Self {
        Self {
            inner: LaunchpadStaking::new(address, provider),
        }
    }
}

impl From<LaunchpadStaking::UserInfo> for StakerInfo {
    fn from(info: LaunchpadStaking::UserInfo) -> Self {
        Self {
            staked_tokens: info.stakedTokens,
            staked_nfts: info.stakedNFTs,
            weight: info.weight,
            rewards: info.rewards,
            reward_per_weight_paid: info.rewardPerWeightPaid,
            claimed: info.claimed,
        }
    }
}

#[async_trait]
impl StakingView for LaunchpadContract {
    fn address(&self) -> Address {
        *self.inner.address()
    }

    async fn user_info(&self, user: Address) -> ChainResult<StakerInfo> {
        let info = self
            .inner
            .getUserInfo(user)
            .call()
            .await
            .map_err(|e| contract_error("getUserInfo", e))?;
        Ok(info.into())
    }

    async fn pending_rewards(&self, user: Address) -> ChainResult<U256> {
        self.inner
            .pendingRewards(user)
            .call()
            .await
            .map_err(|e| contract_error("pendingRewards", e))
    }

    async fn total_earned(&self, user: Address) -> ChainResult<U256> {
        self.inner
            .totalEarned(user)
            .call()
            .await
            .map_err(|e| contract_error("totalEarned", e))
    }

    async fn total_claimed(&self, user: Address) -> ChainResult<U256> {
        self.inner
            .totalClaimed(user)
            .call()
            .await
            .map_err(|e| contract_error("totalClaimed", e))
    }

    async fn staked_nft_ids(&self, user: Address) -> ChainResult<Vec<U256>> {
        self.inner
            .stakedNFTs(user)
            .call()
            .await
            .map_err(|e| contract_error("stakedNFTs", e))
    }

    async fn total_weight(&self) -> ChainResult<U256> {
        self.inner
            .totalWeight()
            .call()
            .await
            .map_err(|e| contract_error("totalWeight", e))
    }

    async fn daily_reward(&self) -> ChainResult<U256> {
        self.inner
            .DAILY_REWARD()
            .call()
            .await
            .map_err(|e| contract_error("DAILY_REWARD", e))
    }

    async fn total_rewards_accrued(&self) -> ChainResult<U256> {
        self.inner
            .totalRewardsAccrued()
            .call()
            .await
            .map_err(|e| contract_error("totalRewardsAccrued", e))
    }

    async fn total_rewards_claimed(&self) -> ChainResult<U256> {
        self.inner
            .totalRewardsClaimed()
            .call()
            .await
            .map_err(|e| contract_error("totalRewardsClaimed", e))
    }

    async fn total_rewards_pending(&self) -> ChainResult<U256> {
        self.inner
            .totalRewardsPending()
            .call()
            .await
            .map_err(|e| contract_error("totalRewardsPending", e))
    }
}

#[async_trait]
impl StakingActions for LaunchpadContract {
    async fn stake_tokens(&self, amount: U256) -> ChainResult<TxHash> {
        let pending = self
            .inner
            .stakeTokens(amount)
            .send()
            .await
            .map_err(|e| contract_error("stakeTokens", e))?;
        Ok(*pending.tx_hash())
    }

    async fn unstake_tokens(&self, amount: U256) -> ChainResult<TxHash> {
        let pending = self
            .inner
            .unstakeTokens(amount)
            .send()
            .await
            .map_err(|e| contract_error("unstakeTokens", e))?;
        Ok(*pending.tx_hash())
    }

    async fn stake_nft(&self, token_id: U256) -> ChainResult<TxHash> {
        let pending = self
            .inner
            .stakeNFT(token_id)
            .send()
            .await
            .map_err(|e| contract_error("stakeNFT", e))?;
        Ok(*pending.tx_hash())
    }

    async fn unstake_nft(&self, token_id: U256) -> ChainResult<TxHash> {
        let pending = self
            .inner
            .unstakeNFT(token_id)
            .send()
            .await
            .map_err(|e| contract_error("unstakeNFT", e))?;
        Ok(*pending.tx_hash())
    }

    async fn claim(&self) -> ChainResult<TxHash> {
        let pending = self
            .inner
            .claim()
            .send()
            .await
            .map_err(|e| contract_error("claim", e))?;
        tracing::debug!(tx_hash = %pending.tx_hash(), "Reward claim broadcast");
        Ok(*pending.tx_hash())
    }
}

impl std::fmt::Debug for LaunchpadContract {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LaunchpadContract")
            .field("address", &StakingView::address(self))
            .finish()
    }
}
