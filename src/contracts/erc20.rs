//! ERC-20 handle over the generated `StakeToken` bindings.

use alloy::primitives::{Address, TxHash, U256};
use alloy::providers::DynProvider;
use async_trait::async_trait;

use super::bindings::StakeToken::{self, StakeTokenInstance};
use super::{contract_error, FungibleAssetActions, FungibleAssetView};
use crate::blockchain::types::ChainResult;

/// A fungible token at a fixed address.
#[derive(Clone)]
pub struct Erc20Contract {
    inner: StakeTokenInstance<DynProvider>,
}

impl Erc20Contract {
    pub fn new(address: Address, provider: DynProvider) -> Self {
        Self {
            inner: StakeToken::new(address, provider),
        }
    }

    pub fn address(&self) -> Address {
        *self.inner.address()
    }
}

#[async_trait]
impl FungibleAssetView for Erc20Contract {
    async fn name(&self) -> ChainResult<String> {
        self.inner
            .name()
            .call()
            .await
            .map_err(|e| contract_error("name", e))
    }

    async fn symbol(&self) -> ChainResult<String> {
        self.inner
            .symbol()
            .call()
            .await
            .map_err(|e| contract_error("symbol", e))
    }

    async fn decimals(&self) -> ChainResult<u8> {
        self.inner
            .decimals()
            .call()
            .await
            .map_err(|e| contract_error("decimals", e))
    }

    async fn balance_of(&self, account: Address) -> ChainResult<U256> {
        self.inner
            .balanceOf(account)
            .call()
            .await
            .map_err(|e| contract_error("balanceOf", e))
    }

    async fn allowance(&self, owner: Address, spender: Address) -> ChainResult<U256> {
        self.inner
            .allowance(owner, spender)
            .call()
            .await
            .map_err(|e| contract_error("allowance", e))
    }

    async fn owner(&self) -> ChainResult<Address> {
        self.inner
            .owner()
            .call()
            .await
            .map_err(|e| contract_error("owner", e))
    }

    async fn total_supply(&self) -> ChainResult<U256> {
        self.inner
            .totalSupply()
            .call()
            .await
            .map_err(|e| contract_error("totalSupply", e))
    }

    async fn max_supply(&self) -> ChainResult<U256> {
        self.inner
            .MAX_SUPPLY()
            .call()
            .await
            .map_err(|e| contract_error("MAX_SUPPLY", e))
    }
}

#[async_trait]
impl FungibleAssetActions for Erc20Contract {
    async fn approve(&self, spender: Address, amount: U256) -> ChainResult<TxHash> {
        let pending = self
            .inner
            .approve(spender, amount)
            .send()
            .await
            .map_err(|e| contract_error("approve", e))?;
        tracing::debug!(tx_hash = %pending.tx_hash(), %spender, "Token approval broadcast");
        Ok(*pending.tx_hash())
    }

    async fn mint(&self) -> ChainResult<TxHash> {
        let pending = self
            .inner
            .mint100()
            .send()
            .await
            .map_err(|e| contract_error("mint100", e))?;
        tracing::debug!(tx_hash = %pending.tx_hash(), "Token mint broadcast");
        Ok(*pending.tx_hash())
    }
}

impl std::fmt::Debug for Erc20Contract {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Erc20Contract")
            .field("address", &self.address())
            .finish()
    }
}
