//! ERC-721 handle over the generated `StakeNft` bindings.

use alloy::primitives::{Address, TxHash, U256};
use alloy::providers::DynProvider;
use async_trait::async_trait;

use super::bindings::StakeNft::{self, StakeNftInstance};
use super::{contract_error, NonFungibleAssetActions, NonFungibleAssetView};
use crate::blockchain::types::ChainResult;

#[derive(Clone)]
pub struct Erc721Contract {
    inner: StakeNftInstance<DynProvider>,
}

impl Erc721Contract {
    pub fn new(address: Address, provider: DynProvider) -> Self {
        Self {
            inner: StakeNft::new(address, provider),
        }
    }

    pub fn address(&self) -> Address {
        *self.inner.address()
    }
}

#[async_trait]
impl NonFungibleAssetView for Erc721Contract {
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

    async fn balance_of(&self, owner: Address) -> ChainResult<U256> {
        self.inner
            .balanceOf(owner)
            .call()
            .await
            .map_err(|e| contract_error("balanceOf", e))
    }

    async fn owner_of(&self, token_id: U256) -> ChainResult<Address> {
        self.inner
            .ownerOf(token_id)
            .call()
            .await
            .map_err(|e| contract_error("ownerOf", e))
    }

    async fn total_supply(&self) -> ChainResult<U256> {
        self.inner
            .totalSupply()
            .call()
            .await
            .map_err(|e| contract_error("totalSupply", e))
    }

    async fn token_uri(&self, token_id: U256) -> ChainResult<String> {
        self.inner
            .tokenURI(token_id)
            .call()
            .await
            .map_err(|e| contract_error("tokenURI", e))
    }

    async fn is_approved_for_all(&self, owner: Address, operator: Address) -> ChainResult<bool> {
        self.inner
            .isApprovedForAll(owner, operator)
            .call()
            .await
            .map_err(|e| contract_error("isApprovedForAll", e))
    }
}

#[async_trait]
impl NonFungibleAssetActions for Erc721Contract {
    async fn mint(&self, quantity: u32) -> ChainResult<TxHash> {
        let pending = self
            .inner
            .mint(U256::from(quantity))
            .send()
            .await
            .map_err(|e| contract_error("mint", e))?;
        tracing::debug!(tx_hash = %pending.tx_hash(), quantity, "NFT mint broadcast");
        Ok(*pending.tx_hash())
    }

    async fn approve(&self, to: Address, token_id: U256) -> ChainResult<TxHash> {
        let pending = self
            .inner
            .approve(to, token_id)
            .send()
            .await
            .map_err(|e| contract_error("approve", e))?;
        Ok(*pending.tx_hash())
    }

    async fn set_approval_for_all(
        &self,
        operator: Address,
        approved: bool,
    ) -> ChainResult<TxHash> {
        let pending = self
            .inner
            .setApprovalForAll(operator, approved)
            .send()
            .await
            .map_err(|e| contract_error("setApprovalForAll", e))?;
        tracing::debug!(tx_hash = %pending.tx_hash(), %operator, approved, "NFT operator approval broadcast");
        Ok(*pending.tx_hash())
    }
}

impl std::fmt::Debug for Erc721Contract {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Erc721Contract")
            .field("address", &self.address())
            .finish()
    }
}
