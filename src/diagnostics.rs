//! Network reachability and transaction status checks.

use alloy::consensus::Transaction as _;
use alloy::network::TransactionResponse;
use alloy::primitives::{Address, TxHash, U256};
use serde::Serialize;

use crate::blockchain::client::ChainClient;
use crate::blockchain::types::{ChainId, ChainResult};
use crate::sync::snapshot::format_amount;

#[derive(Debug, Clone, Serialize)]
pub struct NetworkReport {
    pub chain_id: ChainId,
    pub block_number: u64,
    pub account: Address,
    pub balance_wei: U256,
    pub balance: String,
    /// Whether the account can pay for gas at all.
    pub funded: bool,
}

/// Check that the RPC answers and that `account` holds native currency.
pub async fn check_network(client: &ChainClient, account: Address) -> ChainResult<NetworkReport> {
    let (chain_id, block_number, balance) = tokio::try_join!(
        client.get_chain_id(),
        client.get_block_number(),
        client.get_balance(account),
    )?;

    let funded = !balance.is_zero();
    if funded {
        tracing::info!(%chain_id, block_number, %account, "Network reachable");
    } else {
        tracing::warn!(%chain_id, %account, "Account has no native balance; fund it before sending transactions");
    }

    Ok(NetworkReport {
        chain_id,
        block_number,
        account,
        balance_wei: balance,
        balance: format_amount(balance, 18),
        funded,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TransactionReport {
    Confirmed {
        block_number: u64,
        confirmations: u64,
        success: bool,
        gas_used: u64,
        /// Set for contract deployments.
        contract_address: Option<Address>,
    },
    Pending {
        nonce: u64,
        from: Address,
        /// `None` for contract deployments.
        to: Option<Address>,
        value: String,
        gas_limit: u64,
        current_block: u64,
    },
    /// Unknown to the node: wrong hash, wrong network, or dropped from the mempool.
    NotFound,
}

/// Queued transactions of the sender, which delay anything it sends next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NonceGap {
    pub latest: u64,
    pub pending: u64,
}

impl NonceGap {
    pub fn queued(&self) -> u64 {
        self.pending.saturating_sub(self.latest)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionCheck {
    pub tx_hash: TxHash,
    pub report: TransactionReport,
    pub nonce_gap: Option<NonceGap>,
}

pub async fn check_transaction(client: &ChainClient, tx_hash: TxHash) -> ChainResult<TransactionCheck> {
    let (receipt, transaction) = tokio::try_join!(
        client.get_transaction_receipt(tx_hash),
        client.get_transaction(tx_hash),
    )?;

    let report = match (receipt, &transaction) {
        (Some(receipt), _) => {
            let current = client.get_block_number().await?;
            let block_number = receipt.block_number.unwrap_or(current);
            TransactionReport::Confirmed {
                block_number,
                confirmations: current.saturating_sub(block_number) + 1,
                success: receipt.status(),
                gas_used: receipt.gas_used,
                contract_address: receipt.contract_address,
            }
        }
        (None, Some(tx)) => TransactionReport::Pending {
            nonce: tx.nonce(),
            from: TransactionResponse::from(tx),
            to: tx.to(),
            value: format_amount(tx.value(), 18),
            gas_limit: tx.gas_limit(),
            current_block: client.get_block_number().await?,
        },
        (None, None) => TransactionReport::NotFound,
    };

    let nonce_gap = match &transaction {
        Some(tx) => {
            let sender = TransactionResponse::from(tx);
            let (latest, pending) = tokio::try_join!(
                client.get_transaction_count(sender),
                client.get_pending_transaction_count(sender),
            )?;
            let gap = NonceGap { latest, pending };
            if gap.queued() > 0 {
                tracing::warn!(%sender, queued = gap.queued(), "Sender has queued transactions");
                Some(gap)
            } else {
                None
            }
        }
        None => None,
    };

    tracing::info!(%tx_hash, report = ?report, "Transaction checked");
    Ok(TransactionCheck {
        tx_hash,
        report,
        nonce_gap,
    })
}
