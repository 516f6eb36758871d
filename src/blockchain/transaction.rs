//! Confirmation monitoring for broadcast transactions.
//!
//! A transaction that outlives the ceiling is still live on-chain; the ceiling only decides
//! how long callers keep showing it as pending.

use alloy::primitives::TxHash;
use std::time::Duration;
use tokio::time::{interval, timeout};

use crate::blockchain::client::ChainClient;
use crate::blockchain::types::{ChainError, ChainResult, ConfirmationStatus};

/// Poll receipts until `tx_hash` has the configured confirmation depth or `ceiling` elapses.
pub async fn wait_for_confirmation(
    client: &ChainClient,
    tx_hash: TxHash,
    poll_interval: Duration,
    ceiling: Duration,
) -> ChainResult<ConfirmationStatus> {
    match timeout(ceiling, poll_until_confirmed(client, tx_hash, poll_interval)).await {
        Ok(status) => status,
        Err(_) => Err(ChainError::ConfirmationTimeout(tx_hash)),
    }
}

async fn poll_until_confirmed(
    client: &ChainClient,
    tx_hash: TxHash,
    poll_interval: Duration,
) -> ChainResult<ConfirmationStatus> {
    let required_confirmations = client.confirmation_blocks();
    let mut ticker = interval(poll_interval);

    loop {
        ticker.tick().await;

        // Once broadcast the transaction is live; only the ceiling ends the wait.
        let receipt = match client.get_transaction_receipt(tx_hash).await {
            Ok(Some(r)) => r,
            Ok(None) => {
                tracing::debug!(tx_hash = %tx_hash, "Transaction pending");
                continue;
            }
            Err(e) => {
                tracing::warn!(tx_hash = %tx_hash, error = %e, "Receipt lookup failed; still waiting");
                continue;
            }
        };

        if !receipt.status() {
            return Ok(ConfirmationStatus::Failed(
                "transaction reverted".to_string(),
            ));
        }

        let current_block = match client.get_block_number().await {
            Ok(block) => block,
            Err(e) => {
                tracing::warn!(tx_hash = %tx_hash, error = %e, "Block number lookup failed; still waiting");
                continue;
            }
        };
        let tx_block = receipt.block_number.unwrap_or(current_block);
        // The inclusion block counts as the first confirmation.
        let confirmations = current_block.saturating_sub(tx_block).saturating_add(1);

        if confirmations >= u64::from(required_confirmations) {
            return Ok(ConfirmationStatus::Confirmed {
                block_number: tx_block,
            });
        }

        tracing::debug!(
            tx_hash = %tx_hash,
            confirmations = confirmations,
            required = required_confirmations,
            "Waiting for confirmations"
        );
    }
}
