//! Simulated deposit ledger.
//!
//! Deposits are bookkeeping only: nothing moves on-chain and nothing is held in custody.
//! Amounts are stake-token base units.

use alloy::primitives::{Address, U256};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("amount must be greater than zero")]
    ZeroAmount,

    #[error("insufficient wallet balance: requested {requested}, available {available}")]
    InsufficientBalance { requested: U256, available: U256 },

    #[error("withdrawal exceeds deposit: requested {requested}, deposited {deposited}")]
    ExceedsDeposit { requested: U256, deposited: U256 },

    #[error("ledger file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ledger file is not valid JSON: {0}")]
    Format(#[from] serde_json::Error),
}

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Per-address deposited amounts, optionally backed by a JSON file.
#[derive(Clone, Default)]
pub struct DepositLedger {
    inner: Arc<DashMap<Address, U256>>,
    path: Option<String>,
}

impl DepositLedger {
    pub fn new(path: Option<String>) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            path,
        }
    }

    /// Open the ledger at `path`, starting empty when the file does not exist yet.
    pub fn open(path: &str) -> LedgerResult<Self> {
        let ledger = Self::new(Some(path.to_string()));
        if Path::new(path).exists() {
            let reader = BufReader::new(File::open(path)?);
            let entries: HashMap<Address, U256> = serde_json::from_reader(reader)?;
            for (address, amount) in entries {
                ledger.inner.insert(address, amount);
            }
            tracing::info!(entries = ledger.inner.len(), path, "Loaded deposit ledger");
        }
        Ok(ledger)
    }

    pub fn save(&self) -> LedgerResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let entries: HashMap<Address, U256> = self
            .inner
            .iter()
            .map(|entry| (*entry.key(), *entry.value()))
            .collect();
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, &entries)?;
        tracing::debug!(entries = entries.len(), path, "Saved deposit ledger");
        Ok(())
    }

    pub fn deposited(&self, account: &Address) -> U256 {
        self.inner.get(account).map(|r| *r.value()).unwrap_or_default()
    }

    /// Record a deposit of `amount`, bounded by the account's current `wallet_balance`.
    /// Returns the new deposited total.
    pub fn deposit(
        &self,
        account: Address,
        amount: U256,
        wallet_balance: U256,
    ) -> LedgerResult<U256> {
        if amount.is_zero() {
            return Err(LedgerError::ZeroAmount);
        }
        if amount > wallet_balance {
            return Err(LedgerError::InsufficientBalance {
                requested: amount,
                available: wallet_balance,
            });
        }

        let total = {
            let mut entry = self.inner.entry(account).or_insert(U256::ZERO);
            *entry = entry.saturating_add(amount);
            *entry
        };
        tracing::info!(%account, %amount, %total, "Deposit recorded");
        self.save()?;
        Ok(total)
    }

    /// Record a withdrawal. Returns the remaining deposited total.
    pub fn withdraw(&self, account: Address, amount: U256) -> LedgerResult<U256> {
        if amount.is_zero() {
            return Err(LedgerError::ZeroAmount);
        }

        let remaining = match self.inner.entry(account) {
            Entry::Occupied(mut entry) if *entry.get() >= amount => {
                let remaining = *entry.get() - amount;
                if remaining.is_zero() {
                    entry.remove();
                } else {
                    entry.insert(remaining);
                }
                remaining
            }
            Entry::Occupied(entry) => {
                return Err(LedgerError::ExceedsDeposit {
                    requested: amount,
                    deposited: *entry.get(),
                })
            }
            Entry::Vacant(_) => {
                return Err(LedgerError::ExceedsDeposit {
                    requested: amount,
                    deposited: U256::ZERO,
                })
            }
        };
        tracing::info!(%account, %amount, %remaining, "Withdrawal recorded");
        self.save()?;
        Ok(remaining)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl std::fmt::Debug for DepositLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DepositLedger")
            .field("entries", &self.inner.len())
            .field("path", &self.path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deposit_bounded_by_wallet_balance() {
        let ledger = DepositLedger::new(None);
        let user = Address::repeat_byte(1);

        assert_eq!(
            ledger.deposit(user, U256::from(40u64), U256::from(50u64)).unwrap(),
            U256::from(40u64)
        );
        assert!(matches!(
            ledger.deposit(user, U256::from(51u64), U256::from(50u64)),
            Err(LedgerError::InsufficientBalance { .. })
        ));
        assert_eq!(ledger.deposited(&user), U256::from(40u64));
    }

    #[test]
    fn test_withdraw_bounded_by_deposit() {
        let ledger = DepositLedger::new(None);
        let user = Address::repeat_byte(2);

        assert!(matches!(
            ledger.withdraw(user, U256::from(1u64)),
            Err(LedgerError::ExceedsDeposit { deposited, .. }) if deposited.is_zero()
        ));

        ledger.deposit(user, U256::from(10u64), U256::from(10u64)).unwrap();
        assert!(matches!(
            ledger.withdraw(user, U256::from(11u64)),
            Err(LedgerError::ExceedsDeposit { .. })
        ));
        assert_eq!(ledger.withdraw(user, U256::from(4u64)).unwrap(), U256::from(6u64));
        assert_eq!(ledger.withdraw(user, U256::from(6u64)).unwrap(), U256::ZERO);
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_zero_amounts_rejected() {
        let ledger = DepositLedger::new(None);
        let user = Address::repeat_byte(3);
        assert!(matches!(
            ledger.deposit(user, U256::ZERO, U256::from(1u64)),
            Err(LedgerError::ZeroAmount)
        ));
        assert!(matches!(ledger.withdraw(user, U256::ZERO), Err(LedgerError::ZeroAmount)));
    }

    #[test]
    fn test_persistence() {
        let path = std::env::temp_dir().join(format!("dapp_sync_ledger_{}.json", std::process::id()));
        let path = path.to_string_lossy().to_string();
        let user = Address::repeat_byte(4);

        let ledger = DepositLedger::new(Some(path.clone()));
        ledger.deposit(user, U256::from(25u64), U256::from(100u64)).unwrap();

        let reopened = DepositLedger::open(&path).unwrap();
        assert_eq!(reopened.deposited(&user), U256::from(25u64));

        std::fs::remove_file(&path).unwrap_or_default();
    }
}
