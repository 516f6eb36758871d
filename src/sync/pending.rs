//! Single-slot guard for in-flight writes.

use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Which write is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionTag {
    MintTokens,
    MintNft,
    StakeTokens,
    UnstakeTokens,
    StakeNft,
    UnstakeNft,
    ClaimRewards,
}

impl ActionTag {
    /// Stable label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionTag::MintTokens => "mint_tokens",
            ActionTag::MintNft => "mint_nft",
            ActionTag::StakeTokens => "stake_tokens",
            ActionTag::UnstakeTokens => "unstake_tokens",
            ActionTag::StakeNft => "stake_nft",
            ActionTag::UnstakeNft => "unstake_nft",
            ActionTag::ClaimRewards => "claim_rewards",
        }
    }
}

impl fmt::Display for ActionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Holds at most one pending action.
///
/// Each acquisition gets a ticket; a guard only clears the slot while it still holds its own
/// ticket, so a forced [`clear`](Self::clear) followed by a new acquisition is never undone
/// by a stale guard.
#[derive(Debug, Default)]
pub struct PendingSlot {
    current: Mutex<Option<(u64, ActionTag)>>,
    next_ticket: AtomicU64,
}

impl PendingSlot {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Take the slot for `tag`, or report the action already holding it.
    pub fn try_acquire(self: &Arc<Self>, tag: ActionTag) -> Result<ActionGuard, ActionTag> {
        let mut current = self.lock();
        if let Some((_, held)) = *current {
            return Err(held);
        }
        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        *current = Some((ticket, tag));
        Ok(ActionGuard {
            slot: Arc::clone(self),
            ticket,
            tag,
        })
    }

    pub fn current(&self) -> Option<ActionTag> {
        let current = *self.lock();
        current.map(|(_, tag)| tag)
    }

    /// Empty the slot regardless of who holds it.
    pub fn clear(&self) {
        *self.lock() = None;
    }

    fn release(&self, ticket: u64) {
        let mut current = self.lock();
        if matches!(*current, Some((held, _)) if held == ticket) {
            *current = None;
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<(u64, ActionTag)>> {
        self.current.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Releases its slot on drop.
#[derive(Debug)]
pub struct ActionGuard {
    slot: Arc<PendingSlot>,
    ticket: u64,
    tag: ActionTag,
}

impl ActionGuard {
    pub fn tag(&self) -> ActionTag {
        self.tag
    }
}

impl Drop for ActionGuard {
    fn drop(&mut self) {
        self.slot.release(self.ticket);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_is_rejected() {
        let slot = PendingSlot::new();
        let guard = slot.try_acquire(ActionTag::StakeTokens).unwrap();
        assert_eq!(guard.tag(), ActionTag::StakeTokens);
        assert_eq!(
            slot.try_acquire(ActionTag::ClaimRewards).unwrap_err(),
            ActionTag::StakeTokens
        );
        drop(guard);
        assert_eq!(slot.current(), None);
        assert!(slot.try_acquire(ActionTag::ClaimRewards).is_ok());
    }

    #[test]
    fn test_stale_guard_does_not_clear_newer_action() {
        let slot = PendingSlot::new();
        let stale = slot.try_acquire(ActionTag::MintNft).unwrap();
        slot.clear();

        let _fresh = slot.try_acquire(ActionTag::ClaimRewards).unwrap();
        drop(stale);
        assert_eq!(slot.current(), Some(ActionTag::ClaimRewards));
    }

    #[test]
    fn test_labels() {
        assert_eq!(ActionTag::UnstakeNft.to_string(), "unstake_nft");
        assert_eq!(
            serde_json::to_value(ActionTag::MintTokens).unwrap(),
            "mint_tokens"
        );
    }
}
