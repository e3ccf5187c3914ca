//! Deduplication Ledger
//!
//! Process-lifetime set of item ids the bot has already acted on. Shared by
//! `Arc` between concurrently running actions; never persisted.

use std::collections::HashSet;
use std::sync::{PoisonError, RwLock};

use crate::model::ItemId;

#[derive(Debug, Default)]
pub struct DedupLedger {
    seen: RwLock<HashSet<ItemId>>,
}

impl DedupLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seen(&self, id: &ItemId) -> bool {
        self.seen
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(id)
    }

    pub fn mark_seen(&self, id: &ItemId) {
        self.seen
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.clone());
    }

    /// Check-and-insert under one lock. Returns `true` if the id was new, in
    /// which case the caller owns it.
    pub fn claim(&self, id: &ItemId) -> bool {
        self.seen
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.clone())
    }

    pub fn len(&self) -> usize {
        self.seen.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_mark_then_seen() {
        let ledger = DedupLedger::new();
        let id = ItemId::from("1789");
        assert!(!ledger.seen(&id));
        ledger.mark_seen(&id);
        assert!(ledger.seen(&id));
        ledger.mark_seen(&id);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_claim_once() {
        let ledger = DedupLedger::new();
        let id = ItemId::from("42");
        assert!(ledger.claim(&id));
        assert!(!ledger.claim(&id));
        assert!(ledger.seen(&id));
    }

    #[test]
    fn test_concurrent_claims_have_single_winner() {
        let ledger = Arc::new(DedupLedger::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ledger = ledger.clone();
                std::thread::spawn(move || (0..100).filter(|i| ledger.claim(&ItemId::new(i.to_string()))).count())
            })
            .collect();

        let wins: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(wins, 100);
        assert_eq!(ledger.len(), 100);
    }
}
