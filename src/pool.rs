//! Pool: manager-owned payload storage for one resource kind.
//!
//! Slots are keyed by the same generational keys the kind's ledger hands
//! out. The pool owns every payload; the ledger owns every count. A slot is
//! only ever removed (or its payload reset) by `collect`, and removal always
//! unlinks the slot from the structure before the payload is dropped, so a
//! payload holding handles to other resources can cascade safely.

use crate::ledger::Ledger;
use crate::manager::CollectStats;
use crate::registry::ResourceKind;
use hashbrown::HashMap;
use slotmap::{DefaultKey, SecondaryMap};
use std::rc::Rc;
use tracing::trace;

/// Lifecycle of a record as reported by the manager.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ResourceState {
    /// Allocated, payload not emplaced yet (or its constructor failed).
    Empty,
    /// Payload present and not flagged.
    Active,
    /// Flagged for deletion; the next collection pass decides its fate.
    Pending,
    /// Payload reset while weak handles remained.
    Tombstoned,
}

enum Payload<T> {
    Empty,
    Live(T),
    Tombstoned,
}

struct Slot<T> {
    name: Option<String>,
    payload: Payload<T>,
}

pub struct Pool<T> {
    ledger: Rc<Ledger>,
    slots: SecondaryMap<DefaultKey, Slot<T>>,
    names: HashMap<String, DefaultKey>,
}

impl<T> Pool<T> {
    pub(crate) fn new(kind: ResourceKind) -> Self {
        Self {
            ledger: Rc::new(Ledger::new(kind)),
            slots: SecondaryMap::new(),
            names: HashMap::new(),
        }
    }

    pub(crate) fn ledger(&self) -> &Rc<Ledger> {
        &self.ledger
    }

    pub(crate) fn owns(&self, ledger: &Rc<Ledger>) -> bool {
        Rc::ptr_eq(&self.ledger, ledger)
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn pending_len(&self) -> usize {
        self.ledger.pending_len()
    }

    /// Number of records with at least one strong handle outstanding.
    pub(crate) fn referenced_len(&self) -> usize {
        self.slots
            .keys()
            .filter(|&k| self.ledger.counts(k).is_some_and(|(s, _)| s > 0))
            .count()
    }

    /// Allocate an empty record, entering it into the name index if named.
    pub(crate) fn allocate(&mut self, name: Option<&str>) -> DefaultKey {
        let key = self.ledger.allocate();
        if let Some(name) = name {
            let previous = self.names.insert(name.to_owned(), key);
            debug_assert!(previous.is_none(), "name '{name}' already indexed");
        }
        self.slots.insert(
            key,
            Slot {
                name: name.map(str::to_owned),
                payload: Payload::Empty,
            },
        );
        trace!(kind = %self.ledger.kind(), ?key, asset = ?name, "allocated record");
        key
    }

    pub(crate) fn find_name(&self, name: &str) -> Option<DefaultKey> {
        self.names.get(name).copied()
    }

    pub(crate) fn contains(&self, key: DefaultKey) -> bool {
        self.slots.contains_key(key)
    }

    pub(crate) fn name_of(&self, key: DefaultKey) -> Option<&str> {
        self.slots.get(key).and_then(|s| s.name.as_deref())
    }

    pub(crate) fn is_present(&self, key: DefaultKey) -> bool {
        matches!(
            self.slots.get(key).map(|s| &s.payload),
            Some(Payload::Live(_))
        )
    }

    pub(crate) fn emplace(&mut self, key: DefaultKey, value: T) {
        let slot = self
            .slots
            .get_mut(key)
            .unwrap_or_else(|| panic!("emplace into unallocated {} record", self.ledger.kind()));
        let previous = core::mem::replace(&mut slot.payload, Payload::Live(value));
        debug_assert!(
            !matches!(previous, Payload::Live(_)),
            "emplace over a live payload"
        );
        self.ledger.set_present(key, true);
    }

    pub(crate) fn payload(&self, key: DefaultKey) -> Option<&T> {
        match self.slots.get(key).map(|s| &s.payload) {
            Some(Payload::Live(v)) => Some(v),
            _ => None,
        }
    }

    pub(crate) fn payload_mut(&mut self, key: DefaultKey) -> Option<&mut T> {
        match self.slots.get_mut(key).map(|s| &mut s.payload) {
            Some(Payload::Live(v)) => Some(v),
            _ => None,
        }
    }

    pub(crate) fn state(&self, key: DefaultKey) -> Option<ResourceState> {
        let slot = self.slots.get(key)?;
        if self.ledger.is_pending(key) {
            return Some(ResourceState::Pending);
        }
        Some(match slot.payload {
            Payload::Empty => ResourceState::Empty,
            Payload::Live(_) => ResourceState::Active,
            Payload::Tombstoned => ResourceState::Tombstoned,
        })
    }

    pub(crate) fn take_pending(&self) -> Vec<DefaultKey> {
        self.ledger.take_pending()
    }

    /// Process one batch of pending identities.
    ///
    /// Revived records are skipped; unreferenced ones are erased together
    /// with their name entry; weakly referenced ones keep their slot and
    /// name but lose the payload.
    pub(crate) fn collect(&mut self, batch: Vec<DefaultKey>, stats: &mut CollectStats) {
        let kind = self.ledger.kind();
        for key in batch {
            // Erased earlier in this pass (e.g. flagged twice).
            let Some((strong, weak)) = self.ledger.counts(key) else {
                continue;
            };
            if strong > 0 {
                stats.skipped += 1;
                continue;
            }
            if weak == 0 {
                let slot = self.slots.remove(key);
                self.ledger.erase(key);
                if let Some(name) = slot.as_ref().and_then(|s| s.name.as_deref()) {
                    if self.names.get(name) == Some(&key) {
                        self.names.remove(name);
                    }
                }
                trace!(%kind, ?key, "erased record");
                stats.erased += 1;
                // Unlinked above; dropping the payload may release further handles.
                drop(slot);
            } else {
                let Some(slot) = self.slots.get_mut(key) else {
                    continue;
                };
                let payload = core::mem::replace(&mut slot.payload, Payload::Tombstoned);
                self.ledger.set_present(key, false);
                if matches!(payload, Payload::Live(_)) {
                    trace!(%kind, ?key, weak, "tombstoned record");
                    stats.tombstoned += 1;
                }
                drop(payload);
            }
        }
    }
}

impl<T> Drop for Pool<T> {
    fn drop(&mut self) {
        // Handles may outlive the pool; stop weak handles from locking
        // payloads that are about to go away.
        for key in self.slots.keys() {
            self.ledger.set_present(key, false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(pool: &Pool<String>) -> Vec<DefaultKey> {
        pool.take_pending()
    }

    #[test]
    fn named_allocation_is_indexed() {
        let mut p: Pool<String> = Pool::new(ResourceKind::Script);
        let k = p.allocate(Some("a.lua"));
        assert_eq!(p.find_name("a.lua"), Some(k));
        assert_eq!(p.name_of(k), Some("a.lua"));
        assert_eq!(p.state(k), Some(ResourceState::Empty));

        p.emplace(k, "print()".into());
        assert!(p.is_present(k));
        assert!(p.ledger().is_present(k));
        assert_eq!(p.state(k), Some(ResourceState::Active));
    }

    #[test]
    fn collect_erases_unreferenced_and_drops_name() {
        let mut p: Pool<String> = Pool::new(ResourceKind::Script);
        let k = p.allocate(Some("a.lua"));
        p.emplace(k, "x".into());
        let t = p.ledger().acquire_strong(k);
        p.ledger().release_strong(k, t);
        assert_eq!(p.state(k), Some(ResourceState::Pending));

        let mut stats = CollectStats::default();
        let b = batch(&p);
        p.collect(b, &mut stats);
        assert_eq!(stats.erased, 1);
        assert!(!p.contains(k));
        assert_eq!(p.find_name("a.lua"), None);
        assert_eq!(p.len(), 0);
    }

    #[test]
    fn collect_tombstones_weakly_held() {
        let mut p: Pool<String> = Pool::new(ResourceKind::Script);
        let k = p.allocate(Some("a.lua"));
        p.emplace(k, "x".into());
        let w = p.ledger().acquire_weak(k);
        let t = p.ledger().acquire_strong(k);
        p.ledger().release_strong(k, t);

        let mut stats = CollectStats::default();
        let b = batch(&p);
        p.collect(b, &mut stats);
        assert_eq!(stats.tombstoned, 1);
        assert_eq!(p.state(k), Some(ResourceState::Tombstoned));
        assert!(!p.ledger().is_present(k));
        assert_eq!(p.find_name("a.lua"), Some(k));
        assert_eq!(p.payload(k), None);

        p.ledger().release_weak(k, w);
        let b = batch(&p);
        p.collect(b, &mut stats);
        assert_eq!(stats.erased, 1);
        assert!(!p.contains(k));
        assert_eq!(p.find_name("a.lua"), None);
    }

    #[test]
    fn collect_skips_revived() {
        let mut p: Pool<String> = Pool::new(ResourceKind::Script);
        let k = p.allocate(None);
        p.emplace(k, "x".into());
        let t = p.ledger().acquire_strong(k);
        p.ledger().release_strong(k, t);
        let t = p.ledger().acquire_strong(k);

        let mut stats = CollectStats::default();
        let b = batch(&p);
        p.collect(b, &mut stats);
        assert_eq!(stats.skipped, 1);
        assert_eq!(p.payload(k).map(String::as_str), Some("x"));
        p.ledger().release_strong(k, t);
    }
}
