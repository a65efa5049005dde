//! Ledger: per-kind record counts and the pending-deletion set.
//!
//! The ledger is the only state handles touch. It is shared between the
//! manager's pool and every handle through an `Rc`, so handle clones and
//! drops never need the manager and a payload dropped during collection
//! may release further handles without re-entering pool storage.
//!
//! Borrow discipline: `records` is mutably borrowed only by `allocate` and
//! `erase`; `pending` only for the duration of a single insert/remove/take.
//! Neither borrow is held while user code runs.

use crate::registry::ResourceKind;
use crate::tokens::{Count, StrongCount, StrongToken, WeakCount, WeakToken};
use core::cell::{Cell, RefCell};
use hashbrown::HashSet;
use slotmap::{DefaultKey, SlotMap};
use tracing::trace;

#[derive(Debug, Default)]
struct Record {
    strong: StrongCount,
    weak: WeakCount,
    // Mirrors whether the pool slot currently holds a live payload.
    present: Cell<bool>,
    // Set while a constructor for this record is running.
    constructing: Cell<bool>,
}

#[derive(Debug)]
pub struct Ledger {
    kind: ResourceKind,
    records: RefCell<SlotMap<DefaultKey, Record>>,
    pending: RefCell<HashSet<DefaultKey>>,
}

impl Ledger {
    pub(crate) fn new(kind: ResourceKind) -> Self {
        Self {
            kind,
            records: RefCell::new(SlotMap::with_key()),
            pending: RefCell::new(HashSet::new()),
        }
    }

    pub(crate) fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Allocate an empty record with zero counts.
    pub(crate) fn allocate(&self) -> DefaultKey {
        self.records.borrow_mut().insert(Record::default())
    }

    /// Remove a record entirely. Its key is never handed out again.
    pub(crate) fn erase(&self, key: DefaultKey) {
        self.records.borrow_mut().remove(key);
        self.pending.borrow_mut().remove(&key);
    }

    pub(crate) fn counts(&self, key: DefaultKey) -> Option<(usize, usize)> {
        self.records
            .borrow()
            .get(key)
            .map(|r| (r.strong.value(), r.weak.value()))
    }

    pub(crate) fn is_present(&self, key: DefaultKey) -> bool {
        self.records
            .borrow()
            .get(key)
            .is_some_and(|r| r.present.get())
    }

    pub(crate) fn set_present(&self, key: DefaultKey, present: bool) {
        if let Some(r) = self.records.borrow().get(key) {
            r.present.set(present);
        }
    }

    /// Mark a record as running its constructor. Returns false if it
    /// already was, or if the record does not exist.
    pub(crate) fn begin_construct(&self, key: DefaultKey) -> bool {
        match self.records.borrow().get(key) {
            Some(r) if !r.constructing.get() => {
                r.constructing.set(true);
                true
            }
            _ => false,
        }
    }

    pub(crate) fn end_construct(&self, key: DefaultKey) {
        if let Some(r) = self.records.borrow().get(key) {
            r.constructing.set(false);
        }
    }

    pub(crate) fn acquire_strong(&self, key: DefaultKey) -> StrongToken {
        let records = self.records.borrow();
        let record = records
            .get(key)
            .unwrap_or_else(|| panic!("{} record {:?} is not allocated", self.kind, key));
        record.strong.get()
    }

    /// Mint a strong token only if the record still holds its payload.
    pub(crate) fn try_acquire_strong(&self, key: DefaultKey) -> Option<StrongToken> {
        let records = self.records.borrow();
        let record = records.get(key)?;
        record.present.get().then(|| record.strong.get())
    }

    pub(crate) fn release_strong(&self, key: DefaultKey, token: StrongToken) {
        let now_zero = {
            let records = self.records.borrow();
            let Some(record) = records.get(key) else {
                // The token must not panic again in its own Drop.
                core::mem::forget(token);
                if std::thread::panicking() {
                    return;
                }
                panic!("{} record {:?} erased while strongly held", self.kind, key);
            };
            record.strong.put(token)
        };
        if now_zero {
            trace!(kind = %self.kind, ?key, "strong count reached zero");
            self.pending.borrow_mut().insert(key);
        }
    }

    pub(crate) fn acquire_weak(&self, key: DefaultKey) -> WeakToken {
        let records = self.records.borrow();
        let record = records
            .get(key)
            .unwrap_or_else(|| panic!("{} record {:?} is not allocated", self.kind, key));
        record.weak.get()
    }

    pub(crate) fn release_weak(&self, key: DefaultKey, token: WeakToken) {
        let now_zero = {
            let records = self.records.borrow();
            let Some(record) = records.get(key) else {
                core::mem::forget(token);
                if std::thread::panicking() {
                    return;
                }
                panic!("{} record {:?} erased while weakly held", self.kind, key);
            };
            record.weak.put(token)
        };
        if now_zero {
            trace!(kind = %self.kind, ?key, "weak count reached zero");
            self.pending.borrow_mut().insert(key);
        }
    }

    /// Take a record out of the pending set. Returns true if it was pending.
    pub(crate) fn revive(&self, key: DefaultKey) -> bool {
        self.pending.borrow_mut().remove(&key)
    }

    pub(crate) fn is_pending(&self, key: DefaultKey) -> bool {
        self.pending.borrow().contains(&key)
    }

    pub(crate) fn pending_len(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Drain the pending set. Records flagged after this call land in a
    /// fresh set and are seen by the next pass.
    pub(crate) fn take_pending(&self) -> Vec<DefaultKey> {
        let taken = core::mem::take(&mut *self.pending.borrow_mut());
        taken.into_iter().collect()
    }
}
