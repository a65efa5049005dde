use crate::ledger::Ledger;
use crate::registry::Resource;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::marker::PhantomData;
use slotmap::{DefaultKey, Key};
use std::rc::Rc;

/// Stable identity of one record within its kind.
///
/// Backed by the record's generational slot key: equal iff both ids were
/// taken from the same record, valid for the record's whole life (including
/// while tombstoned) and never reused once the record is erased. An id grants
/// no access; resolve it through the manager.
///
/// Ids also carry the address of the issuing manager's bookkeeping, so an id
/// from one manager never matches a record of another live manager.
pub struct ResourceId<T> {
    key: DefaultKey,
    owner: usize,
    _kind: PhantomData<fn() -> T>,
}

impl<T> ResourceId<T> {
    pub(crate) fn new(ledger: &Rc<Ledger>, key: DefaultKey) -> Self {
        Self {
            key,
            owner: Rc::as_ptr(ledger) as usize,
            _kind: PhantomData,
        }
    }

    /// The null id; never equal to the id of any record.
    pub fn null() -> Self {
        Self {
            key: DefaultKey::null(),
            owner: 0,
            _kind: PhantomData,
        }
    }

    pub fn is_null(&self) -> bool {
        self.key.is_null()
    }

    pub(crate) fn key(&self) -> DefaultKey {
        self.key
    }

    /// True if this id was issued against `ledger`.
    pub(crate) fn issued_by(&self, ledger: &Rc<Ledger>) -> bool {
        self.owner == Rc::as_ptr(ledger) as usize
    }
}

impl<T> Default for ResourceId<T> {
    fn default() -> Self {
        Self::null()
    }
}

impl<T> Clone for ResourceId<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ResourceId<T> {}

impl<T> PartialEq for ResourceId<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.owner == other.owner
    }
}

impl<T> Eq for ResourceId<T> {}

impl<T> Hash for ResourceId<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
        self.owner.hash(state);
    }
}

impl<T: Resource> fmt::Debug for ResourceId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResourceId<{}>({:?})", T::KIND, self.key.data())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinds::Texture;
    use crate::registry::ResourceKind;

    #[test]
    fn null_is_default_and_distinct() {
        let l = Rc::new(Ledger::new(ResourceKind::Texture));
        let k = l.allocate();
        let id = ResourceId::<Texture>::new(&l, k);
        assert!(ResourceId::<Texture>::default().is_null());
        assert!(!id.is_null());
        assert_ne!(id, ResourceId::null());
        assert_eq!(id, ResourceId::new(&l, k));
        assert!(id.issued_by(&l));
    }

    #[test]
    fn same_slot_in_other_ledger_is_a_different_id() {
        let a = Rc::new(Ledger::new(ResourceKind::Texture));
        let b = Rc::new(Ledger::new(ResourceKind::Texture));
        let (ka, kb) = (a.allocate(), b.allocate());
        assert_eq!(ka, kb);
        let ia = ResourceId::<Texture>::new(&a, ka);
        let ib = ResourceId::<Texture>::new(&b, kb);
        assert_ne!(ia, ib);
        assert!(!ia.issued_by(&b));
    }
}
