//! Weak handles: observe a record without keeping its payload alive.

use crate::handle::{Access, Const, Mut, Strong};
use crate::id::ResourceId;
use crate::ledger::Ledger;
use crate::registry::Resource;
use crate::tokens::WeakToken;
use core::fmt;
use core::marker::PhantomData;
use core::mem::ManuallyDrop;
use slotmap::DefaultKey;
use std::rc::Rc;

/// Counted reference that keeps a record (but not its payload) alive.
///
/// After the last strong handle goes away and a collection pass runs, the
/// payload is reset and `lock` returns `None`. The record itself survives
/// until the last weak handle is dropped and the next pass erases it.
pub struct Weak<T: Resource, A: Access = Const> {
    ledger: Rc<Ledger>,
    key: DefaultKey,
    token: ManuallyDrop<WeakToken>,
    _marker: PhantomData<(fn() -> T, A)>,
}

pub type WeakHandle<T> = Weak<T, Const>;
pub type WeakHandleMut<T> = Weak<T, Mut>;

impl<T: Resource, A: Access> Weak<T, A> {
    pub(crate) fn acquire(ledger: &Rc<Ledger>, key: DefaultKey) -> Self {
        let token = ledger.acquire_weak(key);
        Self {
            ledger: ledger.clone(),
            key,
            token: ManuallyDrop::new(token),
            _marker: PhantomData,
        }
    }

    pub fn id(&self) -> ResourceId<T> {
        ResourceId::new(&self.ledger, self.key)
    }

    /// Obtain a strong handle if the payload is still present.
    pub fn lock(&self) -> Option<Strong<T, A>> {
        let token = self.ledger.try_acquire_strong(self.key)?;
        Some(Strong::from_token(self.ledger.clone(), self.key, token))
    }

    /// True while the payload is present, i.e. `lock` would succeed.
    pub fn is_alive(&self) -> bool {
        self.ledger.is_present(self.key)
    }

    pub fn strong_count(&self) -> usize {
        self.ledger.counts(self.key).map_or(0, |(s, _)| s)
    }

    pub fn weak_count(&self) -> usize {
        self.ledger.counts(self.key).map_or(0, |(_, w)| w)
    }

    pub(crate) fn same_resource(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.ledger, &other.ledger) && self.key == other.key
    }
}

impl<T: Resource> Weak<T, Mut> {
    pub fn as_const(&self) -> WeakHandle<T> {
        Weak::acquire(&self.ledger, self.key)
    }
}

impl<T: Resource, A: Access> From<&Strong<T, A>> for Weak<T, A> {
    fn from(h: &Strong<T, A>) -> Self {
        Weak::acquire(h.ledger(), h.key())
    }
}

impl<T: Resource, A: Access> Clone for Weak<T, A> {
    fn clone(&self) -> Self {
        Self::acquire(&self.ledger, self.key)
    }

    fn clone_from(&mut self, source: &Self) {
        if self.same_resource(source) {
            return;
        }
        *self = source.clone();
    }
}

impl<T: Resource, A: Access> Drop for Weak<T, A> {
    fn drop(&mut self) {
        // SAFETY: the token is taken exactly once, here, and not used afterwards.
        let token = unsafe { ManuallyDrop::take(&mut self.token) };
        self.ledger.release_weak(self.key, token);
    }
}

impl<T: Resource, A: Access> fmt::Debug for Weak<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Weak")
            .field("kind", &T::KIND)
            .field("key", &self.key)
            .field("alive", &self.is_alive())
            .finish()
    }
}
