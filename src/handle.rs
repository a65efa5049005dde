//! Strong handles.
//!
//! A strong handle is one counted reference to a record. Cloning mints a
//! new token from the record's strong counter; dropping returns it and, on
//! the last return, flags the record for the next collection pass. Handles
//! never own the payload: reading it goes through the manager, which ties
//! the borrow to the manager and rules out access across a collection.

use crate::error::AccessError;
use crate::id::ResourceId;
use crate::ledger::Ledger;
use crate::manager::ResourceManager;
use crate::registry::sealed::Sealed;
use crate::registry::Resource;
use crate::tokens::StrongToken;
use crate::weak::Weak;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::marker::PhantomData;
use core::mem::ManuallyDrop;
use slotmap::DefaultKey;
use std::rc::Rc;

/// View flavor of a handle: `Const` grants shared access, `Mut` also
/// grants exclusive access.
pub trait Access: access::Sealed + 'static {}

mod access {
    pub trait Sealed {}
}

/// Shared-access flavor.
#[derive(Debug)]
pub enum Const {}
/// Shared- and exclusive-access flavor.
#[derive(Debug)]
pub enum Mut {}

impl access::Sealed for Const {}
impl access::Sealed for Mut {}
impl Access for Const {}
impl Access for Mut {}

/// Counted reference that keeps a resource's payload alive.
pub struct Strong<T: Resource, A: Access = Const> {
    ledger: Rc<Ledger>,
    key: DefaultKey,
    token: ManuallyDrop<StrongToken>,
    _marker: PhantomData<(fn() -> T, A)>,
}

/// Strong handle with shared access.
pub type Handle<T> = Strong<T, Const>;
/// Strong handle with shared and exclusive access.
pub type HandleMut<T> = Strong<T, Mut>;

impl<T: Resource, A: Access> Strong<T, A> {
    pub(crate) fn acquire(ledger: &Rc<Ledger>, key: DefaultKey) -> Self {
        let token = ledger.acquire_strong(key);
        Self::from_token(ledger.clone(), key, token)
    }

    pub(crate) fn from_token(ledger: Rc<Ledger>, key: DefaultKey, token: StrongToken) -> Self {
        Self {
            ledger,
            key,
            token: ManuallyDrop::new(token),
            _marker: PhantomData,
        }
    }

    pub(crate) fn ledger(&self) -> &Rc<Ledger> {
        &self.ledger
    }

    pub(crate) fn key(&self) -> DefaultKey {
        self.key
    }

    pub fn id(&self) -> ResourceId<T> {
        ResourceId::new(&self.ledger, self.key)
    }

    pub fn strong_count(&self) -> usize {
        self.ledger.counts(self.key).map_or(0, |(s, _)| s)
    }

    pub fn weak_count(&self) -> usize {
        self.ledger.counts(self.key).map_or(0, |(_, w)| w)
    }

    /// True if both handles reference the same record.
    pub fn same_resource<B: Access>(&self, other: &Strong<T, B>) -> bool {
        Rc::ptr_eq(&self.ledger, &other.ledger) && self.key == other.key
    }

    /// Create a weak handle of the same flavor.
    pub fn downgrade(&self) -> Weak<T, A> {
        Weak::acquire(&self.ledger, self.key)
    }

    /// Another strong reference to the same record, restricted to shared access.
    pub fn as_const(&self) -> Handle<T> {
        Strong::acquire(&self.ledger, self.key)
    }

    /// Borrow the payload from the manager that issued this handle.
    pub fn try_get<'m>(&self, manager: &'m ResourceManager) -> Result<&'m T, AccessError> {
        let pool = T::pool(manager.pools());
        if !pool.owns(&self.ledger) {
            return Err(AccessError::WrongManager);
        }
        pool.payload(self.key).ok_or(AccessError::Absent)
    }

    /// Borrow the payload.
    ///
    /// # Panics
    ///
    /// If `manager` did not issue this handle, or the payload is absent
    /// (only possible while the resource's own constructor is running).
    pub fn get<'m>(&self, manager: &'m ResourceManager) -> &'m T {
        match self.try_get(manager) {
            Ok(v) => v,
            Err(e) => panic!("{} {:?}: {e}", T::KIND, self.key),
        }
    }
}

impl<T: Resource> Strong<T, Mut> {
    pub fn try_get_mut<'m>(
        &self,
        manager: &'m mut ResourceManager,
    ) -> Result<&'m mut T, AccessError> {
        let pool = T::pool_mut(manager.pools_mut());
        if !pool.owns(&self.ledger) {
            return Err(AccessError::WrongManager);
        }
        pool.payload_mut(self.key).ok_or(AccessError::Absent)
    }

    /// Mutably borrow the payload.
    ///
    /// # Panics
    ///
    /// Same conditions as [`Strong::get`].
    pub fn get_mut<'m>(&self, manager: &'m mut ResourceManager) -> &'m mut T {
        let key = self.key;
        match self.try_get_mut(manager) {
            Ok(v) => v,
            Err(e) => panic!("{} {:?}: {e}", T::KIND, key),
        }
    }
}

impl<T: Resource> From<HandleMut<T>> for Handle<T> {
    fn from(h: HandleMut<T>) -> Self {
        h.as_const()
    }
}

impl<T: Resource, A: Access> Clone for Strong<T, A> {
    fn clone(&self) -> Self {
        Self::acquire(&self.ledger, self.key)
    }

    fn clone_from(&mut self, source: &Self) {
        // Same record: nothing to do, and releasing first could transiently
        // zero the count and flag a resource that stays referenced.
        if self.same_resource(source) {
            return;
        }
        *self = source.clone();
    }
}

impl<T: Resource, A: Access> Drop for Strong<T, A> {
    fn drop(&mut self) {
        // SAFETY: the token is taken exactly once, here, and not used afterwards.
        let token = unsafe { ManuallyDrop::take(&mut self.token) };
        self.ledger.release_strong(self.key, token);
    }
}

impl<T: Resource, A: Access, B: Access> PartialEq<Strong<T, B>> for Strong<T, A> {
    fn eq(&self, other: &Strong<T, B>) -> bool {
        self.same_resource(other)
    }
}

impl<T: Resource, A: Access> Eq for Strong<T, A> {}

impl<T: Resource, A: Access> Hash for Strong<T, A> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Rc::as_ptr(&self.ledger) as usize).hash(state);
        self.key.hash(state);
    }
}

impl<T: Resource, A: Access> fmt::Debug for Strong<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Strong")
            .field("kind", &T::KIND)
            .field("key", &self.key)
            .field("strong", &self.strong_count())
            .field("weak", &self.weak_count())
            .finish()
    }
}
