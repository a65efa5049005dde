//! ResourceManager: owns every record, de-duplicates named resources and
//! runs deferred collection.

use crate::config::ManagerConfig;
use crate::error::ResourceError;
use crate::handle::{Handle, HandleMut, Strong};
use crate::id::ResourceId;
use crate::ledger::Ledger;
use crate::pool::{Pool, ResourceState};
use crate::registry::sealed::Sealed;
use crate::registry::{Pools, Resource, ResourceKind};
use slotmap::DefaultKey;
use std::rc::Rc;
use tracing::{debug, trace, warn};

/// Outcome of one `collect_garbage` call.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct CollectStats {
    /// Passes that found at least one pending identity.
    pub passes: usize,
    /// Records removed entirely.
    pub erased: usize,
    /// Records whose payload was reset while weak handles remained.
    pub tombstoned: usize,
    /// Pending records found strongly referenced again and left alone.
    pub skipped: usize,
}

/// Marks a record as under construction until dropped, including when the
/// constructor unwinds.
struct ConstructGuard {
    ledger: Rc<Ledger>,
    key: DefaultKey,
}

impl ConstructGuard {
    fn begin<T: Resource>(pool: &Pool<T>, key: DefaultKey, name: &str) -> Self {
        assert!(
            pool.ledger().begin_construct(key),
            "cyclic construction of {} '{}'",
            T::KIND,
            name
        );
        Self {
            ledger: pool.ledger().clone(),
            key,
        }
    }
}

impl Drop for ConstructGuard {
    fn drop(&mut self) {
        self.ledger.end_construct(self.key);
    }
}

/// Owner of every resource of every registered kind.
///
/// Construct one per graphics context and drop it before the context goes
/// away. Dropping the manager runs a final collection; resources that are
/// still strongly referenced at that point are reported and their payloads
/// dropped with the manager.
pub struct ResourceManager {
    config: ManagerConfig,
    pools: Pools,
}

impl Default for ResourceManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceManager {
    pub fn new() -> Self {
        Self::with_config(ManagerConfig::default())
    }

    pub fn with_config(config: ManagerConfig) -> Self {
        debug!(asset_root = %config.asset_root.display(), "creating resource manager");
        Self {
            config,
            pools: Pools::new(),
        }
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    pub(crate) fn pools(&self) -> &Pools {
        &self.pools
    }

    pub(crate) fn pools_mut(&mut self) -> &mut Pools {
        &mut self.pools
    }

    /// Take ownership of `value` as a new anonymous resource.
    pub fn new_from<T: Resource>(&mut self, value: T) -> Handle<T> {
        self.insert_anonymous(value)
    }

    /// Like [`ResourceManager::new_from`], returning a handle with mutable access.
    pub fn new_mut_from<T: Resource>(&mut self, value: T) -> HandleMut<T> {
        self.insert_anonymous(value)
    }

    fn insert_anonymous<T: Resource, A: crate::handle::Access>(&mut self, value: T) -> Strong<T, A> {
        let pool = T::pool_mut(&mut self.pools);
        let key = pool.allocate(None);
        pool.emplace(key, value);
        Strong::acquire(pool.ledger(), key)
    }

    /// Fetch the resource cached under `name`, constructing it on first use.
    ///
    /// A name whose record is pending deletion is revived without
    /// reconstruction. A name whose record was tombstoned by an earlier
    /// collection is reconstructed into the same identity. The constructor
    /// receives the manager so it can load the resources it depends on.
    ///
    /// # Panics
    ///
    /// If `constructor` requests `name` of the same kind again.
    pub fn get_or_construct_named<T, F>(
        &mut self,
        name: &str,
        constructor: F,
    ) -> Result<Handle<T>, ResourceError>
    where
        T: Resource,
        F: FnOnce(&mut ResourceManager, &str) -> anyhow::Result<T>,
    {
        let pool = T::pool_mut(&mut self.pools);
        let key = match pool.find_name(name) {
            Some(key) => {
                if pool.ledger().revive(key) {
                    trace!(kind = %T::KIND, asset = name, "revived pending resource");
                }
                key
            }
            None => pool.allocate(Some(name)),
        };

        // Held across the constructor so nothing it does can erase the record.
        let handle: Handle<T> = Strong::acquire(pool.ledger(), key);
        if pool.is_present(key) {
            return Ok(handle);
        }

        let guard = ConstructGuard::begin(pool, key, name);
        debug!(kind = %T::KIND, asset = name, "constructing named resource");
        let result = constructor(self, name);
        drop(guard);
        let pool = T::pool_mut(&mut self.pools);
        match result {
            Ok(value) => {
                pool.emplace(key, value);
                Ok(handle)
            }
            Err(source) => {
                warn!(kind = %T::KIND, asset = name, error = %source, "resource construction failed");
                Err(ResourceError::Construct {
                    kind: T::KIND,
                    name: name.to_owned(),
                    source,
                })
            }
        }
    }

    /// Infallible form of [`ResourceManager::get_or_construct_named`].
    ///
    /// # Panics
    ///
    /// If called for `name` while a constructor for the same name and kind
    /// is running.
    pub fn get_or_insert_named_with<T, F>(&mut self, name: &str, make: F) -> Handle<T>
    where
        T: Resource,
        F: FnOnce(&str) -> T,
    {
        let pool = T::pool_mut(&mut self.pools);
        let key = match pool.find_name(name) {
            Some(key) => {
                pool.ledger().revive(key);
                key
            }
            None => pool.allocate(Some(name)),
        };
        let handle = Strong::acquire(pool.ledger(), key);
        if !pool.is_present(key) {
            let guard = ConstructGuard::begin(pool, key, name);
            let value = make(name);
            drop(guard);
            pool.emplace(key, value);
        }
        handle
    }

    /// Look up a named resource without constructing it.
    ///
    /// Revives a pending record. Returns `None` if the name is unknown or
    /// its payload is absent.
    pub fn find_named<T: Resource>(&self, name: &str) -> Option<Handle<T>> {
        let pool = T::pool(&self.pools);
        let key = pool.find_name(name)?;
        if !pool.is_present(key) {
            return None;
        }
        pool.ledger().revive(key);
        Some(Strong::acquire(pool.ledger(), key))
    }

    /// Destroy every record flagged since the last call, repeating until no
    /// new records get flagged (or the configured pass bound is hit).
    pub fn collect_garbage(&mut self) -> CollectStats {
        let mut stats = CollectStats::default();
        loop {
            if self
                .config
                .max_collect_passes
                .is_some_and(|max| stats.passes >= max)
            {
                let left: usize = ResourceKind::ALL
                    .iter()
                    .map(|&k| self.pools.kind_pending_len(k))
                    .sum();
                if left > 0 {
                    warn!(passes = stats.passes, left, "collection pass bound reached");
                }
                break;
            }
            let snapshot = self.pools.take_pending();
            if snapshot.is_empty() {
                break;
            }
            stats.passes += 1;
            trace!(pass = stats.passes, pending = snapshot.len(), "collection pass");
            self.pools.collect(snapshot, &mut stats);
        }
        if stats.passes > 0 {
            debug!(
                passes = stats.passes,
                erased = stats.erased,
                tombstoned = stats.tombstoned,
                skipped = stats.skipped,
                "collected garbage"
            );
        }
        stats
    }

    /// Number of records (live, pending, tombstoned or empty) of kind `T`.
    pub fn len<T: Resource>(&self) -> usize {
        T::pool(&self.pools).len()
    }

    /// Number of records across every kind.
    pub fn total_len(&self) -> usize {
        ResourceKind::ALL
            .iter()
            .map(|&k| self.pools.kind_len(k))
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_len() == 0
    }

    /// Number of records of any kind that are currently strongly referenced.
    pub fn live_count(&self) -> usize {
        ResourceKind::ALL
            .iter()
            .map(|&k| self.pools.kind_referenced(k))
            .sum()
    }

    pub fn pending_len<T: Resource>(&self) -> usize {
        T::pool(&self.pools).pending_len()
    }

    pub fn contains_name<T: Resource>(&self, name: &str) -> bool {
        T::pool(&self.pools).find_name(name).is_some()
    }

    // Ids issued by another manager resolve to nothing here.
    fn key_of<T: Resource>(&self, id: ResourceId<T>) -> Option<DefaultKey> {
        id.issued_by(T::pool(&self.pools).ledger())
            .then(|| id.key())
    }

    pub fn contains_id<T: Resource>(&self, id: ResourceId<T>) -> bool {
        self.key_of(id)
            .is_some_and(|k| T::pool(&self.pools).contains(k))
    }

    pub fn is_pending<T: Resource>(&self, id: ResourceId<T>) -> bool {
        self.key_of(id)
            .is_some_and(|k| T::pool(&self.pools).ledger().is_pending(k))
    }

    pub fn state<T: Resource>(&self, id: ResourceId<T>) -> Option<ResourceState> {
        T::pool(&self.pools).state(self.key_of(id)?)
    }

    /// Name a record was cached under, if any.
    pub fn name_of<T: Resource>(&self, id: ResourceId<T>) -> Option<&str> {
        T::pool(&self.pools).name_of(self.key_of(id)?)
    }
}

impl Drop for ResourceManager {
    fn drop(&mut self) {
        self.collect_garbage();
        for &kind in ResourceKind::ALL {
            let referenced = self.pools.kind_referenced(kind);
            if referenced > 0 {
                warn!(%kind, referenced, "resources still referenced at manager drop");
            }
        }
    }
}
