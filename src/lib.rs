//! rc-resources: a single-threaded resource cache with strong and weak
//! counted handles, load-once-by-name de-duplication and explicit,
//! deferred collection.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: own every heavyweight asset in one place, hand out counted
//!   handles to it, and never destroy an asset while a strong handle exists
//!   or leak it once none does.
//! - Layers:
//!   - `tokens`: linear tokens minted by the strong and weak counters. A
//!     token dropped without being returned panics, so a lost decrement
//!     cannot go unnoticed.
//!   - `Ledger`: per-kind arena of `{strong, weak, present}` records and
//!     the pending-deletion set. Shared with handles through an `Rc`.
//!   - `Pool<T>`: per-kind payload storage and name index, owned by the
//!     manager and keyed by the ledger's generational keys.
//!   - `ResourceManager`: construction, named lookup with revival, and
//!     `collect_garbage`.
//!
//! Constraints
//! - Single-threaded: handles are `!Send`/`!Sync` (they hold an `Rc`).
//! - Closed kind set: the registry macro lists every kind; there is no
//!   dynamic registration.
//! - Count transitions never destroy anything. Reaching zero only flags a
//!   record; `collect_garbage` is the one place payloads are dropped.
//!
//! Why split counts from payloads?
//! - Handle clone/drop touches only the ledger, never the pool, so a
//!   payload dropped during collection may release handles it holds
//!   (a scene releasing its textures) without re-entering pool storage.
//!   The released records land in the pending set and are seen by the
//!   next pass of the same `collect_garbage` call.
//! - Payload access goes through the manager (`Handle::get(&manager)`),
//!   so the borrow checker rules out holding a payload reference across
//!   a collection.
//!
//! Identity
//! - A record's identity is its generational slot key. It stays valid
//!   while the record is tombstoned and is never reused after erasure.
//!
//! Overflow semantics
//! - Count overflow aborts, matching `Rc`.
//!
//! Notes and non-goals
//! - No global instance: build a `ResourceManager` alongside the graphics
//!   context and drop it before the context.
//! - Handles that outlive their manager stay memory-safe; payload access
//!   through any other manager fails with `AccessError::WrongManager`.
//! - Collection is never implicit.

mod config;
mod error;
mod handle;
mod id;
pub mod kinds;
mod ledger;
mod loaders;
mod manager;
mod pool;
mod registry;
pub mod tokens;
mod weak;

// Public surface
pub use config::ManagerConfig;
pub use error::{AccessError, ResourceError};
pub use handle::{Access, Const, Handle, HandleMut, Mut, Strong};
pub use id::ResourceId;
pub use kinds::{GeometryBuffer, Scene, SceneBlueprint, Script, ShaderProgram, Texture};
pub use manager::{CollectStats, ResourceManager};
pub use pool::ResourceState;
pub use registry::{Resource, ResourceKind};
pub use weak::{Weak, WeakHandle, WeakHandleMut};
