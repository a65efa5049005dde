//! The closed set of resource kinds the manager stores.
//!
//! One line in the `resource_registry!` invocation at the bottom of this
//! file defines a kind: its `ResourceKind` variant, its payload type and the
//! pool field that stores it. Everything that iterates over "all kinds"
//! (collection passes, live counts, the drop report) is generated from that
//! list, so adding a kind is the only way to extend the manager.

use crate::kinds::{GeometryBuffer, Scene, SceneBlueprint, Script, ShaderProgram, Texture};
use crate::manager::CollectStats;
use crate::pool::Pool;
use slotmap::DefaultKey;

/// A payload type the manager knows how to store.
///
/// Sealed: implemented only by the registry list below.
pub trait Resource: sealed::Sealed + Sized + 'static {
    const KIND: ResourceKind;
}

pub(crate) mod sealed {
    use super::Pools;
    use crate::pool::Pool;

    pub trait Sealed: Sized {
        fn pool(pools: &Pools) -> &Pool<Self>;
        fn pool_mut(pools: &mut Pools) -> &mut Pool<Self>;
    }
}

macro_rules! resource_registry {
    ($($(#[$meta:meta])* $variant:ident => $ty:ty, $field:ident, $label:literal;)*) => {
        /// Discriminant of every registered resource kind.
        #[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
        pub enum ResourceKind {
            $($(#[$meta])* $variant,)*
        }

        impl ResourceKind {
            pub const ALL: &'static [ResourceKind] = &[$(ResourceKind::$variant,)*];

            pub fn label(self) -> &'static str {
                match self {
                    $(ResourceKind::$variant => $label,)*
                }
            }
        }

        /// One pool per registered kind.
        pub struct Pools {
            $(pub(crate) $field: Pool<$ty>,)*
        }

        /// Pending identities of every kind, taken at the start of a pass.
        pub(crate) struct PendingSnapshot {
            $($field: Vec<DefaultKey>,)*
        }

        impl PendingSnapshot {
            pub(crate) fn len(&self) -> usize {
                0 $(+ self.$field.len())*
            }

            pub(crate) fn is_empty(&self) -> bool {
                self.len() == 0
            }
        }

        impl Pools {
            pub(crate) fn new() -> Self {
                Self {
                    $($field: Pool::new(ResourceKind::$variant),)*
                }
            }

            pub(crate) fn take_pending(&self) -> PendingSnapshot {
                PendingSnapshot {
                    $($field: self.$field.take_pending(),)*
                }
            }

            pub(crate) fn collect(&mut self, snapshot: PendingSnapshot, stats: &mut CollectStats) {
                $(self.$field.collect(snapshot.$field, stats);)*
            }

            pub(crate) fn kind_len(&self, kind: ResourceKind) -> usize {
                match kind {
                    $(ResourceKind::$variant => self.$field.len(),)*
                }
            }

            pub(crate) fn kind_pending_len(&self, kind: ResourceKind) -> usize {
                match kind {
                    $(ResourceKind::$variant => self.$field.pending_len(),)*
                }
            }

            pub(crate) fn kind_referenced(&self, kind: ResourceKind) -> usize {
                match kind {
                    $(ResourceKind::$variant => self.$field.referenced_len(),)*
                }
            }
        }

        $(
            impl sealed::Sealed for $ty {
                fn pool(pools: &Pools) -> &Pool<Self> {
                    &pools.$field
                }
                fn pool_mut(pools: &mut Pools) -> &mut Pool<Self> {
                    &mut pools.$field
                }
            }

            impl Resource for $ty {
                const KIND: ResourceKind = ResourceKind::$variant;
            }
        )*
    };
}

impl core::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

resource_registry! {
    /// Decoded RGBA8 images.
    Texture => Texture, textures, "texture";
    /// Vertex/index buffers.
    GeometryBuffer => GeometryBuffer, geometry, "geometry buffer";
    /// Linked vertex + fragment programs.
    ShaderProgram => ShaderProgram, shaders, "shader program";
    /// Loaded scene descriptions.
    SceneBlueprint => SceneBlueprint, blueprints, "scene blueprint";
    /// Script sources.
    Script => Script, scripts, "script";
    /// Instantiated scenes.
    Scene => Scene, scenes, "scene";
}
