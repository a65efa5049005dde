//! Payload types of the registered resource kinds.
//!
//! These are the CPU-side values the manager owns. Uploading them to a GPU,
//! parsing shader source or running scripts happens elsewhere; here they
//! are plain movable values with loaders that may fail.

mod blueprint;
mod geometry;
mod scene;
mod script;
mod shader;
mod texture;

pub use blueprint::{BlueprintDesc, BlueprintNode, NodeDesc, SceneBlueprint};
pub use geometry::{GeometryBuffer, Vertex, WHOLE_SCREEN_VAO};
pub use scene::{Scene, SceneNode};
pub use script::Script;
pub use shader::ShaderProgram;
pub use texture::Texture;
