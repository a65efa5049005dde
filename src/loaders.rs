//! Kind-specific convenience entry points on the manager.
//!
//! Each loader is a thin caller of `get_or_construct_named`: the asset path
//! (with `\` normalized to `/`) is the cache name, and the file is resolved
//! against the configured asset root only when the constructor runs.

use crate::error::ResourceError;
use crate::handle::Handle;
use crate::kinds::{
    BlueprintDesc, GeometryBuffer, SceneBlueprint, Script, ShaderProgram, Texture,
    WHOLE_SCREEN_VAO,
};
use crate::manager::ResourceManager;
use anyhow::{anyhow, Context};

fn asset_name(path: &str) -> String {
    path.replace('\\', "/")
}

impl ResourceManager {
    /// Texture decoded from an image file, cached by path.
    pub fn texture(&mut self, path: &str) -> Result<Handle<Texture>, ResourceError> {
        self.get_or_construct_named(&asset_name(path), |m, name| {
            Texture::from_path(&m.config().resolve(name))
        })
    }

    /// The shared full-screen quad.
    pub fn whole_screen_quad(&mut self) -> Handle<GeometryBuffer> {
        self.get_or_insert_named_with(WHOLE_SCREEN_VAO, |_| GeometryBuffer::whole_screen_quad())
    }

    /// Built-in geometry by name.
    pub fn geometry(&mut self, name: &str) -> Result<Handle<GeometryBuffer>, ResourceError> {
        self.get_or_construct_named(name, |_, name| {
            GeometryBuffer::builtin(name).ok_or_else(|| anyhow!("no built-in geometry named '{name}'"))
        })
    }

    /// Program loaded from `<base>.vert` and `<base>.frag`, cached by base path.
    pub fn shader_program(&mut self, base: &str) -> Result<Handle<ShaderProgram>, ResourceError> {
        self.get_or_construct_named(&asset_name(base), |m, name| {
            ShaderProgram::from_base_path(&m.config().resolve(name))
        })
    }

    pub fn script(&mut self, path: &str) -> Result<Handle<Script>, ResourceError> {
        self.get_or_construct_named(&asset_name(path), |m, name| {
            Script::from_path(&m.config().resolve(name))
        })
    }

    /// Blueprint parsed from a RON file. Everything the blueprint references
    /// is loaded (or fetched from the cache) while it is constructed.
    pub fn scene_blueprint(&mut self, path: &str) -> Result<Handle<SceneBlueprint>, ResourceError> {
        self.get_or_construct_named(&asset_name(path), |m, name| {
            let file = m.config().resolve(name);
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("reading blueprint {}", file.display()))?;
            let desc = BlueprintDesc::parse(&text)
                .with_context(|| format!("parsing blueprint {}", file.display()))?;
            SceneBlueprint::resolve(name, desc, m)
        })
    }
}
