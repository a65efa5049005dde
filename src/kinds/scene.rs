use super::{BlueprintNode, GeometryBuffer, SceneBlueprint, Script, ShaderProgram, Texture};
use crate::handle::Handle;
use crate::manager::ResourceManager;

/// One placed node of an instantiated scene.
#[derive(Clone, Debug)]
pub struct SceneNode {
    pub name: String,
    pub translation: [f32; 3],
    pub geometry: Option<Handle<GeometryBuffer>>,
    pub texture: Option<Handle<Texture>>,
    pub shader: Option<Handle<ShaderProgram>>,
}

impl From<&BlueprintNode> for SceneNode {
    fn from(n: &BlueprintNode) -> Self {
        Self {
            name: n.name.clone(),
            translation: n.translation,
            geometry: n.geometry.clone(),
            texture: n.texture.clone(),
            shader: n.shader.clone(),
        }
    }
}

/// A live scene. Scenes are built by the application and registered
/// anonymously; they keep their blueprint and everything it references
/// alive until the scene itself is collected.
#[derive(Debug)]
pub struct Scene {
    pub name: String,
    pub blueprint: Option<Handle<SceneBlueprint>>,
    pub nodes: Vec<SceneNode>,
    pub scripts: Vec<Handle<Script>>,
}

impl Scene {
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            blueprint: None,
            nodes: Vec::new(),
            scripts: Vec::new(),
        }
    }

    pub fn with_script(mut self, script: Handle<Script>) -> Self {
        self.scripts.push(script);
        self
    }

    pub fn with_node(mut self, node: SceneNode) -> Self {
        self.nodes.push(node);
        self
    }

    /// Place every node of `blueprint`.
    ///
    /// # Panics
    ///
    /// If `blueprint` was not issued by `manager`.
    pub fn instantiate(blueprint: &Handle<SceneBlueprint>, manager: &ResourceManager) -> Self {
        let bp = blueprint.get(manager);
        Self {
            name: bp.name.clone(),
            blueprint: Some(blueprint.clone()),
            nodes: bp.nodes.iter().map(SceneNode::from).collect(),
            scripts: bp.nodes.iter().filter_map(|n| n.script.clone()).collect(),
        }
    }

    pub fn node_mut(&mut self, name: &str) -> Option<&mut SceneNode> {
        self.nodes.iter_mut().find(|n| n.name == name)
    }
}
