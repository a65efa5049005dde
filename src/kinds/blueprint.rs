//! Scene blueprints: a parsed scene description whose asset references
//! have been resolved into handles.

use super::{GeometryBuffer, Script, ShaderProgram, Texture};
use crate::handle::Handle;
use crate::manager::ResourceManager;
use anyhow::Context;
use serde::Deserialize;

/// On-disk form of a blueprint (RON).
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct BlueprintDesc {
    #[serde(default)]
    pub nodes: Vec<NodeDesc>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct NodeDesc {
    pub name: String,
    #[serde(default)]
    pub translation: [f32; 3],
    /// Name of a built-in geometry buffer.
    #[serde(default)]
    pub geometry: Option<String>,
    /// Asset paths, resolved through the manager's loaders.
    #[serde(default)]
    pub texture: Option<String>,
    #[serde(default)]
    pub shader: Option<String>,
    #[serde(default)]
    pub script: Option<String>,
}

impl BlueprintDesc {
    pub fn parse(text: &str) -> anyhow::Result<Self> {
        Ok(ron::from_str(text)?)
    }
}

#[derive(Clone, Debug)]
pub struct BlueprintNode {
    pub name: String,
    pub translation: [f32; 3],
    pub geometry: Option<Handle<GeometryBuffer>>,
    pub texture: Option<Handle<Texture>>,
    pub shader: Option<Handle<ShaderProgram>>,
    pub script: Option<Handle<Script>>,
}

/// A loaded scene description. Holds strong handles to everything its
/// nodes reference, so those stay cached while the blueprint does.
#[derive(Debug)]
pub struct SceneBlueprint {
    pub name: String,
    pub nodes: Vec<BlueprintNode>,
}

impl SceneBlueprint {
    /// Resolve every reference in `desc`, loading through `manager`.
    pub fn resolve(
        name: impl Into<String>,
        desc: BlueprintDesc,
        manager: &mut ResourceManager,
    ) -> anyhow::Result<Self> {
        let name = name.into();
        let mut nodes = Vec::with_capacity(desc.nodes.len());
        for node in desc.nodes {
            let ctx = || format!("node '{}' of blueprint '{name}'", node.name);
            let geometry = node
                .geometry
                .as_deref()
                .map(|g| manager.geometry(g))
                .transpose()
                .with_context(ctx)?;
            let texture = node
                .texture
                .as_deref()
                .map(|t| manager.texture(t))
                .transpose()
                .with_context(ctx)?;
            let shader = node
                .shader
                .as_deref()
                .map(|s| manager.shader_program(s))
                .transpose()
                .with_context(ctx)?;
            let script = node
                .script
                .as_deref()
                .map(|s| manager.script(s))
                .transpose()
                .with_context(ctx)?;
            nodes.push(BlueprintNode {
                name: node.name,
                translation: node.translation,
                geometry,
                texture,
                shader,
                script,
            });
        }
        Ok(Self { name, nodes })
    }

    pub fn node(&self, name: &str) -> Option<&BlueprintNode> {
        self.nodes.iter().find(|n| n.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinds::WHOLE_SCREEN_VAO;

    const DESC: &str = r#"(
        nodes: [
            (name: "backdrop", geometry: Some("whole_screen_vao")),
            (name: "empty", translation: (1.0, 2.0, 3.0)),
        ],
    )"#;

    #[test]
    fn parse_fills_defaults() {
        let desc = BlueprintDesc::parse(DESC).unwrap();
        assert_eq!(desc.nodes.len(), 2);
        assert_eq!(desc.nodes[0].geometry.as_deref(), Some(WHOLE_SCREEN_VAO));
        assert_eq!(desc.nodes[0].translation, [0.0; 3]);
        assert_eq!(desc.nodes[1].translation, [1.0, 2.0, 3.0]);
        assert_eq!(desc.nodes[1].texture, None);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(BlueprintDesc::parse("(nodes: [ (nam").is_err());
    }

    #[test]
    fn resolve_shares_builtin_geometry() {
        let mut m = ResourceManager::new();
        let quad = m.whole_screen_quad();
        let bp = SceneBlueprint::resolve("bp", BlueprintDesc::parse(DESC).unwrap(), &mut m).unwrap();
        let node = bp.node("backdrop").unwrap();
        assert_eq!(node.geometry.as_ref(), Some(&quad));
        assert_eq!(quad.strong_count(), 2);
        assert!(bp.node("empty").unwrap().geometry.is_none());
    }

    #[test]
    fn resolve_names_the_failing_node() {
        let mut m = ResourceManager::new();
        let desc = BlueprintDesc {
            nodes: vec![NodeDesc {
                name: "teapot".into(),
                geometry: Some("teapot".into()),
                ..Default::default()
            }],
        };
        let err = SceneBlueprint::resolve("bp", desc, &mut m).unwrap_err();
        assert!(format!("{err:#}").contains("node 'teapot'"));
    }
}
