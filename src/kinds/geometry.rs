use anyhow::ensure;

/// Well-known name of the shared full-screen quad.
pub const WHOLE_SCREEN_VAO: &str = "whole_screen_vao";

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Vertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

/// Indexed triangle geometry.
#[derive(Clone, Debug, PartialEq)]
pub struct GeometryBuffer {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl GeometryBuffer {
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> anyhow::Result<Self> {
        ensure!(
            indices.len() % 3 == 0,
            "index count {} is not a multiple of 3",
            indices.len()
        );
        if let Some(&bad) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
            anyhow::bail!("index {bad} out of range for {} vertices", vertices.len());
        }
        Ok(Self { vertices, indices })
    }

    /// Two triangles covering clip space, with uv origin at the bottom left.
    pub fn whole_screen_quad() -> Self {
        let v = |x: f32, y: f32| Vertex {
            position: [x, y, 0.0],
            uv: [(x + 1.0) * 0.5, (y + 1.0) * 0.5],
        };
        Self {
            vertices: vec![v(-1.0, -1.0), v(1.0, -1.0), v(1.0, 1.0), v(-1.0, 1.0)],
            indices: vec![0, 1, 2, 0, 2, 3],
        }
    }

    /// Geometry known by name without a file behind it.
    pub fn builtin(name: &str) -> Option<Self> {
        match name {
            WHOLE_SCREEN_VAO => Some(Self::whole_screen_quad()),
            _ => None,
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}
