use anyhow::{ensure, Context};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Vertex and fragment source of one program.
///
/// Compilation and linking belong to the renderer; the manager only owns
/// the validated sources so every user of a program shares one copy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShaderProgram {
    pub label: String,
    pub vertex_source: String,
    pub fragment_source: String,
}

impl ShaderProgram {
    pub fn from_sources(
        label: impl Into<String>,
        vertex_source: impl Into<String>,
        fragment_source: impl Into<String>,
    ) -> anyhow::Result<Self> {
        let label = label.into();
        let vertex_source = vertex_source.into();
        let fragment_source = fragment_source.into();
        ensure!(
            !vertex_source.trim().is_empty(),
            "shader '{label}' has an empty vertex stage"
        );
        ensure!(
            !fragment_source.trim().is_empty(),
            "shader '{label}' has an empty fragment stage"
        );
        Ok(Self {
            label,
            vertex_source,
            fragment_source,
        })
    }

    /// Load `<base>.vert` and `<base>.frag`.
    pub fn from_base_path(base: &Path) -> anyhow::Result<Self> {
        let vert = stage_path(base, "vert");
        let frag = stage_path(base, "frag");
        let vertex_source = std::fs::read_to_string(&vert)
            .with_context(|| format!("reading vertex stage {}", vert.display()))?;
        let fragment_source = std::fs::read_to_string(&frag)
            .with_context(|| format!("reading fragment stage {}", frag.display()))?;
        Self::from_sources(base.display().to_string(), vertex_source, fragment_source)
    }
}

// Appends rather than replacing, so "post.blur" becomes "post.blur.vert".
fn stage_path(base: &Path, ext: &str) -> PathBuf {
    let mut s = OsString::from(base.as_os_str());
    s.push(".");
    s.push(ext);
    PathBuf::from(s)
}
