use anyhow::Context;
use std::path::Path;

/// Source text of a script, keyed by the path it was loaded from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Script {
    pub path: String,
    pub source: String,
}

impl Script {
    pub fn new(path: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            source: source.into(),
        }
    }

    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("reading script {}", path.display()))?;
        Ok(Self::new(path.display().to_string(), source))
    }

    pub fn line_count(&self) -> usize {
        self.source.lines().count()
    }
}
