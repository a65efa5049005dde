use std::path::{Path, PathBuf};

/// Construction-time settings for a `ResourceManager`.
#[derive(Clone, Debug)]
pub struct ManagerConfig {
    /// Directory that asset names given to the loaders are resolved against.
    pub asset_root: PathBuf,
    /// Upper bound on collection passes per `collect_garbage` call. `None`
    /// runs to a fixed point.
    pub max_collect_passes: Option<usize>,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from("."),
            max_collect_passes: None,
        }
    }
}

impl ManagerConfig {
    pub fn with_asset_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.asset_root = root.into();
        self
    }

    pub fn with_max_collect_passes(mut self, passes: usize) -> Self {
        self.max_collect_passes = Some(passes);
        self
    }

    pub(crate) fn resolve(&self, name: &str) -> PathBuf {
        let p = Path::new(name);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.asset_root.join(p)
        }
    }
}
