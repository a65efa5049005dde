use crate::registry::ResourceKind;
use thiserror::Error;

/// Failure to produce a named resource.
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("failed to construct {kind} '{name}'")]
    Construct {
        kind: ResourceKind,
        name: String,
        #[source]
        source: anyhow::Error,
    },
}

impl ResourceError {
    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourceError::Construct { kind, .. } => *kind,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ResourceError::Construct { name, .. } => name,
        }
    }
}

/// Payload access through a handle failed.
#[derive(Debug, Error, Copy, Clone, PartialEq, Eq, Hash)]
pub enum AccessError {
    #[error("handle belongs to a different resource manager")]
    WrongManager,
    #[error("resource payload is not present")]
    Absent,
}
