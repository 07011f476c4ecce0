// ⚠️ Error taxonomy for the import pipeline
//
// ImportError is fatal and aborts the run before commit.
// LinkFailure is per-edge: the linker collects it and moves on.

use crate::dataset::{EdgeKind, NodeId, RawEdge};
use std::path::PathBuf;

/// Alias for Results returning [`ImportError`].
pub type Result<T> = std::result::Result<T, ImportError>;

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("Failed to read dataset {path}: {source}")]
    DatasetRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed dataset {path}: {source}")]
    DatasetFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to load identifier overrides from {path}: {source}")]
    OverrideConfig {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to remove existing database {path}: {source}")]
    DatabaseReset {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Why a single edge was skipped.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LinkFailure {
    #[error("{kind} edge {} -> {}: node {missing} has no entity", .edge.source, .edge.target)]
    UnresolvedReference {
        kind: EdgeKind,
        missing: NodeId,
        edge: RawEdge,
    },

    #[error("{kind} edge {edge:?} could not be linked: {reason}")]
    MalformedEdge {
        kind: EdgeKind,
        edge: RawEdge,
        reason: String,
    },
}

impl LinkFailure {
    pub fn kind(&self) -> EdgeKind {
        match self {
            LinkFailure::UnresolvedReference { kind, .. } => *kind,
            LinkFailure::MalformedEdge { kind, .. } => *kind,
        }
    }
}
