// Civic Import - Core Library
// Reconciles a civic.json node-link dataset into a normalized SQLite store

pub mod config;
pub mod error;
pub mod db;
pub mod dataset;        // Loader: JSON → typed records
pub mod render;         // Render filter
pub mod references;     // Reference deduplicator
pub mod identifiers;    // Raw ID → entity ID remapping + manual overrides
pub mod entities;       // Entity builder
pub mod connections;    // Connection linker
pub mod pipeline;       // Orchestrator

// Re-export commonly used types
pub use error::{ImportError, LinkFailure, Result};
pub use db::{
    EntityId, EntityRecord, TableCounts, ImportRun,
    ReferenceKind, FinanceKind, ConnectionKind, GrantKind, GrantRole,
    open_database, setup_database, table_counts, get_import_runs,
};
pub use dataset::{
    Dataset, FilteredDataset, LoadedDataset, RawNode, RawEdge, EdgeKind, NodeId,
    FinancePoint, PersonRef, RelationRef, Scalar,
    load_dataset, parse_dataset,
};
pub use render::{Rendered, RenderFlag, filter_rendered};
pub use references::{ReferenceIndex, ReferenceNames, create_references};
pub use identifiers::{IdentifierMap, ManualOverrides, IdOverride};
pub use entities::{create_entity, create_entities};
pub use connections::{LinkReport, Resolution, link_all, link_edges, resolve_edge};
pub use pipeline::{ImportReport, import_file, run_import};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
