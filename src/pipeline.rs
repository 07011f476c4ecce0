// ⚙️ Pipeline Orchestrator - full reload of civic.json into the store
//
// Stage order is fixed by data dependencies:
//   load → render filter → dedup references → build entities
//   → manual id overrides → link edges → commit
//
// The dataset is parsed before the store is touched, so a malformed file
// never leaves partial writes behind. All writes share one transaction.

use crate::connections::{link_all, LinkReport};
use crate::dataset::{load_dataset, LoadedDataset};
use crate::db::{insert_import_run, open_database, table_counts, ImportRun, TableCounts};
use crate::entities::create_entities;
use crate::error::Result;
use crate::identifiers::{IdOverride, IdentifierMap, ManualOverrides};
use crate::references::create_references;
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::Serialize;
use std::path::Path;

// ============================================================================
// IMPORT REPORT
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub dataset_path: String,
    pub dataset_sha256: String,

    /// Nodes in the document, rendered or not
    pub nodes_read: usize,
    pub nodes_rendered: usize,
    pub edges_rendered: usize,
    pub identifiers_mapped: usize,

    /// Row counts after commit
    pub counts: TableCounts,
    pub links: LinkReport,
    pub skipped_overrides: Vec<IdOverride>,
}

impl ImportReport {
    pub fn skipped_edges(&self) -> usize {
        self.links.skipped()
    }

    pub fn is_clean(&self) -> bool {
        self.links.failures.is_empty() && self.skipped_overrides.is_empty()
    }
}

// ============================================================================
// ORCHESTRATION
// ============================================================================

/// Load the dataset, open (optionally recreate) the store, and import.
pub fn import_file(
    dataset_path: &Path,
    database_path: &Path,
    fresh: bool,
    overrides: &ManualOverrides,
) -> Result<ImportReport> {
    let loaded = load_dataset(dataset_path)?;
    tracing::info!(
        path = %dataset_path.display(),
        nodes = loaded.dataset.node_count(),
        "dataset loaded"
    );

    let mut conn = open_database(database_path, fresh)?;
    run_import(&mut conn, loaded, &dataset_path.display().to_string(), overrides)
}

/// Run every stage against an already initialised store and commit.
pub fn run_import(
    conn: &mut Connection,
    loaded: LoadedDataset,
    dataset_path: &str,
    overrides: &ManualOverrides,
) -> Result<ImportReport> {
    let started_at = Utc::now();
    let run_id = uuid::Uuid::new_v4().to_string();
    let LoadedDataset { dataset, sha256 } = loaded;

    let nodes_read = dataset.node_count();
    let filtered = dataset.into_rendered();
    tracing::info!(
        nodes_read,
        nodes_rendered = filtered.nodes.len(),
        edges_rendered = filtered.edge_count(),
        "filtered unrendered elements"
    );

    let tx = conn.transaction()?;

    let existing = table_counts(&tx)?.entities;
    if existing > 0 {
        tracing::warn!(
            existing,
            "store already holds entities; this run will add duplicates"
        );
    }

    let references = create_references(&tx, &filtered.nodes)?;

    let mut ids = IdentifierMap::new();
    create_entities(&tx, &filtered.nodes, &references, &mut ids)?;

    let skipped_overrides = ids.apply_overrides(overrides);
    tracing::info!(
        applied = overrides.len() - skipped_overrides.len(),
        skipped = skipped_overrides.len(),
        mapped = ids.len(),
        "applied identifier overrides"
    );

    let links = link_all(&tx, &filtered, &ids)?;

    let report = ImportReport {
        run_id,
        started_at,
        finished_at: Utc::now(),
        dataset_path: dataset_path.to_string(),
        dataset_sha256: sha256,
        nodes_read,
        nodes_rendered: filtered.nodes.len(),
        edges_rendered: filtered.edge_count(),
        identifiers_mapped: ids.len(),
        counts: table_counts(&tx)?,
        links,
        skipped_overrides,
    };

    insert_import_run(
        &tx,
        &ImportRun {
            run_id: report.run_id.clone(),
            started_at: report.started_at,
            finished_at: report.finished_at,
            dataset_path: report.dataset_path.clone(),
            dataset_sha256: report.dataset_sha256.clone(),
            report: serde_json::to_value(&report)?,
        },
    )?;

    tx.commit()?;

    tracing::info!(
        run_id = %report.run_id,
        entities = report.counts.entities,
        skipped_edges = report.skipped_edges(),
        "import committed"
    );

    Ok(report)
}
