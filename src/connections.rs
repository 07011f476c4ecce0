// 🤝 Connection Linker - turn rendered edges into typed entity relationships
//
// Collaboration/data edges become directed connections. Funding/investment
// edges become one shared record with a receiver and a giver; civic.json
// writes the receiver as `source` and the giver as `target`.
//
// Edge-level failures are collected, never raised. Only store errors abort.

use crate::dataset::{EdgeKind, FilteredDataset, NodeId, RawEdge, Scalar};
use crate::db::{find_entity, insert_connection, insert_grant, ConnectionKind, EntityId, GrantKind};
use crate::error::LinkFailure;
use crate::identifiers::IdentifierMap;
use rusqlite::Connection;
use serde::Serialize;
use std::collections::BTreeMap;

// ============================================================================
// RESOLUTION
// ============================================================================

/// Outcome of mapping an edge's endpoints onto stored entities.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Resolved { source: EntityId, target: EntityId },
    Failed(LinkFailure),
}

/// Look both endpoints up in the identifier map, then confirm the entities
/// actually exist in the store.
pub fn resolve_edge(
    conn: &Connection,
    kind: EdgeKind,
    edge: &RawEdge,
    ids: &IdentifierMap,
) -> rusqlite::Result<Resolution> {
    let unresolved = |missing: NodeId| {
        Resolution::Failed(LinkFailure::UnresolvedReference {
            kind,
            missing,
            edge: edge.clone(),
        })
    };

    let source = match ids.get(edge.source) {
        Some(id) => id,
        None => return Ok(unresolved(edge.source)),
    };
    let target = match ids.get(edge.target) {
        Some(id) => id,
        None => return Ok(unresolved(edge.target)),
    };

    for (raw_id, entity_id) in [(edge.source, source), (edge.target, target)] {
        if find_entity(conn, entity_id)?.is_none() {
            return Ok(Resolution::Failed(LinkFailure::MalformedEdge {
                kind,
                edge: edge.clone(),
                reason: format!("node {} maps to entity {} which does not exist", raw_id, entity_id),
            }));
        }
    }

    Ok(Resolution::Resolved { source, target })
}

// ============================================================================
// LINKING
// ============================================================================

/// Write the relationship for an already resolved edge.
pub fn link_edge(
    conn: &Connection,
    kind: EdgeKind,
    edge: &RawEdge,
    source: EntityId,
    target: EntityId,
) -> rusqlite::Result<()> {
    match kind {
        EdgeKind::Collaboration => {
            insert_connection(conn, ConnectionKind::Collaboration, source, target)?;
        }
        EdgeKind::Data => {
            insert_connection(conn, ConnectionKind::Data, source, target)?;
        }
        // source receives, target gives
        EdgeKind::Funding => link_grant(conn, GrantKind::Funding, edge, source, target)?,
        EdgeKind::Investment => link_grant(conn, GrantKind::Investment, edge, source, target)?,
    }
    Ok(())
}

fn link_grant(
    conn: &Connection,
    kind: GrantKind,
    edge: &RawEdge,
    receiver: EntityId,
    giver: EntityId,
) -> rusqlite::Result<()> {
    for (field, value) in [("amount", &edge.amount), ("year", &edge.year)] {
        if let Some(text) = value.as_ref().and_then(Scalar::as_text) {
            tracing::warn!(
                table = kind.table(),
                source = edge.source,
                target = edge.target,
                field,
                value = text,
                "non-numeric value stored verbatim"
            );
        }
    }
    insert_grant(conn, kind, edge.amount.as_ref(), edge.year.as_ref(), receiver, giver)?;
    Ok(())
}

/// Linked edge counts per class plus every skipped edge.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LinkReport {
    pub linked: BTreeMap<EdgeKind, usize>,

    #[serde(serialize_with = "failures_as_text")]
    pub failures: Vec<LinkFailure>,
}

impl LinkReport {
    pub fn linked(&self, kind: EdgeKind) -> usize {
        self.linked.get(&kind).copied().unwrap_or(0)
    }

    pub fn total_linked(&self) -> usize {
        self.linked.values().sum()
    }

    pub fn skipped(&self) -> usize {
        self.failures.len()
    }

    /// Skipped edges grouped by class, in link order.
    pub fn failures_by_kind(&self) -> BTreeMap<EdgeKind, Vec<&LinkFailure>> {
        let mut grouped: BTreeMap<EdgeKind, Vec<&LinkFailure>> = BTreeMap::new();
        for failure in &self.failures {
            grouped.entry(failure.kind()).or_default().push(failure);
        }
        grouped
    }
}

fn failures_as_text<S>(failures: &[LinkFailure], serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.collect_seq(failures.iter().map(|f| f.to_string()))
}

/// Link one edge class, collecting failures into `report`.
pub fn link_edges(
    conn: &Connection,
    kind: EdgeKind,
    edges: &[RawEdge],
    ids: &IdentifierMap,
    report: &mut LinkReport,
) -> rusqlite::Result<()> {
    let mut linked = 0;

    for edge in edges {
        match resolve_edge(conn, kind, edge, ids)? {
            Resolution::Resolved { source, target } => {
                link_edge(conn, kind, edge, source, target)?;
                linked += 1;
            }
            Resolution::Failed(failure) => {
                tracing::warn!(kind = %kind, "{}", failure);
                report.failures.push(failure);
            }
        }
    }

    *report.linked.entry(kind).or_insert(0) += linked;
    tracing::info!(kind = %kind, total = edges.len(), linked, "linked edges");
    Ok(())
}

/// Link all four edge classes in the fixed order.
pub fn link_all(
    conn: &Connection,
    dataset: &FilteredDataset,
    ids: &IdentifierMap,
) -> rusqlite::Result<LinkReport> {
    let mut report = LinkReport::default();

    for kind in EdgeKind::LINK_ORDER {
        link_edges(conn, kind, dataset.edges(kind), ids, &mut report)?;
    }

    Ok(report)
}
