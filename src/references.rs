// 🔍 Reference Deduplicator - one canonical row per category, person, relation
//
// Nodes repeat the same names over and over. Collect the union per universe,
// insert each distinct name exactly once, and hand back a name → id index so
// the entity builder links to the canonical row instead of copying it.

use crate::dataset::RawNode;
use crate::db::{find_reference, insert_reference, ReferenceKind};
use rusqlite::Connection;
use std::collections::{BTreeSet, HashMap};

// ============================================================================
// NAME UNIVERSES
// ============================================================================

/// Distinct names referenced anywhere in the node set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceNames {
    pub categories: BTreeSet<String>,
    pub key_people: BTreeSet<String>,
    pub relations: BTreeSet<String>,
}

impl ReferenceNames {
    pub fn collect(nodes: &[RawNode]) -> Self {
        let mut names = ReferenceNames::default();

        for node in nodes {
            names.categories.extend(node.categories.iter().cloned());
            names
                .key_people
                .extend(node.key_people.iter().map(|p| p.name.clone()));
            names
                .relations
                .extend(node.relations.iter().map(|r| r.entity.clone()));
        }

        names
    }

    pub fn get(&self, kind: ReferenceKind) -> &BTreeSet<String> {
        match kind {
            ReferenceKind::Category => &self.categories,
            ReferenceKind::KeyPerson => &self.key_people,
            ReferenceKind::Relation => &self.relations,
        }
    }
}

// ============================================================================
// REFERENCE INDEX
// ============================================================================

/// Canonical row ids keyed by name, one map per universe.
#[derive(Debug, Clone, Default)]
pub struct ReferenceIndex {
    categories: HashMap<String, i64>,
    key_people: HashMap<String, i64>,
    relations: HashMap<String, i64>,
}

impl ReferenceIndex {
    fn map(&self, kind: ReferenceKind) -> &HashMap<String, i64> {
        match kind {
            ReferenceKind::Category => &self.categories,
            ReferenceKind::KeyPerson => &self.key_people,
            ReferenceKind::Relation => &self.relations,
        }
    }

    fn map_mut(&mut self, kind: ReferenceKind) -> &mut HashMap<String, i64> {
        match kind {
            ReferenceKind::Category => &mut self.categories,
            ReferenceKind::KeyPerson => &mut self.key_people,
            ReferenceKind::Relation => &mut self.relations,
        }
    }

    pub fn get(&self, kind: ReferenceKind, name: &str) -> Option<i64> {
        self.map(kind).get(name).copied()
    }

    pub fn len(&self, kind: ReferenceKind) -> usize {
        self.map(kind).len()
    }

    pub fn is_empty(&self) -> bool {
        ReferenceKind::ALL.iter().all(|k| self.map(*k).is_empty())
    }
}

/// Persist every distinct name once and return the resulting index.
///
/// Names already present in the store are reused rather than inserted again,
/// so the one-row-per-name guarantee holds even against a non-empty store.
pub fn create_references(conn: &Connection, nodes: &[RawNode]) -> rusqlite::Result<ReferenceIndex> {
    let names = ReferenceNames::collect(nodes);
    let mut index = ReferenceIndex::default();

    for kind in ReferenceKind::ALL {
        let mut created = 0;

        for name in names.get(kind) {
            let id = match find_reference(conn, kind, name)? {
                Some(existing) => existing,
                None => {
                    created += 1;
                    insert_reference(conn, kind, name)?
                }
            };
            index.map_mut(kind).insert(name.clone(), id);
        }

        tracing::info!(
            table = kind.table(),
            distinct = names.get(kind).len(),
            created,
            "deduplicated references"
        );
    }

    Ok(index)
}
