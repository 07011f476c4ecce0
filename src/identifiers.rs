// 🔗 Identifier Remapper - source node IDs → store-assigned entity IDs
//
// Filled while entities are built, then patched with the manual override
// table for edges that point at unrendered copies of a node.

use crate::dataset::NodeId;
use crate::db::EntityId;
use crate::error::{ImportError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

/// Override table shipped with the crate, applied unless replaced or disabled.
pub const BUNDLED_OVERRIDES: &str = include_str!("../config/id_overrides.csv");

// ============================================================================
// MANUAL OVERRIDES
// ============================================================================

/// One `broken → substitute` rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdOverride {
    pub broken_id: NodeId,
    pub substitute_id: NodeId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManualOverrides {
    rules: Vec<IdOverride>,
}

impl ManualOverrides {
    pub fn new(rules: Vec<IdOverride>) -> Self {
        ManualOverrides { rules }
    }

    /// Load a `broken_id,substitute_id` CSV table.
    pub fn from_csv(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|e| ImportError::OverrideConfig {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
        Self::from_reader(file, path)
    }

    /// The table compiled in from `config/id_overrides.csv`.
    pub fn bundled() -> Result<Self> {
        Self::from_reader(BUNDLED_OVERRIDES.as_bytes(), Path::new("config/id_overrides.csv"))
    }

    fn from_reader<R: Read>(reader: R, origin: &Path) -> Result<Self> {
        let config_error = |source: csv::Error| ImportError::OverrideConfig {
            path: origin.to_path_buf(),
            source,
        };

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .comment(Some(b'#'))
            .from_reader(reader);

        let mut rules = Vec::new();
        for result in rdr.deserialize() {
            let rule: IdOverride = result.map_err(config_error)?;
            rules.push(rule);
        }

        tracing::debug!(origin = %origin.display(), rules = rules.len(), "loaded identifier overrides");
        Ok(ManualOverrides { rules })
    }

    pub fn rules(&self) -> &[IdOverride] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

// ============================================================================
// IDENTIFIER MAP
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct IdentifierMap {
    entries: HashMap<NodeId, EntityId>,
}

impl IdentifierMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the previous entity id when `raw_id` was already mapped.
    pub fn put(&mut self, raw_id: NodeId, entity_id: EntityId) -> Option<EntityId> {
        self.entries.insert(raw_id, entity_id)
    }

    pub fn get(&self, raw_id: NodeId) -> Option<EntityId> {
        self.entries.get(&raw_id).copied()
    }

    pub fn contains(&self, raw_id: NodeId) -> bool {
        self.entries.contains_key(&raw_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Point each broken id at its substitute's entity.
    ///
    /// Must run after every node has been built. Rules whose substitute never
    /// got an entity are skipped and returned.
    pub fn apply_overrides(&mut self, overrides: &ManualOverrides) -> Vec<IdOverride> {
        let mut skipped = Vec::new();

        for rule in overrides.rules() {
            match self.get(rule.substitute_id) {
                Some(entity_id) => {
                    if let Some(previous) = self.put(rule.broken_id, entity_id) {
                        tracing::debug!(
                            broken = rule.broken_id,
                            previous,
                            entity_id,
                            "override replaced an existing mapping"
                        );
                    }
                }
                None => {
                    tracing::warn!(
                        broken = rule.broken_id,
                        substitute = rule.substitute_id,
                        "override substitute has no entity; rule skipped"
                    );
                    skipped.push(*rule);
                }
            }
        }

        skipped
    }
}
