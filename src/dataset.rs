// 📂 Dataset Loader - civic.json → typed node and edge records
//
// The source document is loosely typed: scalars may be null, missing, numbers
// or numeric strings, and list fields may be null. Shapes are normalized here
// so later stages only see known types, but values are never dropped.

use crate::error::{ImportError, Result};
use crate::render::{filter_rendered, Rendered};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::Path;

/// Node identifier as written in the source dataset.
pub type NodeId = i64;

// ============================================================================
// RAW RECORDS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawNode {
    #[serde(rename = "ID")]
    pub id: NodeId,

    #[serde(default, deserialize_with = "lenient_text")]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "lenient_text")]
    pub nickname: Option<String>,

    #[serde(default, deserialize_with = "lenient_text")]
    pub location: Option<String>,

    #[serde(rename = "type", default, deserialize_with = "lenient_text")]
    pub entity_type: Option<String>,

    #[serde(default, deserialize_with = "lenient_text")]
    pub influence: Option<String>,

    #[serde(default)]
    pub employees: Option<Scalar>,

    #[serde(default, deserialize_with = "lenient_text")]
    pub url: Option<String>,

    #[serde(default, deserialize_with = "lenient_text")]
    pub twitter_handle: Option<String>,

    #[serde(default)]
    pub followers: Option<Scalar>,

    #[serde(default, deserialize_with = "nullable_list")]
    pub categories: Vec<String>,

    #[serde(default, deserialize_with = "nullable_list")]
    pub key_people: Vec<PersonRef>,

    #[serde(default, deserialize_with = "nullable_list")]
    pub relations: Vec<RelationRef>,

    #[serde(default, deserialize_with = "nullable_list")]
    pub revenue: Vec<FinancePoint>,

    #[serde(default, deserialize_with = "nullable_list")]
    pub expenses: Vec<FinancePoint>,
}

/// `{ "name": ... }` entry of a node's `key_people`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonRef {
    pub name: String,
}

/// `{ "entity": ... }` entry of a node's `relations`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationRef {
    pub entity: String,
}

/// One year of revenue or expenses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancePoint {
    #[serde(default)]
    pub amount: Option<Scalar>,

    #[serde(default)]
    pub year: Option<Scalar>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEdge {
    pub source: NodeId,
    pub target: NodeId,

    /// Only meaningful for funding and investment edges
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Scalar>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<Scalar>,
}

// ============================================================================
// SCALAR VALUES
// ============================================================================

/// A numeric attribute as the source wrote it.
///
/// Numbers and numeric strings (thousands separators allowed) land in `Int`
/// or `Real`; anything else, like `"10-50"` or `"$5,000"`, stays `Text`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Int(i64),
    Real(f64),
    Text(String),
}

impl Scalar {
    fn from_text(text: String) -> Scalar {
        let cleaned = text.trim().replace(',', "");
        if let Ok(i) = cleaned.parse::<i64>() {
            return Scalar::Int(i);
        }
        match cleaned.parse::<f64>() {
            Ok(f) if f.is_finite() => Scalar::Real(f),
            _ => Scalar::Text(text),
        }
    }

    /// The raw text when the value could not be read as a number.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Scalar::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for Scalar {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::Number(n) => match n.as_i64() {
                Some(i) => Ok(Scalar::Int(i)),
                None => n
                    .as_f64()
                    .map(Scalar::Real)
                    .ok_or_else(|| serde::de::Error::custom(format!("unrepresentable number {}", n))),
            },
            Value::String(s) => Ok(Scalar::from_text(s)),
            Value::Bool(b) => Ok(Scalar::Int(b as i64)),
            other => Err(serde::de::Error::custom(format!(
                "expected a number or string, found {}",
                other
            ))),
        }
    }
}

// ============================================================================
// EDGE KIND
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    Collaboration,
    Data,
    Funding,
    Investment,
}

impl EdgeKind {
    /// Order in which the linker walks the edge classes.
    pub const LINK_ORDER: [EdgeKind; 4] = [
        EdgeKind::Collaboration,
        EdgeKind::Data,
        EdgeKind::Investment,
        EdgeKind::Funding,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Collaboration => "collaboration",
            EdgeKind::Data => "data",
            EdgeKind::Funding => "funding",
            EdgeKind::Investment => "investment",
        }
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// DATASET
// ============================================================================

/// The document exactly as read, render markers still attached.
#[derive(Debug, Clone, Deserialize)]
pub struct Dataset {
    pub nodes: Vec<Rendered<RawNode>>,

    #[serde(rename = "collaboration_connections")]
    pub collaboration: Vec<Rendered<RawEdge>>,

    #[serde(rename = "data_connections")]
    pub data: Vec<Rendered<RawEdge>>,

    #[serde(rename = "funding_connections")]
    pub funding: Vec<Rendered<RawEdge>>,

    #[serde(rename = "investment_connections")]
    pub investment: Vec<Rendered<RawEdge>>,
}

/// Rendered nodes and edges only; markers stripped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilteredDataset {
    pub nodes: Vec<RawNode>,
    pub collaboration: Vec<RawEdge>,
    pub data: Vec<RawEdge>,
    pub funding: Vec<RawEdge>,
    pub investment: Vec<RawEdge>,
}

impl Dataset {
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Drop everything not rendered. Nodes first, then each edge class.
    pub fn into_rendered(self) -> FilteredDataset {
        FilteredDataset {
            nodes: filter_rendered(self.nodes),
            collaboration: filter_rendered(self.collaboration),
            data: filter_rendered(self.data),
            funding: filter_rendered(self.funding),
            investment: filter_rendered(self.investment),
        }
    }
}

impl FilteredDataset {
    pub fn edges(&self, kind: EdgeKind) -> &[RawEdge] {
        match kind {
            EdgeKind::Collaboration => &self.collaboration,
            EdgeKind::Data => &self.data,
            EdgeKind::Funding => &self.funding,
            EdgeKind::Investment => &self.investment,
        }
    }

    pub fn edge_count(&self) -> usize {
        EdgeKind::LINK_ORDER.iter().map(|k| self.edges(*k).len()).sum()
    }
}

/// A parsed dataset plus the SHA-256 of the bytes it came from.
#[derive(Debug, Clone)]
pub struct LoadedDataset {
    pub dataset: Dataset,
    pub sha256: String,
}

pub fn load_dataset(path: &Path) -> Result<LoadedDataset> {
    let bytes = std::fs::read(path).map_err(|source| ImportError::DatasetRead {
        path: path.to_path_buf(),
        source,
    })?;

    parse_dataset(&bytes, path)
}

/// Parse an in-memory document. `origin` is only used in error messages.
pub fn parse_dataset(bytes: &[u8], origin: &Path) -> Result<LoadedDataset> {
    let dataset: Dataset =
        serde_json::from_slice(bytes).map_err(|source| ImportError::DatasetFormat {
            path: origin.to_path_buf(),
            source,
        })?;

    let sha256 = format!("{:x}", Sha256::digest(bytes));

    tracing::debug!(
        nodes = dataset.nodes.len(),
        collaboration = dataset.collaboration.len(),
        data = dataset.data.len(),
        funding = dataset.funding.len(),
        investment = dataset.investment.len(),
        "parsed dataset"
    );

    Ok(LoadedDataset { dataset, sha256 })
}

// ============================================================================
// LENIENT FIELDS
// ============================================================================

fn nullable_list<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        Some(other) => {
            return Err(serde::de::Error::custom(format!(
                "expected text, found {}",
                other
            )))
        }
    })
}
