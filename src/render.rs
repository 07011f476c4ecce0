// 👁️ Render Filter - keep only elements the source graph actually displays
//
// Every node and edge in the source carries `render: 0|1`. The marker lives on
// the envelope, not the record, so stripping it is just unwrapping.

use serde::{Deserialize, Deserializer};

/// Source record with its render marker still attached.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Rendered<T> {
    pub render: RenderFlag,

    #[serde(flatten)]
    pub record: T,
}

impl<T> Rendered<T> {
    pub fn new(record: T, rendered: bool) -> Self {
        Rendered {
            render: RenderFlag(rendered),
            record,
        }
    }

    pub fn is_rendered(&self) -> bool {
        self.render.0
    }
}

/// `1` (in any numeric spelling) or `true` means rendered; anything else does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderFlag(pub bool);

impl<'de> Deserialize<'de> for RenderFlag {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        let rendered = match value {
            serde_json::Value::Bool(b) => b,
            serde_json::Value::Number(n) => n.as_f64() == Some(1.0),
            other => {
                return Err(serde::de::Error::custom(format!(
                    "render must be 0/1 or a boolean, found {}",
                    other
                )))
            }
        };
        Ok(RenderFlag(rendered))
    }
}

/// Subsequence of `records` marked rendered, markers removed.
pub fn filter_rendered<T>(records: Vec<Rendered<T>>) -> Vec<T> {
    records
        .into_iter()
        .filter(Rendered::is_rendered)
        .map(|r| r.record)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::RawEdge;

    fn edge(source: i64, target: i64) -> RawEdge {
        RawEdge {
            source,
            target,
            amount: None,
            year: None,
        }
    }

    #[test]
    fn test_filter_keeps_rendered_in_order() {
        let input = vec![
            Rendered::new(edge(1, 2), true),
            Rendered::new(edge(2, 3), false),
            Rendered::new(edge(3, 4), true),
        ];

        let output = filter_rendered(input.clone());

        assert!(output.len() <= input.len());
        assert_eq!(output, vec![edge(1, 2), edge(3, 4)]);
        for kept in &output {
            assert!(input.iter().any(|r| r.is_rendered() && &r.record == kept));
        }
    }

    #[test]
    fn test_filter_all_unrendered() {
        let input = vec![Rendered::new(edge(1, 2), false)];
        assert!(filter_rendered(input).is_empty());
    }

    #[test]
    fn test_render_flag_forms() {
        let one: Rendered<RawEdge> =
            serde_json::from_str(r#"{"source": 1, "target": 2, "render": 1}"#).unwrap();
        let zero: Rendered<RawEdge> =
            serde_json::from_str(r#"{"source": 1, "target": 2, "render": 0}"#).unwrap();
        let yes: Rendered<RawEdge> =
            serde_json::from_str(r#"{"source": 1, "target": 2, "render": true}"#).unwrap();
        let float_one: Rendered<RawEdge> =
            serde_json::from_str(r#"{"source": 1, "target": 2, "render": 1.0}"#).unwrap();
        let half: Rendered<RawEdge> =
            serde_json::from_str(r#"{"source": 1, "target": 2, "render": 0.5}"#).unwrap();

        assert!(one.is_rendered());
        assert!(!zero.is_rendered());
        assert!(yes.is_rendered());
        assert!(float_one.is_rendered());
        assert!(!half.is_rendered());
    }

    #[test]
    fn test_missing_render_marker_rejected() {
        let result: Result<Rendered<RawEdge>, _> =
            serde_json::from_str(r#"{"source": 1, "target": 2}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_stripped_record_has_no_marker() {
        let parsed: Rendered<RawEdge> =
            serde_json::from_str(r#"{"source": 5, "target": 6, "render": 1}"#).unwrap();
        let kept = filter_rendered(vec![parsed]);
        let json = serde_json::to_value(&kept[0]).unwrap();

        assert!(json.get("render").is_none());
        assert_eq!(json["source"], 5);
    }
}
