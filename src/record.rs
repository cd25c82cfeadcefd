//! The persisted record shape and its canonical ordering.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A GeoJSON-style line geometry: an ordered sequence of `[longitude,
/// latitude]` pairs. Order defines the path and is preserved through every
/// conversion step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineString {
    /// Always `"LineString"`.
    #[serde(rename = "type")]
    pub kind: String,
    pub coordinates: Vec<[f64; 2]>,
}

impl LineString {
    pub fn new(coordinates: Vec<[f64; 2]>) -> Self {
        Self {
            kind: "LineString".to_string(),
            coordinates,
        }
    }
}

/// One harvested speed-limit segment.
///
/// `id` is the stable upstream identifier and is always present and
/// non-empty; geometry and speed value are optional metadata, stored as null
/// rather than dropped when the upstream record does not expose them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeedLimitRecord {
    pub id: String,
    pub geometry: Option<LineString>,
    pub speed_limit: Option<i64>,
}

/// Canonical ordering over record identifiers: numeric when both ids parse
/// as integers (NVDB ids are numeric), lexicographic otherwise. Used by the
/// merge and split tools so the canonical dataset sorts `9` before `10`.
pub fn compare_ids(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        _ => a.cmp(b),
    }
}

/// Coerces a JSON value into the canonical string form of an identifier.
/// Numbers render as their decimal form; strings are trimmed. Anything else
/// (or an empty string) yields `None` - such records are never admitted to
/// the dedup index.
pub fn canonical_id(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        _ => None,
    }
}
