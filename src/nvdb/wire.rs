//! Wire types that mirror the NVDB road-object JSON exactly.
//!
//! Validation happens at this parse boundary: a body without an `objekter`
//! list fails to deserialize and is treated as a transient upstream error,
//! never as "zero records". Individual records are tolerant - the upstream
//! schema varies across pages, and a record missing geometry or properties
//! is still stored with null fields.

use serde::Deserialize;
use serde_json::Value;

use crate::record::canonical_id;

/// Property name carrying the speed-limit value.
pub const SPEED_LIMIT_PROPERTY: &str = "Fartsgrense";

/// One page of the road-object listing.
#[derive(Debug, Deserialize)]
pub struct WirePage {
    /// The page's record list. Required: its absence means the body is not
    /// a road-object page.
    pub objekter: Vec<WireRoadObject>,
    /// Pagination metadata. Absent metadata means no continuation.
    #[serde(default)]
    pub metadata: Option<WireMetadata>,
}

impl WirePage {
    /// The declared total record count, present on the first page.
    pub fn declared_total(&self) -> Option<u64> {
        self.metadata.as_ref().and_then(|m| m.totalt)
    }

    /// The continuation URL for the next page, if any. Its absence signals
    /// that the listing is complete.
    pub fn next_href(&self) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|m| m.neste.as_ref())
            .map(|n| n.href.as_str())
    }
}

/// Pagination metadata attached to each page.
#[derive(Debug, Deserialize)]
pub struct WireMetadata {
    /// Records returned in this page.
    #[serde(default)]
    pub returnert: Option<u64>,
    /// Total records matching the query; declared on the first page.
    #[serde(default)]
    pub totalt: Option<u64>,
    /// Reference to the next page. Absent on the last page.
    #[serde(default)]
    pub neste: Option<WireNextRef>,
}

/// Continuation reference: an opaque start token plus the full next-page URL.
#[derive(Debug, Deserialize)]
pub struct WireNextRef {
    #[serde(default)]
    pub start: Option<String>,
    pub href: String,
}

/// One raw road object. Every field is optional on the wire.
#[derive(Debug, Deserialize)]
pub struct WireRoadObject {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub geometri: Option<WireGeometry>,
    #[serde(default)]
    pub egenskaper: Vec<WireProperty>,
}

impl WireRoadObject {
    /// The stable identifier in canonical string form, or `None` when the
    /// record does not expose a usable id.
    pub fn canonical_id(&self) -> Option<String> {
        self.id.as_ref().and_then(canonical_id)
    }

    /// The raw WKT geometry encoding, if present.
    pub fn wkt(&self) -> Option<&str> {
        self.geometri.as_ref().and_then(|g| g.wkt.as_deref())
    }

    /// The speed-limit value: the `verdi` of the property named
    /// `Fartsgrense`, accepted as a JSON number or a numeric string.
    pub fn speed_limit(&self) -> Option<i64> {
        self.egenskaper
            .iter()
            .find(|p| p.navn.as_deref() == Some(SPEED_LIMIT_PROPERTY))
            .and_then(|p| p.verdi.as_ref())
            .and_then(coerce_speed)
    }
}

/// Geometry section of a road object.
#[derive(Debug, Deserialize)]
pub struct WireGeometry {
    #[serde(default)]
    pub wkt: Option<String>,
    #[serde(default)]
    pub srid: Option<u32>,
}

/// One entry of a road object's property list.
#[derive(Debug, Deserialize)]
pub struct WireProperty {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub navn: Option<String>,
    #[serde(default)]
    pub verdi: Option<Value>,
}

fn coerce_speed(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> WirePage {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn full_page_parses() {
        let page = parse(json!({
            "objekter": [
                {
                    "id": 78342101,
                    "geometri": { "wkt": "LINESTRING Z (58.9 5.7 1.0, 59.0 5.8 2.0)", "srid": 4326 },
                    "egenskaper": [
                        { "id": 5962, "navn": "Fartsgrense", "verdi": 60 },
                        { "id": 1, "navn": "Annet", "verdi": "x" }
                    ]
                }
            ],
            "metadata": {
                "returnert": 1,
                "totalt": 12345,
                "neste": { "start": "abc", "href": "https://example.com/vegobjekter/105?start=abc" }
            }
        }));

        assert_eq!(page.objekter.len(), 1);
        assert_eq!(page.declared_total(), Some(12345));
        assert_eq!(
            page.next_href(),
            Some("https://example.com/vegobjekter/105?start=abc")
        );

        let object = &page.objekter[0];
        assert_eq!(object.canonical_id(), Some("78342101".to_string()));
        assert_eq!(object.speed_limit(), Some(60));
        assert!(object.wkt().unwrap().starts_with("LINESTRING"));
    }

    #[test]
    fn missing_objekter_is_a_parse_error() {
        let result: Result<WirePage, _> =
            serde_json::from_value(json!({ "metadata": { "returnert": 0 } }));
        assert!(result.is_err());
    }

    #[test]
    fn last_page_has_no_next_href() {
        let page = parse(json!({
            "objekter": [],
            "metadata": { "returnert": 0 }
        }));
        assert_eq!(page.next_href(), None);
        assert_eq!(page.declared_total(), None);
    }

    #[test]
    fn page_without_metadata_parses() {
        let page = parse(json!({ "objekter": [] }));
        assert_eq!(page.next_href(), None);
    }

    #[test]
    fn sparse_records_parse_with_null_fields() {
        let page = parse(json!({
            "objekter": [ { "id": "991" }, {} ],
            "metadata": {}
        }));

        assert_eq!(page.objekter[0].canonical_id(), Some("991".to_string()));
        assert_eq!(page.objekter[0].speed_limit(), None);
        assert_eq!(page.objekter[0].wkt(), None);
        assert_eq!(page.objekter[1].canonical_id(), None);
    }

    #[test]
    fn speed_limit_accepts_numeric_strings() {
        let page = parse(json!({
            "objekter": [
                {
                    "id": 1,
                    "egenskaper": [ { "navn": "Fartsgrense", "verdi": " 80 " } ]
                },
                {
                    "id": 2,
                    "egenskaper": [ { "navn": "Fartsgrense", "verdi": "fast" } ]
                }
            ]
        }));

        assert_eq!(page.objekter[0].speed_limit(), Some(80));
        assert_eq!(page.objekter[1].speed_limit(), None);
    }
}
