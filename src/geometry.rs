//! WKT linear-geometry conversion.
//!
//! NVDB returns geometry as WKT with coordinates in latitude/longitude
//! order (northing first for SRID 4326). The output is always
//! `[longitude, latitude]` - the axis swap relative to the source field
//! order is the required normalization, not a bug.

use crate::record::LineString;

/// Parses a WKT linear encoding of the form `TAG(x y, x y, ...)`, including
/// dimensioned tags such as `LINESTRING Z (...)`, into a [`LineString`].
///
/// Each coordinate is two or more whitespace-separated numbers; dimensions
/// past the second are ignored, and pairs with fewer than two numbers are
/// skipped. Returns `None` on any parse failure (missing parentheses, a
/// number that does not parse, or no usable pairs): geometry is optional
/// metadata and never load-bearing for the harvest.
pub fn convert_wkt_linestring(raw: &str) -> Option<LineString> {
    let open = raw.find('(')?;
    let close = raw.rfind(')')?;
    if close <= open {
        return None;
    }
    let body = &raw[open + 1..close];

    let mut coordinates = Vec::new();
    for pair in body.split(',') {
        let mut parts = pair.split_whitespace();
        let (Some(first), Some(second)) = (parts.next(), parts.next()) else {
            continue;
        };
        let first: f64 = first.parse().ok()?;
        let second: f64 = second.parse().ok()?;
        // Source order is (lat, lon); output is always [lon, lat].
        coordinates.push([second, first]);
    }

    if coordinates.is_empty() {
        return None;
    }
    Some(LineString::new(coordinates))
}
