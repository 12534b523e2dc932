//! Decodes the polygon stored in an index row's `polygon_bytes`.
//!
//! Two on-disk encodings are supported for backward compatibility: a legacy
//! nested-JSON-array form and the current WKT form. The byte sequence is
//! sniffed, never chosen by a database version flag, so old and new rows
//! can coexist in the same index.

use crate::error::CoreError;
use crate::model::GeometryShape;
use geo_types::{Coord, LineString, MultiPolygon, Polygon};

/// Minimum number of points a ring must have, including its closing point.
const MIN_RING_POINTS: usize = 4;

/// Decodes `bytes` into a polygon or multipolygon, sniffing the encoding
/// from its first non-whitespace bytes.
pub fn decode(bytes: &[u8]) -> Result<GeometryShape, CoreError> {
    let trimmed = trim_leading_ws(bytes);
    if trimmed.starts_with(b"[[[") {
        decode_legacy_json(trimmed)
    } else {
        let text = std::str::from_utf8(trimmed)
            .map_err(|e| CoreError::BadGeometry(format!("not valid utf-8: {e}")))?;
        decode_wkt(text)
    }
}

fn trim_leading_ws(bytes: &[u8]) -> &[u8] {
    let mut i = 0;
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    &bytes[i..]
}

/// Parses `[[[x,y], ...], [...]]` — a sequence of rings, ring 0 exterior,
/// the rest holes.
fn decode_legacy_json(bytes: &[u8]) -> Result<GeometryShape, CoreError> {
    let value: serde_json::Value = serde_json::from_slice(bytes)?;
    let rings_json = value
        .as_array()
        .ok_or_else(|| CoreError::BadGeometry("legacy polygon is not a JSON array".into()))?;

    let mut rings = Vec::with_capacity(rings_json.len());
    for ring_json in rings_json {
        rings.push(parse_legacy_ring(ring_json)?);
    }
    if rings.is_empty() {
        return Err(CoreError::BadGeometry("polygon has no rings".into()));
    }
    let exterior = rings.remove(0);
    Ok(GeometryShape::Polygon(Polygon::new(exterior, rings)))
}

fn parse_legacy_ring(ring_json: &serde_json::Value) -> Result<LineString<f64>, CoreError> {
    let points_json = ring_json
        .as_array()
        .ok_or_else(|| CoreError::BadGeometry("ring is not a JSON array".into()))?;
    if points_json.len() < MIN_RING_POINTS {
        return Err(CoreError::BadGeometry(format!(
            "ring has {} points, need at least {MIN_RING_POINTS}",
            points_json.len()
        )));
    }
    let mut coords = Vec::with_capacity(points_json.len());
    for point_json in points_json {
        let pair = point_json
            .as_array()
            .ok_or_else(|| CoreError::BadGeometry("coordinate is not a JSON array".into()))?;
        let x = pair
            .first()
            .and_then(|v| v.as_f64())
            .ok_or_else(|| CoreError::BadGeometry("coordinate missing x".into()))?;
        let y = pair
            .get(1)
            .and_then(|v| v.as_f64())
            .ok_or_else(|| CoreError::BadGeometry("coordinate missing y".into()))?;
        coords.push(Coord { x, y });
    }
    Ok(LineString::new(coords))
}

/// Hand-rolled scanner for `POLYGON((x y, x y, ...), (...))` and
/// `MULTIPOLYGON(((...)), ((...)))` — the only WKT shapes this index
/// stores. A general WKT parser is deliberately avoided; this is a narrow
/// tokenizer over the exact grammar we emit.
fn decode_wkt(text: &str) -> Result<GeometryShape, CoreError> {
    let text = text.trim();
    let upper_prefix: String = text.chars().take(16).collect::<String>().to_uppercase();

    if upper_prefix.starts_with("MULTIPOLYGON") {
        let body = strip_wrapping(text, "MULTIPOLYGON")?;
        let polygons = split_top_level(body)
            .into_iter()
            .map(|poly_body| parse_polygon_body(unwrap_parens(poly_body)?))
            .collect::<Result<Vec<_>, CoreError>>()?;
        Ok(GeometryShape::MultiPolygon(MultiPolygon::new(polygons)))
    } else if upper_prefix.starts_with("POLYGON") {
        let body = strip_wrapping(text, "POLYGON")?;
        Ok(GeometryShape::Polygon(parse_polygon_body(body)?))
    } else {
        Err(CoreError::BadGeometry(format!(
            "unrecognized geometry encoding: {:?}",
            &text[..text.len().min(20)]
        )))
    }
}

fn strip_wrapping<'a>(text: &'a str, keyword: &str) -> Result<&'a str, CoreError> {
    let rest = text[keyword.len()..].trim_start();
    unwrap_parens(rest)
}

fn unwrap_parens(text: &str) -> Result<&str, CoreError> {
    let text = text.trim();
    let text = text
        .strip_prefix('(')
        .ok_or_else(|| CoreError::BadGeometry("expected '(' in WKT body".into()))?;
    let text = text
        .strip_suffix(')')
        .ok_or_else(|| CoreError::BadGeometry("expected ')' in WKT body".into()))?;
    Ok(text.trim())
}

/// Splits a comma-separated list of parenthesized groups at the top
/// nesting level only, so ring separators inside rings don't split early.
fn split_top_level(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0usize;
    for (i, ch) in text.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(text[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    let tail = text[start..].trim();
    if !tail.is_empty() {
        parts.push(tail);
    }
    parts
}

fn parse_polygon_body(body: &str) -> Result<Polygon<f64>, CoreError> {
    let ring_texts = split_top_level(body);
    if ring_texts.is_empty() {
        return Err(CoreError::BadGeometry("polygon has no rings".into()));
    }
    let mut rings = ring_texts
        .into_iter()
        .map(|r| parse_wkt_ring(unwrap_parens(r)?))
        .collect::<Result<Vec<_>, CoreError>>()?;
    let exterior = rings.remove(0);
    Ok(Polygon::new(exterior, rings))
}

fn parse_wkt_ring(text: &str) -> Result<LineString<f64>, CoreError> {
    let points: Vec<&str> = text.split(',').map(str::trim).filter(|s| !s.is_empty()).collect();
    if points.len() < MIN_RING_POINTS {
        return Err(CoreError::BadGeometry(format!(
            "ring has {} points, need at least {MIN_RING_POINTS}",
            points.len()
        )));
    }
    let mut coords = Vec::with_capacity(points.len());
    for point in points {
        let mut fields = point.split_ascii_whitespace();
        let x: f64 = fields
            .next()
            .ok_or_else(|| CoreError::BadGeometry("missing x ordinate".into()))?
            .parse()
            .map_err(|_| CoreError::BadGeometry("non-numeric x ordinate".into()))?;
        let y: f64 = fields
            .next()
            .ok_or_else(|| CoreError::BadGeometry("missing y ordinate".into()))?
            .parse()
            .map_err(|_| CoreError::BadGeometry("non-numeric y ordinate".into()))?;
        coords.push(Coord { x, y });
    }
    Ok(LineString::new(coords))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniffs_legacy_json() {
        let bytes = br#"[[[0,0],[0,10],[10,10],[10,0],[0,0]]]"#;
        let shape = decode(bytes).unwrap();
        assert!(matches!(shape, GeometryShape::Polygon(_)));
    }

    #[test]
    fn parses_wkt_polygon_with_hole() {
        let wkt = "POLYGON((0 0, 0 10, 10 10, 10 0, 0 0), (2 2, 2 4, 4 4, 4 2, 2 2))";
        let shape = decode(wkt.as_bytes()).unwrap();
        match shape {
            GeometryShape::Polygon(p) => assert_eq!(p.interiors().len(), 1),
            _ => panic!("expected polygon"),
        }
    }

    #[test]
    fn parses_multipolygon() {
        let wkt = "MULTIPOLYGON(((0 0, 0 1, 1 1, 1 0, 0 0)), ((2 2, 2 3, 3 3, 3 2, 2 2)))";
        let shape = decode(wkt.as_bytes()).unwrap();
        match shape {
            GeometryShape::MultiPolygon(mp) => assert_eq!(mp.0.len(), 2),
            _ => panic!("expected multipolygon"),
        }
    }

    #[test]
    fn rejects_degenerate_ring() {
        let bytes = br#"[[[0,0],[1,1],[0,0]]]"#;
        assert!(decode(bytes).is_err());
    }

    #[test]
    fn rejects_unrecognized_encoding() {
        assert!(decode(b"GEOGCS[garbage]").is_err());
    }
}
