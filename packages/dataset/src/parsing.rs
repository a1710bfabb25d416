//! Geometry and timestamp parsing for raw impact records.
//!
//! Geometry arrives as WKT (optionally prefixed with a CRS IRI or an EWKT
//! `SRID=` marker). Timestamps arrive either as explicit ISO-like begin/end
//! values or as a combined `YYYY-MM-DD HH...` label.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use geo::{Area, Centroid, Geometry, LineString, Polygon};
use wkt::TryFromWkt;

/// Zoned formats tried after RFC 3339.
const ZONED_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%:z",
];

/// Offset-less formats, read as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

/// Parses a WKT string into a single polygon.
///
/// Multi-polygons are reduced to the member with the largest exterior ring
/// (see [`largest_polygon`]). Non-polygonal geometries yield `None`.
#[must_use]
pub fn parse_wkt_polygon(wkt: &str) -> Option<Polygon<f64>> {
    let geometry = Geometry::<f64>::try_from_wkt_str(strip_crs(wkt)).ok()?;

    match geometry {
        Geometry::Polygon(polygon) => Some(polygon),
        Geometry::MultiPolygon(multi) => largest_polygon(multi.0),
        _ => None,
    }
}

/// Strips a leading `<crs-iri>` or `SRID=n;` prefix.
fn strip_crs(wkt: &str) -> &str {
    let mut s = wkt.trim();
    if s.starts_with('<') {
        if let Some(end) = s.find('>') {
            s = s[end + 1..].trim_start();
        }
    }
    if s.get(..5).is_some_and(|p| p.eq_ignore_ascii_case("SRID=")) {
        if let Some(end) = s.find(';') {
            s = s[end + 1..].trim_start();
        }
    }
    s
}

/// Picks the polygon whose exterior ring encloses the largest area.
///
/// Only a strictly greater area replaces the current pick, so the first
/// polygon wins ties.
#[must_use]
pub fn largest_polygon(polygons: impl IntoIterator<Item = Polygon<f64>>) -> Option<Polygon<f64>> {
    let mut best: Option<(f64, Polygon<f64>)> = None;

    for polygon in polygons {
        let area = ring_area(polygon.exterior());
        match &best {
            Some((best_area, _)) if area <= *best_area => {}
            _ => best = Some((area, polygon)),
        }
    }

    best.map(|(_, polygon)| polygon)
}

/// Unsigned shoelace area of a ring.
#[must_use]
pub fn ring_area(ring: &LineString<f64>) -> f64 {
    Polygon::new(ring.clone(), vec![]).unsigned_area()
}

/// Area-weighted centroid of a ring as `[lon, lat]`.
#[must_use]
pub fn ring_centroid(ring: &LineString<f64>) -> Option<[f64; 2]> {
    Polygon::new(ring.clone(), vec![])
        .centroid()
        .map(|point| [point.x(), point.y()])
        .filter(|[x, y]| x.is_finite() && y.is_finite())
}

/// Parses an explicit timestamp to epoch milliseconds.
///
/// Every `+` is read as `-` before parsing, so `+05:00` offsets are treated
/// as `-05:00`. Values without an offset are read as UTC.
#[must_use]
pub fn parse_timestamp(value: &str) -> Option<i64> {
    let s = value.trim().replace('+', "-");

    if let Ok(dt) = DateTime::parse_from_rfc3339(&s) {
        return Some(dt.timestamp_millis());
    }
    for format in ZONED_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(&s, format) {
            return Some(dt.timestamp_millis());
        }
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&s, format) {
            return Some(naive.and_utc().timestamp_millis());
        }
    }

    NaiveDate::parse_from_str(&s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().timestamp_millis())
}

/// Parses a combined time label such as `"2005-08-29 10:00:00 CDT"`.
///
/// Only the date and hour are used: the first 13 characters with the
/// separator at position 10 replaced by `T`, read as `HH:00:00` UTC.
#[must_use]
pub fn parse_time_label(label: &str) -> Option<i64> {
    let head = label.trim().get(..13)?;
    let date = head.get(..10)?;
    let hour = head.get(11..)?;

    let s = format!("{date}T{hour}:00:00");
    NaiveDateTime::parse_from_str(&s, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc().timestamp_millis())
}
