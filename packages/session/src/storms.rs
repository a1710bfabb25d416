//! Storm registry, storm tracks, and track impact buffers.
//!
//! The registry (landfall markers and the list of storms with precomputed
//! impact records) is embedded at compile time from `storms/storms.toml`.

use geo::Point;
use serde::Deserialize;
use storm_impact_dataset::sparql::parse_bindings;
use storm_impact_dataset_models::{RawRecord, TaggedValue};
use storm_impact_visualization::format::{parse_unit, term_translate};
use wkt::TryFromWkt;

use crate::{RegistryError, SessionError};

/// Registry TOML embedded at compile time.
const STORMS_TOML: &str = include_str!("../storms/storms.toml");

/// Saffir-Simpson lower bounds in knots (exclusive).
const CATEGORY_THRESHOLDS: [f64; 5] = [64.0, 83.0, 96.0, 113.0, 137.0];

/// Vertices of an impact buffer circle, before closing.
pub const BUFFER_PRECISION: usize = 16;

/// A storm marker on the landfall map.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Landfall {
    /// Storm name, capitalized.
    pub name: String,
    /// Season.
    pub year: u16,
    /// Landfall location, `[lon, lat]`.
    pub coordinates: [f64; 2],
}

impl Landfall {
    /// The storm identifier used by the track queries (`"KATRINA 2005"`).
    #[must_use]
    pub fn storm_id(&self) -> String {
        format!("{} {}", self.name.to_uppercase(), self.year)
    }
}

/// Where a storm's track comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackSource {
    /// Knowledge-graph track query by storm identifier.
    Query(String),
    /// Latest forecast feed.
    LatestFeed(String),
}

/// Where a storm's impact records come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImpactSource {
    /// Static result file named after the storm.
    Precomputed(String),
    /// Counties intersecting the buffered track.
    TrackBuffers,
}

/// Storm registry.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StormRegistry {
    /// Storms after this season read their track from the latest feed.
    pub latest_feed_after_year: u16,
    /// URL of the latest forecast track feed.
    pub latest_track_feed: String,
    /// Lowercase `"name year"` identifiers with precomputed impacts.
    pub precomputed: Vec<String>,
    /// Landfall markers.
    #[serde(rename = "landfall")]
    pub landfalls: Vec<Landfall>,
}

impl StormRegistry {
    /// Parses a registry from TOML.
    ///
    /// # Errors
    ///
    /// * If the TOML is malformed or missing required fields
    pub fn parse(toml_str: &str) -> Result<Self, RegistryError> {
        Ok(toml::de::from_str(toml_str)?)
    }

    /// Returns the embedded registry.
    ///
    /// # Panics
    ///
    /// Panics if the embedded TOML is malformed (this is a compile-time
    /// guarantee since the file is embedded).
    #[must_use]
    pub fn load() -> Self {
        Self::parse(STORMS_TOML).unwrap_or_else(|e| panic!("Failed to parse storms.toml: {e}"))
    }

    /// Whether the storm's impact records ship precomputed.
    #[must_use]
    pub fn is_precomputed(&self, storm: &str) -> bool {
        let storm = storm.to_lowercase();
        self.precomputed.iter().any(|s| *s == storm)
    }

    /// Where to load the storm's track from.
    #[must_use]
    pub fn track_source(&self, storm: &str) -> TrackSource {
        match storm_year(storm) {
            Some(year) if year > self.latest_feed_after_year => {
                TrackSource::LatestFeed(self.latest_track_feed.clone())
            }
            _ => TrackSource::Query(storm.to_string()),
        }
    }

    /// Where to load the storm's impact records from.
    #[must_use]
    pub fn impact_source(&self, storm: &str) -> ImpactSource {
        if self.is_precomputed(storm) {
            ImpactSource::Precomputed(render_storm_name(storm, true))
        } else {
            ImpactSource::TrackBuffers
        }
    }
}

fn storm_year(storm: &str) -> Option<u16> {
    storm.split_whitespace().nth(1)?.parse().ok()
}

/// Renders `"KATRINA 2005"` as `"Katrina (2005)"`, or `"Katrina"` when
/// `name_only` is set or the year is missing.
#[must_use]
pub fn render_storm_name(raw: &str, name_only: bool) -> String {
    let mut parts = raw.split_whitespace();
    let name = parts.next().map_or_else(String::new, |name| {
        let mut chars = name.chars();
        chars.next().map_or_else(String::new, |first| {
            first.to_uppercase().chain(chars.as_str().to_lowercase().chars()).collect()
        })
    });

    match parts.next() {
        Some(year) if !name_only => format!("{name} ({year})"),
        _ => name,
    }
}

/// Saffir-Simpson category of a wind speed in knots. `0` below hurricane
/// strength.
#[must_use]
pub fn speed_to_category(wind_speed: f64) -> u8 {
    let mut category = 0;
    for threshold in CATEGORY_THRESHOLDS {
        if wind_speed > threshold {
            category += 1;
        } else {
            break;
        }
    }
    category
}

/// One observation along a storm track.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackPoint {
    /// Storm center, `[lon, lat]`.
    pub coordinates: [f64; 2],
    /// Observation time (UTC, ISO 8601).
    pub time: String,
    /// Wind speed in knots.
    pub wind_speed: f64,
    /// Minimum pressure.
    pub pressure: Option<f64>,
    /// Storm classification code (`TS`, `H1`, ...).
    pub category: Option<String>,
}

impl TrackPoint {
    /// Parses a track query binding (`wkt`, `time`, `windSpeed`, `pressure`,
    /// `category`).
    ///
    /// # Errors
    ///
    /// * If `wkt`, `time`, or `windSpeed` is missing
    /// * If `wkt` is not a point or `windSpeed` is not a number
    pub fn from_record(record: &RawRecord) -> Result<Self, SessionError> {
        let wkt = required(record, "wkt")?;
        let point = Point::<f64>::try_from_wkt_str(wkt)
            .map_err(|_| SessionError::InvalidGeometry(wkt.to_string()))?;

        Ok(Self {
            coordinates: [point.x(), point.y()],
            time: required(record, "time")?.to_string(),
            wind_speed: number(record, "windSpeed")?,
            pressure: record.get("pressure").and_then(TaggedValue::as_f64),
            category: record.get("category").map(|v| v.value.clone()),
        })
    }

    /// Buffer around the point, its radius in degrees one more than the
    /// storm category.
    #[must_use]
    pub fn impact_buffer(&self) -> ImpactBuffer {
        let radius = f64::from(speed_to_category(self.wind_speed) + 1);
        ImpactBuffer::circle(self.coordinates, radius, BUFFER_PRECISION)
    }
}

/// Parses a storm track document.
///
/// Accepts a SPARQL results document or a bare array of bindings (the
/// latest-feed format). Unparseable points are skipped.
///
/// # Errors
///
/// * If the document is neither form
pub fn parse_track(json: &str) -> Result<Vec<TrackPoint>, SessionError> {
    let records = match parse_bindings(json) {
        Ok(records) => records,
        Err(_) => serde_json::from_str::<Vec<RawRecord>>(json)?,
    };

    Ok(records
        .iter()
        .filter_map(|record| match TrackPoint::from_record(record) {
            Ok(point) => Some(point),
            Err(e) => {
                log::debug!("Skipping track point: {e}");
                None
            }
        })
        .collect())
}

/// The track as a WKT `LINESTRING`.
#[must_use]
pub fn track_line_wkt(track: &[TrackPoint]) -> String {
    let coords: Vec<String> = track
        .iter()
        .map(|p| format!("{} {}", p.coordinates[0], p.coordinates[1]))
        .collect();
    format!("LINESTRING({})", coords.join(","))
}

/// A closed circle polygon approximating a storm's impact area.
#[derive(Debug, Clone, PartialEq)]
pub struct ImpactBuffer {
    /// Ring vertices, `[lon, lat]`, first vertex repeated at the end.
    pub coords: Vec<[f64; 2]>,
}

impl ImpactBuffer {
    /// Circle of `precision` vertices around `center`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn circle(center: [f64; 2], radius: f64, precision: usize) -> Self {
        let [x, y] = center;
        let mut coords: Vec<[f64; 2]> = (0..precision)
            .map(|i| {
                let rad = std::f64::consts::TAU * i as f64 / precision as f64;
                [radius.mul_add(rad.cos(), x), radius.mul_add(rad.sin(), y)]
            })
            .collect();
        if let Some(first) = coords.first().copied() {
            coords.push(first);
        }
        Self { coords }
    }

    /// WKT `POLYGON` with three-decimal coordinates.
    #[must_use]
    pub fn wkt(&self) -> String {
        let ring: Vec<String> = self
            .coords
            .iter()
            .map(|[x, y]| format!("{x:.3} {y:.3}"))
            .collect();
        format!("POLYGON(({}))", ring.join(","))
    }
}

/// A storm in the storm list.
#[derive(Debug, Clone, PartialEq)]
pub struct StormListEntry {
    /// Storm identifier (`"KATRINA 2005"`).
    pub name: String,
    /// Display title (`"Katrina (2005)"`).
    pub title: String,
    /// Start date.
    pub time: Option<String>,
    /// Maximum wind speed with unit URI.
    pub wind_speed: Option<TaggedValue>,
    /// Minimum pressure with unit URI.
    pub pressure: Option<TaggedValue>,
    /// Peak classification code.
    pub category: Option<String>,
}

impl StormListEntry {
    /// Parses a storm list binding.
    ///
    /// # Errors
    ///
    /// * If `name` is missing
    pub fn from_record(record: &RawRecord) -> Result<Self, SessionError> {
        let name = required(record, "name")?;
        Ok(Self {
            name: name.to_string(),
            title: render_storm_name(name, false),
            time: record.get("time").map(|v| v.value.clone()),
            wind_speed: record.get("windSpeed").cloned(),
            pressure: record.get("pressure").cloned(),
            category: record.get("category").map(|v| v.value.clone()),
        })
    }

    /// Detail lines shown under the title in the storm list.
    #[must_use]
    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(category) = &self.category {
            lines.push(format!("Category: {}", term_translate(category)));
        }
        if let Some(wind) = &self.wind_speed {
            lines.push(format!("Max Wind Speed: {}", with_unit(wind)));
        }
        if let Some(pressure) = &self.pressure {
            lines.push(format!("Min Pressure: {}", with_unit(pressure)));
        }
        lines
    }
}

fn with_unit(value: &TaggedValue) -> String {
    match &value.datatype {
        Some(unit) => format!("{} {}", value.value, parse_unit(unit)),
        None => value.value.clone(),
    }
}

/// Parses the storm list query result. Bindings without a name are
/// skipped.
///
/// # Errors
///
/// * If the document is not a SPARQL results document
pub fn parse_storm_list(json: &str) -> Result<Vec<StormListEntry>, SessionError> {
    Ok(parse_bindings(json)?
        .iter()
        .filter_map(|record| StormListEntry::from_record(record).ok())
        .collect())
}

fn required<'a>(record: &'a RawRecord, field: &'static str) -> Result<&'a str, SessionError> {
    record
        .get(field)
        .map(|v| v.value.as_str())
        .ok_or(SessionError::MissingField(field))
}

fn number(record: &RawRecord, field: &'static str) -> Result<f64, SessionError> {
    let value = required(record, field)?;
    record
        .get(field)
        .and_then(TaggedValue::as_f64)
        .ok_or_else(|| SessionError::InvalidNumber {
            field,
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binding(fields: &[(&str, &str)]) -> RawRecord {
        fields
            .iter()
            .map(|(k, v)| ((*k).to_string(), TaggedValue::new(*v)))
            .collect()
    }

    #[test]
    fn loads_embedded_registry() {
        let registry = StormRegistry::load();
        assert_eq!(registry.landfalls.len(), 9);
        assert_eq!(registry.landfalls[0].storm_id(), "KATRINA 2005");
        assert!(registry.is_precomputed("KATRINA 2005"));
        assert!(!registry.is_precomputed("MARIA 2017"));
    }

    #[test]
    fn track_source_by_year() {
        let registry = StormRegistry::load();
        assert_eq!(
            registry.track_source("IAN 2022"),
            TrackSource::LatestFeed(registry.latest_track_feed.clone())
        );
        assert_eq!(
            registry.track_source("IKE 2008"),
            TrackSource::Query("IKE 2008".to_string())
        );
        assert_eq!(
            registry.impact_source("SANDY 2012"),
            ImpactSource::Precomputed("Sandy".to_string())
        );
        assert_eq!(registry.impact_source("MARIA 2017"), ImpactSource::TrackBuffers);
    }

    #[test]
    fn malformed_registry_is_an_error() {
        assert!(StormRegistry::parse("precomputed = 3").is_err());
    }

    #[test]
    fn renders_storm_names() {
        assert_eq!(render_storm_name("KATRINA 2005", false), "Katrina (2005)");
        assert_eq!(render_storm_name("KATRINA 2005", true), "Katrina");
        assert_eq!(render_storm_name("ian", false), "Ian");
        assert_eq!(render_storm_name("", false), "");
    }

    #[test]
    fn categories_follow_thresholds() {
        assert_eq!(speed_to_category(50.0), 0);
        assert_eq!(speed_to_category(64.0), 0);
        assert_eq!(speed_to_category(65.0), 1);
        assert_eq!(speed_to_category(100.0), 3);
        assert_eq!(speed_to_category(150.0), 5);
    }

    #[test]
    fn buffer_is_closed_circle() {
        let buffer = ImpactBuffer::circle([-90.0, 29.0], 2.0, BUFFER_PRECISION);
        assert_eq!(buffer.coords.len(), BUFFER_PRECISION + 1);
        assert_eq!(buffer.coords.first(), buffer.coords.last());
        assert!(buffer.wkt().starts_with("POLYGON((-88.000 29.000,"));
        assert!(buffer.wkt().ends_with("-88.000 29.000))"));
    }

    #[test]
    fn buffer_radius_grows_with_category() {
        let point = TrackPoint {
            coordinates: [0.0, 0.0],
            time: "2005-08-29T12:00:00Z".to_string(),
            wind_speed: 100.0,
            pressure: None,
            category: None,
        };
        let buffer = point.impact_buffer();
        assert!((buffer.coords[0][0] - 4.0).abs() < 1e-12);
    }

    #[test]
    fn parses_track_points() {
        let json = r#"[
            {"wkt": {"value": "POINT (-89.6 29.3)"}, "time": {"value": "2005-08-29T11:00:00Z"},
             "windSpeed": {"value": "110"}, "category": {"value": "H3"}},
            {"wkt": {"value": "POINT (-89.7 30.1)"}, "time": {"value": "2005-08-29T17:00:00Z"},
             "windSpeed": {"value": "fast"}}
        ]"#;
        let track = parse_track(json).unwrap();
        assert_eq!(track.len(), 1);
        assert_eq!(track[0].coordinates, [-89.6, 29.3]);
        assert_eq!(track[0].category.as_deref(), Some("H3"));
        assert_eq!(track_line_wkt(&track), "LINESTRING(-89.6 29.3)");
    }

    #[test]
    fn track_point_requires_point_geometry() {
        let record = binding(&[
            ("wkt", "LINESTRING (0 0, 1 1)"),
            ("time", "t"),
            ("windSpeed", "10"),
        ]);
        assert!(matches!(
            TrackPoint::from_record(&record),
            Err(SessionError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn storm_list_entries() {
        let json = r#"{"results": {"bindings": [
            {"name": {"value": "KATRINA 2005"},
             "windSpeed": {"value": "150", "datatype": "http://qudt.org/vocab/unit/KN"},
             "pressure": {"value": "902", "datatype": "http://qudt.org/vocab/unit/HectoPA"},
             "category": {"value": "H5"}},
            {"time": {"value": "2005-08-23"}}
        ]}}"#;
        let storms = parse_storm_list(json).unwrap();
        assert_eq!(storms.len(), 1);
        assert_eq!(storms[0].title, "Katrina (2005)");
        assert_eq!(
            storms[0].summary_lines(),
            vec![
                "Category: Hurricane 5".to_string(),
                "Max Wind Speed: 150 Knot".to_string(),
                "Min Pressure: 902 hPa".to_string(),
            ]
        );
    }
}
