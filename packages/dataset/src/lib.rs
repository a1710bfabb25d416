#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Normalized hurricane impact dataset.
//!
//! A [`Dataset`] is built once from raw query rows and a health lookup and
//! never mutated afterwards; a changed dataset is a new instance. It owns
//! the normalized records in source order together with the
//! [`DatasetMeta`] computed at construction, and answers the time and
//! statistic queries the visualization widgets make.

pub mod aggregate;
pub mod impact_area;
pub mod normalize;
pub mod parsing;
pub mod record;
pub mod sparql;
pub mod stats;

use std::path::Path;

use storm_impact_dataset_models::{
    EventTypeTotals, FieldMapping, HealthLookup, RawRecord, StatKey, StatSummary, TimeInfo,
};

pub use aggregate::{MISSING_STAT, RegionAggregate, aggregate};
pub use normalize::{DropReason, NormalizedBatch, normalize_records};
pub use record::NormalizedRecord;
pub use stats::DatasetMeta;

/// Errors that can occur while loading a dataset.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error (file read).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Normalized records plus their metadata.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<NormalizedRecord>,
    meta: DatasetMeta,
    mapping: FieldMapping,
}

impl Dataset {
    /// Builds a dataset with the default field mapping.
    #[must_use]
    pub fn new(events: Vec<RawRecord>, health: &HealthLookup) -> Self {
        Self::with_fields(events, health, FieldMapping::default())
    }

    /// Builds a dataset reading the given field names.
    #[must_use]
    pub fn with_fields(events: Vec<RawRecord>, health: &HealthLookup, mapping: FieldMapping) -> Self {
        let batch = normalize_records(events, health, &mapping);
        let meta = DatasetMeta::build(&batch.records);
        debug_assert_eq!(batch.time_info, meta.time_info);

        Self {
            records: batch.records,
            meta,
            mapping,
        }
    }

    /// Builds a dataset from a SPARQL results document and a health lookup
    /// document.
    ///
    /// # Errors
    ///
    /// * If either document is not valid JSON of the expected shape
    pub fn from_sparql_json(events_json: &str, health_json: Option<&str>) -> Result<Self, DatasetError> {
        let events = sparql::parse_bindings(events_json)?;
        let health = health_json
            .map(sparql::parse_health_lookup)
            .transpose()?
            .unwrap_or_default();

        Ok(Self::new(events, &health))
    }

    /// Reads and builds a dataset from files on disk.
    ///
    /// # Errors
    ///
    /// * If a file cannot be read
    /// * If a file is not valid JSON of the expected shape
    pub fn from_files(events: &Path, health: Option<&Path>) -> Result<Self, DatasetError> {
        log::info!("Loading events from {}", events.display());
        let events_json = std::fs::read_to_string(events)?;
        let health_json = health.map(std::fs::read_to_string).transpose()?;

        Self::from_sparql_json(&events_json, health_json.as_deref())
    }

    /// Normalized records in source order.
    #[must_use]
    pub fn data(&self) -> &[NormalizedRecord] {
        &self.records
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset has no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Field names this dataset was built with.
    #[must_use]
    pub const fn fields(&self) -> &FieldMapping {
        &self.mapping
    }

    /// Full metadata.
    #[must_use]
    pub const fn meta(&self) -> &DatasetMeta {
        &self.meta
    }

    /// Padded global time range.
    #[must_use]
    pub const fn time_info(&self) -> TimeInfo {
        self.meta.time_info
    }

    /// Counts, per bin, the records active during that bin.
    ///
    /// A record spanning several bins increments each of them.
    #[must_use]
    pub fn time_histogram(&self, n_bins: usize) -> Vec<u32> {
        let mut bins = vec![0; n_bins];
        let info = self.time_info();

        for record in &self.records {
            if let Some(span) = info.bin_span(record.start_time, record.end_time, n_bins) {
                for bin in &mut bins[span] {
                    *bin += 1;
                }
            }
        }

        bins
    }

    /// Whether a record is visible at `current` (epoch milliseconds).
    #[must_use]
    pub const fn filter_by_time(record: &NormalizedRecord, current: i64, accumulating: bool) -> bool {
        record.is_active_at(current, accumulating)
    }

    /// Statistic entries. Without `return_all` the report-count entry is
    /// left out.
    #[must_use]
    pub fn stats(&self, return_all: bool) -> Vec<&StatSummary> {
        self.meta
            .stats
            .iter()
            .filter(|s| return_all || s.key.is_some())
            .collect()
    }

    /// Entry for a statistic, falling back to the report-count entry.
    #[must_use]
    pub fn stat_info(&self, key: Option<StatKey>) -> Option<&StatSummary> {
        self.meta
            .stats
            .iter()
            .find(|s| s.key == key)
            .or_else(|| self.meta.stats.first())
    }

    /// Display name of a statistic, falling back to the report count.
    #[must_use]
    pub fn stat_name(&self, key: Option<StatKey>) -> &str {
        self.stat_info(key)
            .map_or(StatSummary::REPORT_COUNT_NAME, |s| s.name.as_str())
    }

    /// Event type names sorted ascending.
    #[must_use]
    pub fn event_types(&self) -> Vec<&str> {
        self.meta
            .event_types
            .iter()
            .map(|e| e.name.as_str())
            .collect()
    }

    /// Event types with the value used to size their bars.
    #[must_use]
    pub fn event_type_values(&self, stat: Option<StatKey>) -> Vec<(&str, Option<f64>)> {
        self.meta
            .event_types
            .iter()
            .map(|e| (e.name.as_str(), e.value(stat)))
            .collect()
    }

    /// Per event type totals.
    #[must_use]
    pub fn event_type_totals(&self) -> &[EventTypeTotals] {
        &self.meta.event_types
    }

    /// Event type of a record.
    #[must_use]
    pub fn event_type_of(record: &NormalizedRecord) -> &str {
        &record.event_type_short
    }
}

#[cfg(test)]
mod tests {
    use storm_impact_dataset_models::{HOUR_MS, TaggedValue};

    use super::*;

    const DAY_MS: i64 = 24 * HOUR_MS;

    fn raw(fields: &[(&str, &str)]) -> RawRecord {
        fields
            .iter()
            .map(|(k, v)| ((*k).to_string(), TaggedValue::new(*v)))
            .collect()
    }

    fn event(wkt: &str, begin: &str, end: &str) -> RawRecord {
        raw(&[
            ("event_loc_geometrywkt", wkt),
            ("event_time_begin_xsd", begin),
            ("event_time_end_xsd", end),
        ])
    }

    #[test]
    fn keeps_only_parseable_geometry() {
        let dataset = Dataset::new(
            vec![
                event(
                    "POLYGON((0 0, 1 0, 1 1, 0 1, 0 0))",
                    "1970-01-02T00:00:00Z",
                    "1970-01-03T00:00:00Z",
                ),
                event(
                    "POLYGON((broken",
                    "1970-01-01T00:00:00Z",
                    "1970-01-10T00:00:00Z",
                ),
            ],
            &HealthLookup::new(),
        );

        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.data()[0].start_time, DAY_MS);
        assert_eq!(dataset.data()[0].end_time, 2 * DAY_MS);

        let info = dataset.time_info();
        assert_eq!(info.t_min, DAY_MS - HOUR_MS);
        assert_eq!(info.t_max, 2 * DAY_MS + HOUR_MS);
    }

    #[test]
    fn time_range_padding_matches_extremes() {
        let dataset = Dataset::new(
            vec![
                event(
                    "POLYGON((0 0, 1 0, 1 1, 0 1, 0 0))",
                    "2005-08-29T10:00:00Z",
                    "2005-08-29T12:00:00Z",
                ),
                event(
                    "POLYGON((0 0, 1 0, 1 1, 0 1, 0 0))",
                    "2005-08-28T10:00:00Z",
                    "2005-08-30T12:00:00Z",
                ),
            ],
            &HealthLookup::new(),
        );

        let min = dataset.data().iter().map(|r| r.start_time).min().unwrap();
        let max = dataset.data().iter().map(|r| r.end_time).max().unwrap();
        let info = dataset.time_info();
        assert_eq!(info.t_min, min - HOUR_MS);
        assert_eq!(info.t_max, max + HOUR_MS);
    }

    #[test]
    fn full_span_record_fills_every_bin() {
        let dataset = Dataset::new(
            vec![event(
                "POLYGON((0 0, 1 0, 1 1, 0 1, 0 0))",
                "1970-01-02T00:00:00Z",
                "1970-01-03T00:00:00Z",
            )],
            &HealthLookup::new(),
        );

        let info = dataset.time_info();
        let mut record = dataset.data()[0].clone();
        record.start_time = info.t_min;
        record.end_time = info.t_max;
        let dataset = Dataset {
            records: vec![record],
            ..dataset
        };

        for n in [1, 10, 120] {
            assert_eq!(dataset.time_histogram(n), vec![1; n]);
        }
    }

    #[test]
    fn empty_dataset_yields_empty_outputs() {
        let dataset = Dataset::new(Vec::new(), &HealthLookup::new());
        assert!(dataset.is_empty());
        assert_eq!(dataset.time_info(), TimeInfo::default());
        assert_eq!(dataset.time_histogram(5), vec![0; 5]);
        assert!(dataset.event_types().is_empty());
    }

    #[test]
    fn stat_info_falls_back_to_report_count() {
        let dataset = Dataset::new(Vec::new(), &HealthLookup::new());
        assert_eq!(dataset.stat_name(None), "# of Reports");
        assert_eq!(dataset.stat_name(Some(StatKey::Obesity)), "Adult Obesity Rate");
        assert_eq!(dataset.stats(true).len(), dataset.stats(false).len() + 1);
    }

    #[test]
    fn loads_from_sparql_json() {
        let events = r#"{"results": {"bindings": [{
            "event_type": {"type": "uri", "value": "http://example.org/ont/FlashFlood"},
            "event_loc_fips": {"type": "literal", "value": "22071"},
            "event_loc_geometrywkt": {"type": "literal", "value": "POLYGON((0 0, 1 0, 1 1, 0 1, 0 0))"},
            "event_timeLabel": {"type": "literal", "value": "2005-08-29 10:00:00"},
            "event_impact_deathDirectResult": {"type": "literal", "value": "4"}
        }]}}"#;
        let health = r#"{"22071": {"health_diabetes": {"value": "0.11"}}}"#;

        let dataset = Dataset::from_sparql_json(events, Some(health)).unwrap();
        assert_eq!(dataset.event_types(), vec!["FlashFlood"]);
        assert_eq!(
            dataset.event_type_values(Some(StatKey::DirectDeath)),
            vec![("FlashFlood", Some(4.0))]
        );
        assert_eq!(Dataset::event_type_of(&dataset.data()[0]), "FlashFlood");
        assert_eq!(dataset.data()[0].stat("health_diabetes"), Some(0.11));
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(matches!(
            Dataset::from_sparql_json("nope", None),
            Err(DatasetError::Json(_))
        ));
    }
}
