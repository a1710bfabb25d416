#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Raw query record shapes and dataset metadata types.
//!
//! The knowledge-graph query layer hands back records whose every field is a
//! tagged string value. These types describe that raw shape, the field names
//! the normalizer reads, and the aggregate metadata computed once per
//! dataset. The statistic catalogue lives in [`stats`].

pub mod stats;

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

pub use stats::{StatKey, StatKind, is_impact_field};

/// Milliseconds in one hour. Time ranges are padded outward by this much.
pub const HOUR_MS: i64 = 3_600_000;

/// Field-name prefix shared by every impact statistic.
pub const IMPACT_PREFIX: &str = "event_impact_";

/// Field-name prefix shared by every health statistic.
pub const HEALTH_PREFIX: &str = "health_";

/// Event type assigned to records that carry none.
pub const DEFAULT_EVENT_TYPE: &str = "Hurricane";

/// A single query-result value with its optional datatype URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedValue {
    /// Lexical value as returned by the endpoint.
    pub value: String,
    /// Datatype (or unit) URI, e.g. `http://www.w3.org/2001/XMLSchema#dateTime`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datatype: Option<String>,
}

impl TaggedValue {
    /// Creates an untyped value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            datatype: None,
        }
    }

    /// Parses the value as a float. Returns `None` for unparseable or
    /// non-finite values.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        self.value
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
    }
}

/// One query-result row: field name to tagged value.
pub type RawRecord = BTreeMap<String, TaggedValue>;

/// Health statistics keyed by region identifier (county FIPS).
pub type HealthLookup = BTreeMap<String, RawRecord>;

/// Names of the raw fields the normalizer reads.
///
/// Defaults match the field names produced by the impact queries. Any field
/// may be overridden from TOML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldMapping {
    /// Event type URI.
    pub event_type: String,
    /// Region key used for the health lookup and choropleth bucketing.
    pub region_key: String,
    /// Human-readable region label.
    pub region_label: String,
    /// Geometry without date component. Preferred when present.
    pub geometry_without_date: String,
    /// General geometry field.
    pub geometry: String,
    /// Explicit begin timestamp.
    pub time_begin: String,
    /// Explicit end timestamp.
    pub time_end: String,
    /// Combined time label (`YYYY-MM-DD HH...`).
    pub time_label: String,
}

impl Default for FieldMapping {
    fn default() -> Self {
        Self {
            event_type: "event_type".to_string(),
            region_key: "event_loc_fips".to_string(),
            region_label: "event_loc_label".to_string(),
            geometry_without_date: "event_loc_wd_geo".to_string(),
            geometry: "event_loc_geometrywkt".to_string(),
            time_begin: "event_time_begin_xsd".to_string(),
            time_end: "event_time_end_xsd".to_string(),
            time_label: "event_timeLabel".to_string(),
        }
    }
}

/// Global time extent of a dataset, in epoch milliseconds.
///
/// `t_min`/`t_max` are already padded outward by one hour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeInfo {
    /// Earliest start time minus one hour.
    pub t_min: i64,
    /// Latest end time plus one hour.
    pub t_max: i64,
    /// `t_max - t_min`.
    pub t_range: i64,
}

impl TimeInfo {
    /// Builds a time info from unpadded bounds, applying the one-hour padding.
    #[must_use]
    pub const fn from_bounds(min_start: i64, max_end: i64) -> Self {
        let t_min = min_start - HOUR_MS;
        let t_max = max_end + HOUR_MS;
        Self {
            t_min,
            t_max,
            t_range: t_max - t_min,
        }
    }

    /// Returns the inclusive histogram bin span an interval falls into.
    ///
    /// The range is widened by a factor of `1 + 1e-6` so that `t_max` maps
    /// strictly below `n_bins`. Returns `None` for zero bins or an empty
    /// range.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn bin_span(&self, start: i64, end: i64, n_bins: usize) -> Option<RangeInclusive<usize>> {
        if n_bins == 0 || self.t_range <= 0 {
            return None;
        }

        let range = self.t_range as f64 * (1.0 + 1e-6);
        let to_bin = |t: i64| {
            let pos = ((t - self.t_min) as f64 / range * n_bins as f64).floor();
            pos.clamp(0.0, (n_bins - 1) as f64) as usize
        };

        let (a, b) = (to_bin(start), to_bin(end));
        (a <= b).then_some(a..=b)
    }
}

/// Per-event-type totals over a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTypeTotals {
    /// Short event type label (e.g. `"FlashFlood"`).
    pub name: String,
    /// Number of records of this type.
    pub count: u64,
    /// Sum per impact statistic. Statistics no record of this type defines
    /// are absent.
    pub sums: BTreeMap<StatKey, f64>,
}

impl EventTypeTotals {
    /// Creates empty totals for a type.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            count: 0,
            sums: BTreeMap::new(),
        }
    }

    /// Value used to size this type's bar: the record count when no
    /// statistic is selected, otherwise the statistic's sum.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn value(&self, stat: Option<StatKey>) -> Option<f64> {
        match stat {
            None => Some(self.count as f64),
            Some(key) => self.sums.get(&key).copied(),
        }
    }
}

/// A dataset-wide statistic entry as listed in the layer panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatSummary {
    /// Statistic key. `None` for the report-count entry.
    pub key: Option<StatKey>,
    /// Display name.
    pub name: String,
    /// Display unit (may be empty).
    pub unit: String,
    /// Sum over contributing records. `None` when no record defines the
    /// statistic, or for statistics that aggregate by mean.
    pub total: Option<f64>,
}

impl StatSummary {
    /// Display name of the report-count entry.
    pub const REPORT_COUNT_NAME: &'static str = "# of Reports";
}
