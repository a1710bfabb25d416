//! Raw record normalization.
//!
//! Turns raw query rows into [`NormalizedRecord`]s in a single pass: health
//! fields are merged by region key, the event type is defaulted, geometry
//! and timestamps are parsed, and the padded global time range is tracked.
//! Rows that cannot be normalized are dropped and logged, never surfaced as
//! errors.

use storm_impact_dataset_models::{
    DEFAULT_EVENT_TYPE, FieldMapping, HealthLookup, RawRecord, TaggedValue, TimeInfo,
};

use crate::parsing::{parse_time_label, parse_timestamp, parse_wkt_polygon, ring_centroid};
use crate::record::NormalizedRecord;

/// Why a raw record was left out of the dataset.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DropReason {
    /// Neither geometry field is present.
    #[error("no geometry field")]
    MissingGeometry,
    /// The geometry is not a parseable polygon or multi-polygon.
    #[error("unparseable or non-polygonal geometry")]
    InvalidGeometry,
    /// The selected ring has no defined centroid.
    #[error("ring has no centroid")]
    UndefinedCentroid,
    /// No begin/end pair or time label could be parsed.
    #[error("no parseable time")]
    MissingTime,
    /// The begin timestamp is after the end timestamp.
    #[error("start {start} is after end {end}")]
    InvertedTime {
        /// Parsed start, epoch milliseconds.
        start: i64,
        /// Parsed end, epoch milliseconds.
        end: i64,
    },
}

/// Output of [`normalize_records`].
#[derive(Debug, Clone, Default)]
pub struct NormalizedBatch {
    /// Surviving records in source order.
    pub records: Vec<NormalizedRecord>,
    /// Padded time range tracked during the pass. Zero when empty.
    pub time_info: TimeInfo,
    /// Number of raw records dropped.
    pub dropped: usize,
}

/// Normalizes a batch of raw event records.
///
/// Drops are logged at `debug`; the batch summary at `info`.
#[must_use]
pub fn normalize_records(
    events: Vec<RawRecord>,
    health: &HealthLookup,
    mapping: &FieldMapping,
) -> NormalizedBatch {
    let total = events.len();
    let mut records = Vec::with_capacity(total);
    let mut bounds: Option<(i64, i64)> = None;
    let mut dropped = 0;

    for (index, raw) in events.into_iter().enumerate() {
        match normalize_record(raw, health, mapping) {
            Ok(record) => {
                bounds = Some(match bounds {
                    None => (record.start_time, record.end_time),
                    Some((lo, hi)) => (lo.min(record.start_time), hi.max(record.end_time)),
                });
                records.push(record);
            }
            Err(reason) => {
                log::debug!("Dropping record {index}: {reason}");
                dropped += 1;
            }
        }
    }

    log::info!(
        "Normalized {} of {total} records ({dropped} dropped)",
        records.len()
    );

    NormalizedBatch {
        records,
        time_info: bounds.map_or_else(TimeInfo::default, |(lo, hi)| TimeInfo::from_bounds(lo, hi)),
        dropped,
    }
}

/// Normalizes a single raw record.
///
/// # Errors
///
/// Returns the [`DropReason`] if the record has no usable geometry or time.
pub fn normalize_record(
    mut fields: RawRecord,
    health: &HealthLookup,
    mapping: &FieldMapping,
) -> Result<NormalizedRecord, DropReason> {
    if let Some(health_fields) = fields
        .get(&mapping.region_key)
        .and_then(|key| health.get(&key.value))
    {
        for (name, value) in health_fields {
            fields.insert(name.clone(), value.clone());
        }
    }

    let event_type = fields
        .entry(mapping.event_type.clone())
        .or_insert_with(|| TaggedValue::new(DEFAULT_EVENT_TYPE));
    let event_type_short = short_event_type(&event_type.value).to_string();

    let wkt = non_empty(&fields, &mapping.geometry_without_date)
        .or_else(|| non_empty(&fields, &mapping.geometry))
        .ok_or(DropReason::MissingGeometry)?;
    let geometry = parse_wkt_polygon(wkt).ok_or(DropReason::InvalidGeometry)?;
    let centroid = ring_centroid(geometry.exterior()).ok_or(DropReason::UndefinedCentroid)?;

    let (start_time, end_time) = record_times(&fields, mapping).ok_or(DropReason::MissingTime)?;
    if start_time > end_time {
        return Err(DropReason::InvertedTime {
            start: start_time,
            end: end_time,
        });
    }

    Ok(NormalizedRecord {
        fields,
        geometry,
        centroid,
        start_time,
        end_time,
        event_type_short,
    })
}

/// Last `/`-separated segment of an event type URI.
#[must_use]
pub fn short_event_type(event_type: &str) -> &str {
    event_type.rsplit('/').next().unwrap_or(event_type)
}

fn non_empty<'a>(fields: &'a RawRecord, name: &str) -> Option<&'a str> {
    fields
        .get(name)
        .map(|v| v.value.trim())
        .filter(|v| !v.is_empty())
}

/// Explicit begin/end when both parse, else the time label as an instant.
fn record_times(fields: &RawRecord, mapping: &FieldMapping) -> Option<(i64, i64)> {
    let explicit = non_empty(fields, &mapping.time_begin)
        .and_then(parse_timestamp)
        .zip(non_empty(fields, &mapping.time_end).and_then(parse_timestamp));

    explicit.or_else(|| {
        non_empty(fields, &mapping.time_label)
            .and_then(parse_time_label)
            .map(|t| (t, t))
    })
}
