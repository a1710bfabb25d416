//! The canonical in-memory impact record.

use geo::{LineString, Polygon};
use storm_impact_dataset_models::{RawRecord, StatKey, TaggedValue};

/// A disaster-event record after geometry parsing, timestamp derivation, and
/// health-field merge.
///
/// Records have no identifier of their own; identity is their position in
/// the owning dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecord {
    /// All raw fields, event and merged health fields alike.
    pub fields: RawRecord,
    /// Polygon whose exterior ring was the largest ring of the source
    /// geometry.
    pub geometry: Polygon<f64>,
    /// Area-weighted centroid of the exterior ring, `[lon, lat]`.
    pub centroid: [f64; 2],
    /// Start of the event, epoch milliseconds.
    pub start_time: i64,
    /// End of the event, epoch milliseconds. Never before `start_time`.
    pub end_time: i64,
    /// Last path segment of the event type URI (e.g. `"StormSurgeTide"`).
    pub event_type_short: String,
}

impl NormalizedRecord {
    /// Returns a raw field.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&TaggedValue> {
        self.fields.get(name)
    }

    /// Returns a raw field's lexical value.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(|v| v.value.as_str())
    }

    /// Returns a numeric field. Missing and unparseable values are `None`,
    /// never zero.
    #[must_use]
    pub fn stat(&self, field: &str) -> Option<f64> {
        self.fields.get(field).and_then(TaggedValue::as_f64)
    }

    /// Returns a catalogued statistic.
    #[must_use]
    pub fn stat_value(&self, key: StatKey) -> Option<f64> {
        self.stat(key.as_ref())
    }

    /// Sum of all impact statistics the record defines.
    #[must_use]
    pub fn impact_total(&self) -> f64 {
        StatKey::impact()
            .iter()
            .filter_map(|key| self.stat_value(*key))
            .sum()
    }

    /// The selected polygon ring.
    #[must_use]
    pub fn ring(&self) -> &LineString<f64> {
        self.geometry.exterior()
    }

    /// Whether the record is visible at `current` on the time bar.
    ///
    /// When accumulating, every event that started before `current` counts.
    /// Otherwise `current` must fall strictly inside the event.
    #[must_use]
    pub const fn is_active_at(&self, current: i64, accumulating: bool) -> bool {
        if accumulating {
            self.start_time < current
        } else {
            self.start_time < current && self.end_time > current
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use geo::polygon;
    use storm_impact_dataset_models::{RawRecord, TaggedValue};

    use super::NormalizedRecord;

    /// A unit-square record with the given fields.
    pub fn record(start_time: i64, end_time: i64, fields: &[(&str, &str)]) -> NormalizedRecord {
        let fields: RawRecord = fields
            .iter()
            .map(|(k, v)| ((*k).to_string(), TaggedValue::new(*v)))
            .collect();
        NormalizedRecord {
            fields,
            geometry: polygon![
                (x: 0.0, y: 0.0),
                (x: 1.0, y: 0.0),
                (x: 1.0, y: 1.0),
                (x: 0.0, y: 1.0),
            ],
            centroid: [0.5, 0.5],
            start_time,
            end_time,
            event_type_short: "Hurricane".to_string(),
        }
    }
}
