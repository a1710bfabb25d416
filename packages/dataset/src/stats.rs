//! Dataset-wide metadata built in one pass over normalized records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use storm_impact_dataset_models::{EventTypeTotals, StatKey, StatSummary, TimeInfo};

use crate::record::NormalizedRecord;

/// Aggregate metadata for a dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetMeta {
    /// Padded global time range.
    pub time_info: TimeInfo,
    /// Per event type totals, sorted by name.
    pub event_types: Vec<EventTypeTotals>,
    /// Report count entry, then impact statistics, then health statistics.
    pub stats: Vec<StatSummary>,
}

impl DatasetMeta {
    /// Computes metadata for a record sequence.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn build(records: &[NormalizedRecord]) -> Self {
        let mut event_types: BTreeMap<&str, EventTypeTotals> = BTreeMap::new();
        let mut totals: BTreeMap<StatKey, f64> = BTreeMap::new();
        let mut bounds: Option<(i64, i64)> = None;

        for record in records {
            let entry = event_types
                .entry(record.event_type_short.as_str())
                .or_insert_with(|| EventTypeTotals::new(record.event_type_short.clone()));
            entry.count += 1;

            for key in StatKey::impact() {
                if let Some(value) = record.stat_value(*key) {
                    *entry.sums.entry(*key).or_insert(0.0) += value;
                    *totals.entry(*key).or_insert(0.0) += value;
                }
            }

            bounds = Some(match bounds {
                None => (record.start_time, record.end_time),
                Some((lo, hi)) => (lo.min(record.start_time), hi.max(record.end_time)),
            });
        }

        let mut stats = Vec::with_capacity(1 + StatKey::all().len());
        stats.push(StatSummary {
            key: None,
            name: StatSummary::REPORT_COUNT_NAME.to_string(),
            unit: String::new(),
            total: Some(records.len() as f64),
        });
        stats.extend(StatKey::all().into_iter().map(|key| StatSummary {
            key: Some(key),
            name: key.name().to_string(),
            unit: key.unit().to_string(),
            total: if key.is_impact() {
                totals.get(&key).copied()
            } else {
                None
            },
        }));

        Self {
            time_info: bounds
                .map_or_else(TimeInfo::default, |(lo, hi)| TimeInfo::from_bounds(lo, hi)),
            event_types: event_types.into_values().collect(),
            stats,
        }
    }
}
