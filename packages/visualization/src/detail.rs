//! Impact detail popup for a clicked county.

use serde::Serialize;
use storm_impact_dataset::NormalizedRecord;
use storm_impact_dataset_models::StatKey;

use crate::choropleth::ChoroplethRegion;
use crate::format::format_stat;

/// A `name: value` table row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatRow {
    /// Statistic name.
    pub name: String,
    /// Formatted value with unit.
    pub value: String,
}

/// One impact report card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactReport {
    /// Short event type.
    pub event_type: String,
    /// Report time label, if the record carries one.
    pub time_label: Option<String>,
    /// Impact statistics the report defines.
    pub rows: Vec<StatRow>,
}

/// Detail view of a county.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactDetail {
    /// `"{label} County"`.
    pub title: String,
    /// Reports with a positive impact total.
    pub reports: Vec<ImpactReport>,
    /// County health statistics.
    pub health: Vec<StatRow>,
}

impl ImpactDetail {
    /// Builds the detail view from a region's records.
    #[must_use]
    pub fn new(label: &str, records: &[&NormalizedRecord], time_label_field: &str) -> Self {
        let reports = records
            .iter()
            .filter(|r| r.impact_total() > 0.0)
            .map(|r| ImpactReport {
                event_type: r.event_type_short.clone(),
                time_label: r.value(time_label_field).map(str::to_string),
                rows: stat_rows(r, StatKey::impact()),
            })
            .collect();

        let health = records
            .first()
            .map(|r| stat_rows(r, StatKey::health()))
            .unwrap_or_default();

        Self {
            title: format!("{label} County"),
            reports,
            health,
        }
    }

    /// Builds the detail view for a choropleth region, looking its records
    /// up by key.
    #[must_use]
    pub fn for_region<'a>(
        region: &ChoroplethRegion,
        records: impl IntoIterator<Item = &'a NormalizedRecord>,
        region_key_field: &str,
        time_label_field: &str,
    ) -> Self {
        let members: Vec<&NormalizedRecord> = records
            .into_iter()
            .filter(|r| r.value(region_key_field) == Some(region.key.as_str()))
            .collect();

        Self::new(
            region.label.as_deref().unwrap_or(&region.key),
            &members,
            time_label_field,
        )
    }
}

fn stat_rows(record: &NormalizedRecord, keys: &[StatKey]) -> Vec<StatRow> {
    keys.iter()
        .filter_map(|key| {
            record.stat_value(*key).map(|v| StatRow {
                name: key.name().to_string(),
                value: format_stat(v, *key),
            })
        })
        .collect()
}
