//! Region-keyed aggregation for choropleth rendering.

use std::collections::BTreeMap;

use storm_impact_dataset_models::is_impact_field;

use crate::record::NormalizedRecord;

/// Value a record contributes when it lacks the selected statistic.
///
/// Kept for parity with the rendering rules: a region whose records all
/// lack the statistic ends up negative and is drawn as "no data".
pub const MISSING_STAT: f64 = -1.0;

/// Records sharing a region key, with the reduced statistic.
#[derive(Debug, Clone)]
pub struct RegionAggregate<'a> {
    /// Records in this region, in input order.
    pub records: Vec<&'a NormalizedRecord>,
    /// Sum for impact statistics, mean otherwise, record count when no
    /// statistic is selected.
    pub stat_value: f64,
    /// Number of records.
    pub count: usize,
    /// Region label from the first record.
    pub label: Option<String>,
}

/// Groups records by region key and reduces a statistic per region.
///
/// Records without the region key field are skipped.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn aggregate<'a>(
    records: impl IntoIterator<Item = &'a NormalizedRecord>,
    region_key_field: &str,
    region_label_field: &str,
    stat_key: Option<&str>,
) -> BTreeMap<String, RegionAggregate<'a>> {
    let mut regions: BTreeMap<String, RegionAggregate<'a>> = BTreeMap::new();

    for record in records {
        let Some(region) = record.value(region_key_field) else {
            continue;
        };

        let bucket = regions
            .entry(region.to_string())
            .or_insert_with(|| RegionAggregate {
                records: Vec::new(),
                stat_value: 0.0,
                count: 0,
                label: record.value(region_label_field).map(str::to_string),
            });

        bucket.records.push(record);
        bucket.stat_value += stat_key.map_or(1.0, |key| record.stat(key).unwrap_or(MISSING_STAT));
        bucket.count += 1;
    }

    if let Some(key) = stat_key
        && !is_impact_field(key)
    {
        for bucket in regions.values_mut() {
            bucket.stat_value /= bucket.count as f64;
        }
    }

    regions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::test_support::record;

    fn region(fips: &str, fields: &[(&str, &str)]) -> NormalizedRecord {
        let mut all = vec![("event_loc_fips", fips), ("event_loc_label", "Parish")];
        all.extend_from_slice(fields);
        record(0, 0, &all)
    }

    #[test]
    fn health_stats_average_and_impact_stats_sum() {
        let records = vec![
            region(
                "1",
                &[
                    ("health_diabetes", "10"),
                    ("event_impact_deathDirectResult", "10"),
                ],
            ),
            region(
                "1",
                &[
                    ("health_diabetes", "20"),
                    ("event_impact_deathDirectResult", "20"),
                ],
            ),
            region(
                "1",
                &[
                    ("health_diabetes", "30"),
                    ("event_impact_deathDirectResult", "30"),
                ],
            ),
        ];

        let mean = aggregate(
            &records,
            "event_loc_fips",
            "event_loc_label",
            Some("health_diabetes"),
        );
        assert!((mean["1"].stat_value - 20.0).abs() < f64::EPSILON);

        let sum = aggregate(
            &records,
            "event_loc_fips",
            "event_loc_label",
            Some("event_impact_deathDirectResult"),
        );
        assert!((sum["1"].stat_value - 60.0).abs() < f64::EPSILON);
        assert_eq!(sum["1"].count, 3);
    }

    #[test]
    fn counts_without_stat() {
        let records = vec![region("1", &[]), region("1", &[]), region("2", &[])];
        let regions = aggregate(&records, "event_loc_fips", "event_loc_label", None);
        assert!((regions["1"].stat_value - 2.0).abs() < f64::EPSILON);
        assert!((regions["2"].stat_value - 1.0).abs() < f64::EPSILON);
        assert_eq!(regions["1"].label.as_deref(), Some("Parish"));
    }

    #[test]
    fn missing_stat_contributes_sentinel() {
        let records = vec![region("1", &[])];
        let regions = aggregate(
            &records,
            "event_loc_fips",
            "event_loc_label",
            Some("event_impact_damagePropertyResult"),
        );
        assert!((regions["1"].stat_value - MISSING_STAT).abs() < f64::EPSILON);
    }

    #[test]
    fn skips_records_without_region() {
        let records = vec![record(0, 0, &[]), region("1", &[])];
        let regions = aggregate(&records, "event_loc_fips", "event_loc_label", None);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions["1"].records.len(), 1);
    }

    #[test]
    fn empty_input_is_empty() {
        let records: Vec<NormalizedRecord> = Vec::new();
        let regions = aggregate(&records, "event_loc_fips", "event_loc_label", None);
        assert!(regions.is_empty());
    }
}
