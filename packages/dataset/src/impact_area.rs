//! Track-derived county impacts for storms without a precomputed result.
//!
//! Each track point buffered by its wind category yields the set of
//! counties it touches. County geometry records fetched for those counties
//! carry no time of their own; they receive the first and last track time
//! that touched them.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use storm_impact_dataset_models::{FieldMapping, RawRecord, TaggedValue};

/// Counties touched by one track point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountyImpact {
    /// Track point time as returned by the track query.
    pub time: String,
    /// County FIPS codes, `|`-separated.
    pub regions: String,
}

impl CountyImpact {
    /// Creates an impact entry. Returns `None` when no county was touched.
    #[must_use]
    pub fn new(time: impl Into<String>, regions: impl Into<String>) -> Option<Self> {
        let regions = regions.into();
        if regions.is_empty() {
            return None;
        }
        Some(Self {
            time: time.into(),
            regions,
        })
    }

    /// Iterates over the FIPS codes of this entry.
    pub fn fips(&self) -> impl Iterator<Item = &str> {
        self.regions.split('|').filter(|s| !s.is_empty())
    }

    /// Whether this entry touched the given county.
    #[must_use]
    pub fn contains(&self, fips: &str) -> bool {
        self.fips().any(|f| f == fips)
    }
}

/// Distinct counties touched by any track point.
#[must_use]
pub fn impacted_counties(impacts: &[CountyImpact]) -> BTreeSet<String> {
    impacts
        .iter()
        .flat_map(CountyImpact::fips)
        .map(str::to_string)
        .collect()
}

/// Gives each county record the first and last track time that touched it.
///
/// Impacts must be in track order. Records whose county was never touched
/// are left unchanged.
pub fn attach_track_times(
    records: &mut [RawRecord],
    impacts: &[CountyImpact],
    mapping: &FieldMapping,
) {
    for record in records.iter_mut() {
        let Some(fips) = record.get(&mapping.region_key).map(|v| v.value.clone()) else {
            continue;
        };

        let mut touching = impacts.iter().filter(|i| i.contains(&fips));
        let Some(first) = touching.next() else {
            log::debug!("County {fips} not touched by the track");
            continue;
        };
        let last = touching.last().unwrap_or(first);

        record.insert(mapping.time_begin.clone(), TaggedValue::new(&first.time));
        record.insert(mapping.time_end.clone(), TaggedValue::new(&last.time));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn impacts() -> Vec<CountyImpact> {
        [
            ("2005-08-29T10:00:00Z", "22071|22087"),
            ("2005-08-29T16:00:00Z", ""),
            ("2005-08-29T22:00:00Z", "22087|28045"),
            ("2005-08-30T04:00:00Z", "28045"),
        ]
        .into_iter()
        .filter_map(|(t, r)| CountyImpact::new(t, r))
        .collect()
    }

    fn county(fips: &str) -> RawRecord {
        let mut record = RawRecord::new();
        record.insert("event_loc_fips".to_string(), TaggedValue::new(fips));
        record
    }

    #[test]
    fn empty_regions_are_skipped() {
        assert_eq!(impacts().len(), 3);
    }

    #[test]
    fn collects_distinct_counties() {
        let counties: Vec<_> = impacted_counties(&impacts()).into_iter().collect();
        assert_eq!(counties, vec!["22071", "22087", "28045"]);
    }

    #[test]
    fn attaches_first_and_last_touch() {
        let mut records = vec![county("22087"), county("22071"), county("01001")];
        attach_track_times(&mut records, &impacts(), &FieldMapping::default());

        assert_eq!(
            records[0]["event_time_begin_xsd"].value,
            "2005-08-29T10:00:00Z"
        );
        assert_eq!(records[0]["event_time_end_xsd"].value, "2005-08-29T22:00:00Z");
        assert_eq!(records[1]["event_time_end_xsd"].value, "2005-08-29T10:00:00Z");
        assert!(!records[2].contains_key("event_time_begin_xsd"));
    }

    #[test]
    fn fips_match_is_exact() {
        let impact = CountyImpact::new("t", "220711").unwrap();
        assert!(!impact.contains("22071"));
    }
}
