//! Domain experts: parsing, locality, and expertise topic selection.

use std::collections::BTreeSet;

use geo::Point;
use regex::RegexBuilder;
use storm_impact_dataset::sparql::parse_bindings;
use storm_impact_dataset_models::{RawRecord, StatKey};
use wkt::TryFromWkt;

use crate::SessionError;

/// Topic selected when the expert panel opens.
pub const DEFAULT_TOPIC_KEY: &str = "Disaster:Hurricane";

/// An expert with the organization they are affiliated with.
#[derive(Debug, Clone, PartialEq)]
pub struct Expert {
    /// Expert URI.
    pub id: String,
    /// Short name.
    pub name: String,
    /// Full name, when known.
    pub full_name: Option<String>,
    /// Affiliations, trimmed.
    pub affiliations: Vec<String>,
    /// State of the affiliated organization.
    pub state: String,
    /// Organization location, `[lon, lat]`.
    pub coordinates: [f64; 2],
    /// Profile page.
    pub url: Option<String>,
    /// Research interests, trimmed and sorted.
    pub topics: Vec<String>,
}

impl Expert {
    /// Parses an expert query binding.
    ///
    /// # Errors
    ///
    /// * If `expert`, `name`, `state`, or `wkt` is missing
    /// * If `wkt` is not a point
    pub fn from_record(record: &RawRecord) -> Result<Self, SessionError> {
        let wkt = required(record, "wkt")?;
        let point = Point::<f64>::try_from_wkt_str(wkt)
            .map_err(|_| SessionError::InvalidGeometry(wkt.to_string()))?;

        let mut topics: Vec<String> = split_list(optional(record, "topics").unwrap_or_default());
        topics.sort();

        Ok(Self {
            id: required(record, "expert")?.to_string(),
            name: required(record, "name")?.to_string(),
            full_name: optional(record, "fullname").map(str::to_string),
            affiliations: split_list(optional(record, "affil").unwrap_or_default()),
            state: required(record, "state")?.to_string(),
            coordinates: [point.x(), point.y()],
            url: optional(record, "url").map(str::to_string),
            topics,
        })
    }

    /// Full name if known, else the short name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.full_name.as_deref().unwrap_or(&self.name)
    }
}

fn required<'a>(record: &'a RawRecord, field: &'static str) -> Result<&'a str, SessionError> {
    optional(record, field).ok_or(SessionError::MissingField(field))
}

fn optional<'a>(record: &'a RawRecord, field: &str) -> Option<&'a str> {
    record.get(field).map(|v| v.value.as_str())
}

fn split_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parses the expert query result. Unparseable bindings are skipped.
///
/// # Errors
///
/// * If the document is not a SPARQL results document
pub fn parse_experts(json: &str) -> Result<Vec<Expert>, SessionError> {
    Ok(parse_bindings(json)?
        .iter()
        .filter_map(|record| match Expert::from_record(record) {
            Ok(expert) => Some(expert),
            Err(e) => {
                log::debug!("Skipping expert: {e}");
                None
            }
        })
        .collect())
}

/// Splits experts into those located in one of the impacted states and the
/// rest. State names match case-insensitively anywhere in the expert's
/// state. Blank state names are ignored; with no impacted states every
/// expert is non-local.
#[must_use]
pub fn partition_local<'a>(
    experts: &'a [Expert],
    impact_states: &[String],
) -> (Vec<&'a Expert>, Vec<&'a Expert>) {
    let states: Vec<String> = impact_states
        .iter()
        .map(String::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(regex::escape)
        .collect();
    if states.is_empty() {
        return (Vec::new(), experts.iter().collect());
    }

    let pattern = states.join("|");

    match RegexBuilder::new(&format!("({pattern})"))
        .case_insensitive(true)
        .build()
    {
        Ok(re) => experts.iter().partition(|e| re.is_match(&e.state)),
        Err(e) => {
            log::warn!("Invalid impact state pattern: {e}");
            (Vec::new(), experts.iter().collect())
        }
    }
}

/// A category of selectable expertise topics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpertiseGroup {
    /// Category label (`Disaster`, `Health`).
    pub category: &'static str,
    /// Topics in display order.
    pub topics: Vec<&'static str>,
}

/// Expertise topic checkboxes of the expert panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpertTopics {
    groups: Vec<ExpertiseGroup>,
    selected: BTreeSet<String>,
}

impl Default for ExpertTopics {
    fn default() -> Self {
        Self::new()
    }
}

impl ExpertTopics {
    /// Disaster and health topic groups with only the hurricane topic
    /// selected.
    #[must_use]
    pub fn new() -> Self {
        Self {
            groups: vec![
                ExpertiseGroup {
                    category: "Disaster",
                    topics: vec!["Hurricane"],
                },
                ExpertiseGroup {
                    category: "Health",
                    topics: StatKey::health_topics(),
                },
            ],
            selected: BTreeSet::from([DEFAULT_TOPIC_KEY.to_string()]),
        }
    }

    /// `"{category}:{topic}"`.
    #[must_use]
    pub fn key(category: &str, topic: &str) -> String {
        format!("{category}:{topic}")
    }

    /// Topic groups.
    #[must_use]
    pub fn groups(&self) -> &[ExpertiseGroup] {
        &self.groups
    }

    /// Whether a topic key is selected.
    #[must_use]
    pub fn is_selected(&self, key: &str) -> bool {
        self.selected.contains(key)
    }

    /// Flips a topic key. Unknown keys are ignored.
    pub fn toggle(&mut self, key: &str) {
        let known = self
            .groups
            .iter()
            .any(|g| g.topics.iter().any(|t| Self::key(g.category, t) == key));
        if !known {
            log::warn!("Unknown expertise topic '{key}'");
            return;
        }
        if !self.selected.remove(key) {
            self.selected.insert(key.to_string());
        }
    }

    /// Selected topics in display order, without their category.
    #[must_use]
    pub fn selected_topics(&self) -> Vec<&'static str> {
        self.groups
            .iter()
            .flat_map(|g| {
                g.topics
                    .iter()
                    .filter(|t| self.is_selected(&Self::key(g.category, t)))
                    .copied()
            })
            .collect()
    }
}

/// Topics named in the omnibar expert option: the hurricane plus the
/// selected statistic's health topic, joined with `" and "`.
#[must_use]
pub fn omnibar_topics(stat_key: Option<StatKey>) -> String {
    let mut topics = vec!["Hurricane"];
    if let Some(topic) = stat_key.and_then(StatKey::topic) {
        topics.push(topic);
    }
    topics.join(" and ")
}

#[cfg(test)]
mod tests {
    use storm_impact_dataset_models::TaggedValue;

    use super::*;

    fn expert(id: &str, state: &str) -> Expert {
        Expert {
            id: id.to_string(),
            name: id.to_string(),
            full_name: None,
            affiliations: Vec::new(),
            state: state.to_string(),
            coordinates: [0.0, 0.0],
            url: None,
            topics: Vec::new(),
        }
    }

    #[test]
    fn parses_expert_binding() {
        let record: RawRecord = [
            ("expert", "http://example.org/e/1"),
            ("name", "J. Doe"),
            ("fullname", "Jane Doe"),
            ("affil", "Tulane University, School of Public Health"),
            ("state", "Louisiana"),
            ("wkt", "POINT (-90.12 29.94)"),
            ("topics", "Obesity, Hurricane,,Diabetes"),
        ]
        .iter()
        .map(|(k, v)| ((*k).to_string(), TaggedValue::new(*v)))
        .collect();

        let expert = Expert::from_record(&record).unwrap();
        assert_eq!(expert.display_name(), "Jane Doe");
        assert_eq!(
            expert.affiliations,
            vec!["Tulane University", "School of Public Health"]
        );
        assert_eq!(expert.topics, vec!["Diabetes", "Hurricane", "Obesity"]);
        assert_eq!(expert.coordinates, [-90.12, 29.94]);
        assert!(expert.url.is_none());
    }

    #[test]
    fn display_name_falls_back_to_name() {
        assert_eq!(expert("jdoe", "Texas").display_name(), "jdoe");
    }

    #[test]
    fn skips_incomplete_experts() {
        let json = r#"{"results": {"bindings": [
            {"expert": {"value": "e1"}, "name": {"value": "A"}, "state": {"value": "Texas"},
             "wkt": {"value": "POINT (-97 30)"}},
            {"expert": {"value": "e2"}, "name": {"value": "B"}}
        ]}}"#;
        let experts = parse_experts(json).unwrap();
        assert_eq!(experts.len(), 1);
        assert_eq!(experts[0].id, "e1");
    }

    #[test]
    fn partitions_by_impacted_state() {
        let experts = vec![
            expert("a", "LOUISIANA"),
            expert("b", "Texas"),
            expert("c", "Mississippi"),
        ];
        let states = vec!["Louisiana".to_string(), "Mississippi".to_string()];
        let (local, nonlocal) = partition_local(&experts, &states);

        assert_eq!(local.iter().map(|e| e.id.as_str()).collect::<Vec<_>>(), vec!["a", "c"]);
        assert_eq!(nonlocal.len(), 1);

        let (local, nonlocal) = partition_local(&experts, &[]);
        assert!(local.is_empty());
        assert_eq!(nonlocal.len(), 3);
    }

    #[test]
    fn blank_states_match_nobody() {
        let experts = vec![expert("a", "Florida"), expert("b", "Texas")];

        let blank = vec![String::new(), "  ".to_string()];
        let (local, nonlocal) = partition_local(&experts, &blank);
        assert!(local.is_empty());
        assert_eq!(nonlocal.len(), 2);

        let mixed = vec!["Florida".to_string(), String::new()];
        let (local, nonlocal) = partition_local(&experts, &mixed);
        assert_eq!(local.iter().map(|e| e.id.as_str()).collect::<Vec<_>>(), vec!["a"]);
        assert_eq!(nonlocal.len(), 1);
    }

    #[test]
    fn hurricane_topic_selected_by_default() {
        let mut topics = ExpertTopics::new();
        assert_eq!(topics.selected_topics(), vec!["Hurricane"]);

        topics.toggle("Health:Obesity");
        topics.toggle("Health:Nonsense");
        assert_eq!(topics.selected_topics(), vec!["Hurricane", "Obesity"]);

        topics.toggle(DEFAULT_TOPIC_KEY);
        assert_eq!(topics.selected_topics(), vec!["Obesity"]);
        assert_eq!(topics.groups()[1].topics.len(), 4);
    }

    #[test]
    fn omnibar_topics_include_health_topic() {
        assert_eq!(omnibar_topics(None), "Hurricane");
        assert_eq!(omnibar_topics(Some(StatKey::CropDamage)), "Hurricane");
        assert_eq!(
            omnibar_topics(Some(StatKey::PoorMentalHealth)),
            "Hurricane and Mental Health"
        );
    }
}
