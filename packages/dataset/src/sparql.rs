//! SPARQL JSON result parsing.
//!
//! Event queries return the standard results envelope
//! (`{"head": ..., "results": {"bindings": [...]}}`) whose bindings are
//! already [`RawRecord`]s. The health lookup is a plain object keyed by
//! region identifier.

use serde::Deserialize;
use storm_impact_dataset_models::{HealthLookup, RawRecord};

#[derive(Debug, Deserialize)]
struct ResultsEnvelope {
    results: Bindings,
}

#[derive(Debug, Deserialize)]
struct Bindings {
    bindings: Vec<RawRecord>,
}

/// Parses the bindings of a SPARQL JSON results document.
///
/// # Errors
///
/// * If the document is not valid JSON or lacks `results.bindings`
pub fn parse_bindings(json: &str) -> Result<Vec<RawRecord>, serde_json::Error> {
    let envelope: ResultsEnvelope = serde_json::from_str(json)?;
    Ok(envelope.results.bindings)
}

/// Parses a region-keyed health lookup.
///
/// # Errors
///
/// * If the document is not a JSON object of tagged-value records
pub fn parse_health_lookup(json: &str) -> Result<HealthLookup, serde_json::Error> {
    serde_json::from_str(json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_results_envelope() {
        let json = r#"{
            "head": {"vars": ["event_loc_fips", "event_type"]},
            "results": {"bindings": [
                {
                    "event_loc_fips": {"type": "literal", "value": "22071"},
                    "event_type": {"type": "uri", "value": "http://example.org/ont/StormSurgeTide"}
                },
                {
                    "event_loc_fips": {"type": "literal", "value": "22087"}
                }
            ]}
        }"#;

        let bindings = parse_bindings(json).unwrap();
        assert_eq!(bindings.len(), 2);
        assert_eq!(bindings[0]["event_loc_fips"].value, "22071");
        assert!(!bindings[1].contains_key("event_type"));
    }

    #[test]
    fn empty_bindings_are_valid() {
        let bindings = parse_bindings(r#"{"results": {"bindings": []}}"#).unwrap();
        assert!(bindings.is_empty());
    }

    #[test]
    fn rejects_missing_envelope() {
        assert!(parse_bindings("[]").is_err());
        assert!(parse_bindings("{").is_err());
    }

    #[test]
    fn parses_health_lookup() {
        let lookup = parse_health_lookup(
            r#"{"22071": {"health_diabetes": {"value": "0.12"}, "health_obesity": {"value": "0.3"}}}"#,
        )
        .unwrap();
        assert_eq!(lookup["22071"]["health_diabetes"].value, "0.12");
    }
}
