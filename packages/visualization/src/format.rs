//! Number and term formatting for labels, tooltips, and tables.

use storm_impact_dataset_models::StatKey;

/// Shown in place of negative (missing) values.
pub const VALUE_NA: &str = "N/A";

/// Abbreviates large numbers with a `K`/`M`/`B` suffix (or ` Thousand`,
/// ` Million`, ` Billion` when `full` is set) and two decimals.
///
/// Negative values are missing values and render as [`VALUE_NA`]. Values up
/// to one thousand are printed as is.
#[must_use]
pub fn format_number(num: f64, full: bool) -> String {
    if num < 0.0 || num.is_nan() {
        return VALUE_NA.to_string();
    }

    let (scaled, suffix) = if num > 1e9 {
        (num / 1e9, if full { " Billion" } else { "B" })
    } else if num > 1e6 {
        (num / 1e6, if full { " Million" } else { "M" })
    } else if num > 1e3 {
        (num / 1e3, if full { " Thousand" } else { "K" })
    } else {
        return format_decimal(num, 6, 1e-6);
    };

    format!("{scaled:.2}{suffix}")
}

/// Prints `num` with the fewest decimals (up to `max_decimals`) that keep it
/// within `epsilon` of its true value.
#[must_use]
pub fn format_decimal(num: f64, max_decimals: usize, epsilon: f64) -> String {
    for decimals in 0..=max_decimals {
        let text = format!("{num:.decimals$}");
        if text
            .parse::<f64>()
            .is_ok_and(|rounded| (rounded - num).abs() < epsilon)
        {
            return text;
        }
    }
    format!("{num:.max_decimals$}")
}

/// Formats a statistic value for display: applies the statistic's scalar,
/// rounds to two decimals, abbreviates, and appends the unit.
#[must_use]
pub fn format_stat(value: f64, key: StatKey) -> String {
    let rounded = format_decimal(value * key.scalar(), 2, 1e-6)
        .parse::<f64>()
        .unwrap_or(value);
    let number = format_number(rounded, true);

    if number == VALUE_NA || key.unit().is_empty() {
        number
    } else {
        format!("{number} {}", key.unit())
    }
}

/// Expands storm classification and unit abbreviations.
#[must_use]
pub fn term_translate(term: &str) -> &str {
    match term {
        "TS" => "Tropical Storm",
        "H1" => "Hurricane 1",
        "H2" => "Hurricane 2",
        "H3" => "Hurricane 3",
        "H4" => "Hurricane 4",
        "H5" => "Hurricane 5",
        "HectoPA" => "hPa",
        "KN" => "Knot",
        other => other,
    }
}

/// Display unit of a unit URI (its last path segment, translated).
#[must_use]
pub fn parse_unit(uri: &str) -> &str {
    term_translate(uri.rsplit('/').next().unwrap_or(uri))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abbreviates_large_numbers() {
        assert_eq!(format_number(2_500_000_000.0, false), "2.50B");
        assert_eq!(format_number(2_500_000_000.0, true), "2.50 Billion");
        assert_eq!(format_number(1_234_567.0, false), "1.23M");
        assert_eq!(format_number(45_600.0, true), "45.60 Thousand");
    }

    #[test]
    fn small_numbers_print_as_is() {
        assert_eq!(format_number(1000.0, false), "1000");
        assert_eq!(format_number(12.5, false), "12.5");
        assert_eq!(format_number(0.0, false), "0");
    }

    #[test]
    fn negatives_are_missing() {
        assert_eq!(format_number(-1.0, true), "N/A");
    }

    #[test]
    fn decimal_uses_fewest_places() {
        assert_eq!(format_decimal(3.0, 6, 1e-6), "3");
        assert_eq!(format_decimal(0.25, 6, 1e-6), "0.25");
        assert_eq!(format_decimal(1.0 / 3.0, 2, 1e-6), "0.33");
    }

    #[test]
    fn stat_applies_scalar_and_unit() {
        assert_eq!(format_stat(0.123, StatKey::Diabetes), "12.3 %");
        assert_eq!(format_stat(2_000_000.0, StatKey::PropertyDamage), "2.00 Million USD");
        assert_eq!(format_stat(4.0, StatKey::DirectDeath), "4");
        assert_eq!(format_stat(-1.0, StatKey::Obesity), "N/A");
    }

    #[test]
    fn translates_terms() {
        assert_eq!(term_translate("H3"), "Hurricane 3");
        assert_eq!(term_translate("XX"), "XX");
        assert_eq!(parse_unit("http://qudt.org/vocab/unit/KN"), "Knot");
        assert_eq!(parse_unit("HectoPA"), "hPa");
    }
}
