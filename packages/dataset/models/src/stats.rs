//! Statistic catalogue.
//!
//! Every numeric field a record can carry is either an impact statistic
//! (damage, deaths, injuries reported for the event) or a county health
//! statistic merged in from the health lookup. Impact statistics aggregate
//! across a region by sum, health statistics by mean.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::IMPACT_PREFIX;

/// Whether a statistic describes event impact or county health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StatKind {
    /// Reported event impact. Summed per region.
    Impact,
    /// County health factor. Averaged per region.
    Health,
}

/// A known statistic field.
///
/// The serialized form is the raw field name the query layer uses.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum StatKey {
    // ── Impact ──────────────────────────────────────────
    /// Property damage in USD
    #[serde(rename = "event_impact_damagePropertyResult")]
    #[strum(serialize = "event_impact_damagePropertyResult")]
    PropertyDamage,
    /// Crop damage in USD
    #[serde(rename = "event_impact_damageCropResult")]
    #[strum(serialize = "event_impact_damageCropResult")]
    CropDamage,
    /// Deaths directly caused by the event
    #[serde(rename = "event_impact_deathDirectResult")]
    #[strum(serialize = "event_impact_deathDirectResult")]
    DirectDeath,
    /// Injuries directly caused by the event
    #[serde(rename = "event_impact_injuryDirectResult")]
    #[strum(serialize = "event_impact_injuryDirectResult")]
    DirectInjury,
    /// Deaths indirectly caused by the event
    #[serde(rename = "event_impact_deathIndirectResult")]
    #[strum(serialize = "event_impact_deathIndirectResult")]
    IndirectDeath,
    /// Injuries indirectly caused by the event
    #[serde(rename = "event_impact_injuryIndirectResult")]
    #[strum(serialize = "event_impact_injuryIndirectResult")]
    IndirectInjury,

    // ── Health ──────────────────────────────────────────
    /// Share of adults with diabetes
    #[serde(rename = "health_diabetes")]
    #[strum(serialize = "health_diabetes")]
    Diabetes,
    /// Share of adults with obesity
    #[serde(rename = "health_obesity")]
    #[strum(serialize = "health_obesity")]
    Obesity,
    /// Average mentally unhealthy days per month
    #[serde(rename = "health_poor_mental")]
    #[strum(serialize = "health_poor_mental")]
    PoorMentalHealth,
    /// Mental health providers per resident
    #[serde(rename = "health_mental_provider")]
    #[strum(serialize = "health_mental_provider")]
    MentalHealthProvider,
    /// Share of births with low birthweight
    #[serde(rename = "health_low_birthweight")]
    #[strum(serialize = "health_low_birthweight")]
    LowBirthweight,
    /// Share of residents without insurance
    #[serde(rename = "health_uninsured")]
    #[strum(serialize = "health_uninsured")]
    Uninsured,
    /// Share of women receiving annual mammograms
    #[serde(rename = "health_mammogram")]
    #[strum(serialize = "health_mammogram")]
    Mammogram,
    /// Share of residents receiving flu vaccination
    #[serde(rename = "health_flu_vaccine")]
    #[strum(serialize = "health_flu_vaccine")]
    FluVaccine,
    /// Food environment index (0-10)
    #[serde(rename = "health_food_env")]
    #[strum(serialize = "health_food_env")]
    FoodEnvironment,
    /// Injury deaths per 100k residents
    #[serde(rename = "health_injury_death")]
    #[strum(serialize = "health_injury_death")]
    InjuryDeath,
}

impl StatKey {
    /// Returns whether this is an impact or health statistic.
    #[must_use]
    pub const fn kind(self) -> StatKind {
        match self {
            Self::PropertyDamage
            | Self::CropDamage
            | Self::DirectDeath
            | Self::DirectInjury
            | Self::IndirectDeath
            | Self::IndirectInjury => StatKind::Impact,
            Self::Diabetes
            | Self::Obesity
            | Self::PoorMentalHealth
            | Self::MentalHealthProvider
            | Self::LowBirthweight
            | Self::Uninsured
            | Self::Mammogram
            | Self::FluVaccine
            | Self::FoodEnvironment
            | Self::InjuryDeath => StatKind::Health,
        }
    }

    /// Returns `true` for impact statistics.
    #[must_use]
    pub fn is_impact(self) -> bool {
        self.kind() == StatKind::Impact
    }

    /// Human-readable name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::PropertyDamage => "Property Damage",
            Self::CropDamage => "Crop Damage",
            Self::DirectDeath => "Direct Death",
            Self::DirectInjury => "Direct Injury",
            Self::IndirectDeath => "Indirect Death",
            Self::IndirectInjury => "Indirect Injury",
            Self::Diabetes => "Diabetes Rate",
            Self::Obesity => "Adult Obesity Rate",
            Self::PoorMentalHealth => "Mentally Unhealthy Days",
            Self::MentalHealthProvider => "Mental Health Provider Rate",
            Self::LowBirthweight => "Low birthweight Rate",
            Self::Uninsured => "Uninsured Rate",
            Self::Mammogram => "Annual Mammogram Rate",
            Self::FluVaccine => "Flu Vaccination Rate",
            Self::FoodEnvironment => "Food Environment Index",
            Self::InjuryDeath => "Injury Deaths",
        }
    }

    /// Display unit after [`Self::scalar`] is applied. Empty when unitless.
    #[must_use]
    pub const fn unit(self) -> &'static str {
        match self {
            Self::PropertyDamage | Self::CropDamage => "USD",
            Self::Diabetes
            | Self::Obesity
            | Self::MentalHealthProvider
            | Self::LowBirthweight
            | Self::Uninsured
            | Self::Mammogram
            | Self::FluVaccine => "%",
            _ => "",
        }
    }

    /// Unit used on chart axes after dividing by [`Self::ratio`].
    #[must_use]
    pub const fn scaled_unit(self) -> Option<&'static str> {
        match self {
            Self::PropertyDamage | Self::CropDamage => Some("Million USD"),
            _ => None,
        }
    }

    /// Divisor applied to axis tick values.
    #[must_use]
    pub const fn ratio(self) -> f64 {
        match self {
            Self::PropertyDamage | Self::CropDamage => 1e6,
            _ => 1.0,
        }
    }

    /// Multiplier applied before display (rates are stored as fractions).
    #[must_use]
    pub const fn scalar(self) -> f64 {
        match self {
            Self::Diabetes
            | Self::Obesity
            | Self::MentalHealthProvider
            | Self::LowBirthweight
            | Self::Uninsured
            | Self::Mammogram
            | Self::FluVaccine => 100.0,
            _ => 1.0,
        }
    }

    /// Expertise topic associated with a health statistic, if any.
    #[must_use]
    pub const fn topic(self) -> Option<&'static str> {
        match self {
            Self::Diabetes => Some("Diabetes"),
            Self::Obesity => Some("Obesity"),
            Self::PoorMentalHealth | Self::MentalHealthProvider => Some("Mental Health"),
            Self::FoodEnvironment => Some("Food Security"),
            _ => None,
        }
    }

    /// Impact statistics in display order.
    #[must_use]
    pub const fn impact() -> &'static [Self] {
        &[
            Self::PropertyDamage,
            Self::CropDamage,
            Self::DirectDeath,
            Self::DirectInjury,
            Self::IndirectDeath,
            Self::IndirectInjury,
        ]
    }

    /// Health statistics in display order.
    #[must_use]
    pub const fn health() -> &'static [Self] {
        &[
            Self::Diabetes,
            Self::Obesity,
            Self::PoorMentalHealth,
            Self::MentalHealthProvider,
            Self::LowBirthweight,
            Self::Uninsured,
            Self::Mammogram,
            Self::FluVaccine,
            Self::FoodEnvironment,
            Self::InjuryDeath,
        ]
    }

    /// All statistics, impact first.
    #[must_use]
    pub fn all() -> Vec<Self> {
        Self::impact()
            .iter()
            .chain(Self::health())
            .copied()
            .collect()
    }

    /// Distinct health topics in catalogue order.
    #[must_use]
    pub fn health_topics() -> Vec<&'static str> {
        let mut topics: Vec<&'static str> = Vec::new();
        for topic in Self::health().iter().filter_map(|k| k.topic()) {
            if !topics.contains(&topic) {
                topics.push(topic);
            }
        }
        topics
    }
}

/// Returns `true` if a raw field name denotes an impact statistic.
///
/// Works for field names outside the catalogue as well, so that any
/// `event_impact_*` field is summed rather than averaged.
#[must_use]
pub fn is_impact_field(field: &str) -> bool {
    field.starts_with(IMPACT_PREFIX)
}
