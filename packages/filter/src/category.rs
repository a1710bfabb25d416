//! Per event type bar chart with toggle and solo selection.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use storm_impact_dataset::Dataset;
use storm_impact_dataset_models::{StatKey, StatSummary};

use crate::{Predicate, Widget, WidgetId, WidgetView, symbol_index};

/// One bar of the category chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryEntry {
    /// Event type name.
    pub name: String,
    /// Count or statistic sum. `None` when no record of this type defines
    /// the statistic.
    pub value: Option<f64>,
    /// Symbol index (position among sorted event types).
    pub symbol: usize,
    /// Bar length relative to the largest value, `0..=1`.
    pub bar_fraction: f64,
    /// Whether the category passes the filter.
    pub enabled: bool,
}

/// Rendered category chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryViewModel {
    /// Widget title.
    pub title: String,
    /// Entries sorted by value, largest first.
    pub entries: Vec<CategoryEntry>,
}

/// Category selection state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryView {
    enabled: BTreeMap<String, bool>,
    stat_key: Option<StatKey>,
}

impl CategoryView {
    /// Creates a view with every event type of the dataset enabled.
    #[must_use]
    pub fn new(dataset: &Dataset) -> Self {
        Self {
            enabled: dataset
                .event_types()
                .into_iter()
                .map(|t| (t.to_string(), true))
                .collect(),
            stat_key: None,
        }
    }

    /// Selected statistic. `None` sizes bars by record count.
    #[must_use]
    pub const fn stat_key(&self) -> Option<StatKey> {
        self.stat_key
    }

    /// Changes the statistic bars are sized by.
    pub const fn set_stat_key(&mut self, stat_key: Option<StatKey>) {
        self.stat_key = stat_key;
    }

    /// Enabled flag per event type.
    #[must_use]
    pub const fn enabled(&self) -> &BTreeMap<String, bool> {
        &self.enabled
    }

    /// Whether an event type passes the filter.
    #[must_use]
    pub fn is_enabled(&self, name: &str) -> bool {
        self.enabled.get(name).copied().unwrap_or(false)
    }

    /// Flips one category.
    pub fn toggle(&mut self, name: &str) {
        if let Some(enabled) = self.enabled.get_mut(name) {
            *enabled = !*enabled;
        }
    }

    /// Enables or disables one category. Unknown names are ignored.
    pub fn set_enabled(&mut self, name: &str, enabled: bool) {
        if let Some(flag) = self.enabled.get_mut(name) {
            *flag = enabled;
        }
    }

    /// Solo selection: isolates `name`, or re-enables everything if `name`
    /// is already the only enabled category.
    pub fn solo(&mut self, name: &str) {
        let enabled_count = self.enabled.values().filter(|e| **e).count();
        let only_this = enabled_count == 1 && self.is_enabled(name);

        for (category, enabled) in &mut self.enabled {
            *enabled = only_this || category == name;
        }
    }

    fn stat_allows_bars(&self) -> bool {
        self.stat_key.is_none_or(StatKey::is_impact)
    }

    /// Builds the chart view.
    #[must_use]
    pub fn view(&self, dataset: &Dataset) -> CategoryViewModel {
        let mut entries: Vec<CategoryEntry> = dataset
            .event_type_values(self.stat_key)
            .into_iter()
            .map(|(name, value)| CategoryEntry {
                name: name.to_string(),
                value,
                symbol: symbol_index(dataset, name),
                bar_fraction: 0.0,
                enabled: self.is_enabled(name),
            })
            .collect();

        entries.sort_by(|a, b| {
            let a = a.value.unwrap_or(f64::NEG_INFINITY);
            let b = b.value.unwrap_or(f64::NEG_INFINITY);
            b.total_cmp(&a)
        });

        if self.stat_allows_bars() {
            let max = entries
                .iter()
                .filter_map(|e| e.value)
                .fold(0.0_f64, f64::max);
            if max > 0.0 {
                for entry in &mut entries {
                    entry.bar_fraction = entry.value.map_or(0.0, |v| (v / max).clamp(0.0, 1.0));
                }
            }
        }

        CategoryViewModel {
            title: self.title(),
            entries,
        }
    }
}

impl Widget for CategoryView {
    fn id(&self) -> WidgetId {
        WidgetId::CategoryView
    }

    fn title(&self) -> String {
        if self.stat_allows_bars() {
            let stat = self
                .stat_key
                .map_or(StatSummary::REPORT_COUNT_NAME, StatKey::name);
            format!("{stat} by Disaster Type")
        } else {
            "Disaster Type".to_string()
        }
    }

    fn compute_filter_predicate(&self) -> Option<Predicate> {
        let enabled: BTreeSet<String> = self
            .enabled
            .iter()
            .filter(|(_, e)| **e)
            .map(|(name, _)| name.clone())
            .collect();

        Some(Box::new(move |record| {
            enabled.contains(&record.event_type_short)
        }))
    }

    fn render(&self, dataset: &Dataset) -> WidgetView {
        WidgetView::Category(self.view(dataset))
    }
}
