#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Cross-filtering over a shared dataset.
//!
//! Each widget owns at most one filter predicate. The [`FilterComposer`]
//! keeps the registered predicates keyed by owner and combines them with
//! logical AND; [`CrossFilter`] re-scans the full dataset whenever any
//! widget's selection changes, so predicates stay independent of each
//! other and of registration order.

pub mod category;
pub mod scatterplot;
pub mod timebar;

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use storm_impact_dataset::{Dataset, NormalizedRecord};
use strum_macros::{AsRefStr, Display, EnumString};

pub use category::{CategoryEntry, CategoryView, CategoryViewModel};
pub use scatterplot::{Axis, BrushExtent, Scale, ScatterPlot, ScatterPlotView, ScatterPoint};
pub use timebar::{Speed, TimeBar, TimeBarView};

/// Number of distinct category symbols. Symbol indices wrap around.
pub const SYMBOL_COUNT: usize = 10;

/// A pure record predicate owned by one widget.
pub type Predicate = Box<dyn Fn(&NormalizedRecord) -> bool>;

/// Errors raised by widget configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilterError {
    /// Playback speed outside the supported set.
    #[error("Unsupported playback speed: {0}x")]
    InvalidSpeed(u32),
}

/// Identifies the widget that owns a predicate.
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
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum WidgetId {
    /// Time bar at the bottom of the map.
    TimeBar,
    /// Per event type bar chart.
    CategoryView,
    /// Two-factor scatter plot.
    ScatterPlot,
    /// Dataset statistic selector.
    StatsView,
    /// Expertise topic selector.
    ExpertView,
}

impl WidgetId {
    /// All widgets in panel order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::TimeBar,
            Self::CategoryView,
            Self::ScatterPlot,
            Self::StatsView,
            Self::ExpertView,
        ]
    }
}

/// Rendered state of a widget.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "widget", rename_all = "camelCase")]
pub enum WidgetView {
    /// See [`TimeBarView`].
    TimeBar(TimeBarView),
    /// See [`CategoryViewModel`].
    Category(CategoryViewModel),
    /// See [`ScatterPlotView`].
    ScatterPlot(ScatterPlotView),
}

/// A widget that can contribute a filter predicate and render a view.
pub trait Widget {
    /// Owner identifier for the predicate.
    fn id(&self) -> WidgetId;

    /// Title shown in the widget header.
    fn title(&self) -> String;

    /// Returns the widget's current predicate, or `None` when the widget
    /// does not restrict the record set.
    fn compute_filter_predicate(&self) -> Option<Predicate>;

    /// Renders the widget's view model for a dataset.
    fn render(&self, dataset: &Dataset) -> WidgetView;
}

/// Registry of owned predicates combined with logical AND.
#[derive(Default)]
pub struct FilterComposer {
    predicates: BTreeMap<WidgetId, Predicate>,
}

impl std::fmt::Debug for FilterComposer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterComposer")
            .field("owners", &self.predicates.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl FilterComposer {
    /// Creates an empty composer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers or replaces an owner's predicate. `None` unregisters it.
    pub fn set(&mut self, owner: WidgetId, predicate: Option<Predicate>) {
        match predicate {
            Some(p) => {
                self.predicates.insert(owner, p);
            }
            None => {
                self.predicates.remove(&owner);
            }
        }
    }

    /// Unregisters an owner's predicate.
    pub fn remove(&mut self, owner: WidgetId) {
        self.predicates.remove(&owner);
    }

    /// Owners with a registered predicate.
    pub fn owners(&self) -> impl Iterator<Item = WidgetId> + '_ {
        self.predicates.keys().copied()
    }

    /// Whether a record passes every registered predicate.
    #[must_use]
    pub fn matches(&self, record: &NormalizedRecord) -> bool {
        self.predicates.values().all(|p| p(record))
    }

    /// Records passing every registered predicate, in input order.
    #[must_use]
    pub fn filter_all<'a>(&self, records: &'a [NormalizedRecord]) -> Vec<&'a NormalizedRecord> {
        records.iter().filter(|r| self.matches(r)).collect()
    }
}

/// A dataset with its current filtered view.
#[derive(Debug)]
pub struct CrossFilter {
    dataset: Arc<Dataset>,
    composer: FilterComposer,
    filtered: Vec<usize>,
}

impl CrossFilter {
    /// Creates a cross filter with no predicates; every record passes.
    #[must_use]
    pub fn new(dataset: Arc<Dataset>) -> Self {
        let filtered = (0..dataset.len()).collect();
        Self {
            dataset,
            composer: FilterComposer::new(),
            filtered,
        }
    }

    /// The unfiltered dataset.
    #[must_use]
    pub const fn dataset(&self) -> &Arc<Dataset> {
        &self.dataset
    }

    /// Re-registers a widget's predicate and re-scans the dataset.
    pub fn update(&mut self, widget: &dyn Widget) {
        self.composer
            .set(widget.id(), widget.compute_filter_predicate());
        self.rescan();
    }

    /// Drops a widget's predicate and re-scans the dataset.
    pub fn remove(&mut self, id: WidgetId) {
        self.composer.remove(id);
        self.rescan();
    }

    /// Indices of the records passing every predicate.
    #[must_use]
    pub fn indices(&self) -> &[usize] {
        &self.filtered
    }

    /// Records passing every predicate, in dataset order.
    #[must_use]
    pub fn filtered(&self) -> Vec<&NormalizedRecord> {
        let data = self.dataset.data();
        self.filtered.iter().map(|&i| &data[i]).collect()
    }

    fn rescan(&mut self) {
        self.filtered = self
            .dataset
            .data()
            .iter()
            .enumerate()
            .filter(|(_, r)| self.composer.matches(r))
            .map(|(i, _)| i)
            .collect();

        log::debug!(
            "Filtered {} of {} records through {:?}",
            self.filtered.len(),
            self.dataset.len(),
            self.composer.owners().collect::<Vec<_>>()
        );
    }
}

/// Symbol index for an event type: its position among the dataset's sorted
/// event types, wrapped to [`SYMBOL_COUNT`].
#[must_use]
pub fn symbol_index(dataset: &Dataset, event_type: &str) -> usize {
    dataset
        .event_types()
        .iter()
        .position(|t| *t == event_type)
        .unwrap_or(0)
        % SYMBOL_COUNT
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::dataset;

    fn sample() -> Dataset {
        dataset(&[
            ("Flood", "2005-08-29T00:00:00Z", "2005-08-29T06:00:00Z", &[]),
            ("Hurricane", "2005-08-29T03:00:00Z", "2005-08-29T09:00:00Z", &[]),
            ("Flood", "2005-08-29T12:00:00Z", "2005-08-29T18:00:00Z", &[]),
            ("Tornado", "2005-08-30T00:00:00Z", "2005-08-30T01:00:00Z", &[]),
        ])
    }

    fn is_type(name: &'static str) -> Predicate {
        Box::new(move |r| r.event_type_short == name)
    }

    fn starts_before(t: i64) -> Predicate {
        Box::new(move |r| r.start_time < t)
    }

    #[test]
    fn empty_composer_passes_everything() {
        let data = sample();
        let composer = FilterComposer::new();
        assert_eq!(composer.filter_all(data.data()).len(), 4);
    }

    #[test]
    fn composition_is_and_and_order_insensitive() {
        let data = sample();
        let cutoff = data.data()[2].start_time + 1;

        let mut a = FilterComposer::new();
        a.set(WidgetId::CategoryView, Some(is_type("Flood")));
        a.set(WidgetId::TimeBar, Some(starts_before(cutoff)));

        let mut b = FilterComposer::new();
        b.set(WidgetId::TimeBar, Some(starts_before(cutoff)));
        b.set(WidgetId::CategoryView, Some(is_type("Flood")));

        let from_a = a.filter_all(data.data());
        let from_b = b.filter_all(data.data());
        assert_eq!(from_a, from_b);

        for record in data.data() {
            let expected = record.event_type_short == "Flood" && record.start_time < cutoff;
            assert_eq!(a.matches(record), expected);
        }
        assert_eq!(from_a.len(), 2);
    }

    #[test]
    fn none_unregisters_predicate() {
        let data = sample();
        let mut composer = FilterComposer::new();
        composer.set(WidgetId::CategoryView, Some(is_type("Tornado")));
        assert_eq!(composer.filter_all(data.data()).len(), 1);
        composer.set(WidgetId::CategoryView, None);
        assert_eq!(composer.filter_all(data.data()).len(), 4);
    }

    #[test]
    fn replacing_predicate_rescans_full_set() {
        let data = Arc::new(sample());
        let mut filter = CrossFilter::new(Arc::clone(&data));

        let mut categories = CategoryView::new(&data);
        categories.solo("Tornado");
        filter.update(&categories);
        assert_eq!(filter.indices(), &[3]);

        categories.solo("Tornado");
        filter.update(&categories);
        assert_eq!(filter.indices(), &[0, 1, 2, 3]);

        categories.toggle("Flood");
        filter.update(&categories);
        assert_eq!(filter.indices(), &[1, 3]);

        filter.remove(WidgetId::CategoryView);
        assert_eq!(filter.filtered().len(), 4);
    }

    #[test]
    fn symbols_follow_sorted_event_types() {
        let data = sample();
        assert_eq!(symbol_index(&data, "Flood"), 0);
        assert_eq!(symbol_index(&data, "Hurricane"), 1);
        assert_eq!(symbol_index(&data, "Tornado"), 2);
    }

    #[test]
    fn widget_id_round_trips_strum() {
        assert_eq!(WidgetId::CategoryView.to_string(), "categoryView");
        assert_eq!("timeBar".parse::<WidgetId>().unwrap(), WidgetId::TimeBar);
    }
}
