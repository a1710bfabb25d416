//! Two-factor scatter plot with a rectangular brush.
//!
//! Records are projected into chart pixel space (x to the right, y
//! downward). The brush extent is kept in the same space, so the filter
//! predicate projects each record and tests it against the extent.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use storm_impact_dataset::{Dataset, NormalizedRecord};
use storm_impact_dataset_models::StatKey;
use strum_macros::{AsRefStr, Display, EnumString};

use crate::{Predicate, Widget, WidgetId, WidgetView, symbol_index};

/// Plot area width in pixels.
pub const CHART_WIDTH: f64 = 250.0;

/// Plot area height in pixels.
pub const CHART_HEIGHT: f64 = 275.0;

/// Fraction of the value range added on each side of an axis domain.
pub const DOMAIN_PADDING: f64 = 0.05;

/// Default x axis: first statistic in the catalogue.
pub const DEFAULT_X_STAT: usize = 0;

/// Default y axis: seventh statistic in the catalogue.
pub const DEFAULT_Y_STAT: usize = 6;

/// Axis scale.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum Scale {
    /// Raw values.
    #[default]
    Linear,
    /// `log10(v + 1)`; only positive values are plotted.
    Log,
}

/// One chart axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Axis {
    /// Plotted statistic.
    pub stat: StatKey,
    /// Value scale.
    pub scale: Scale,
}

impl Axis {
    /// Linear axis over a statistic.
    #[must_use]
    pub const fn linear(stat: StatKey) -> Self {
        Self {
            stat,
            scale: Scale::Linear,
        }
    }

    /// Scaled value of a record, or `None` if the record is not plotted on
    /// this axis.
    #[must_use]
    pub fn value(&self, record: &NormalizedRecord) -> Option<f64> {
        let v = record.stat_value(self.stat)?;
        match self.scale {
            Scale::Linear => Some(v),
            Scale::Log => (v > 0.0).then(|| (v + 1.0).log10()),
        }
    }

    /// `"{name} ({unit})"`, preferring the scaled unit.
    #[must_use]
    pub fn label(&self) -> String {
        format!(
            "{} ({})",
            self.stat.name(),
            self.stat.scaled_unit().unwrap_or_else(|| self.stat.unit())
        )
    }
}

/// Brush rectangle in chart pixels, `[[x0, y0], [x1, y1]]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BrushExtent(pub [[f64; 2]; 2]);

impl BrushExtent {
    /// Whether the brush selects nothing (a click without drag).
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn is_empty(&self) -> bool {
        let [[x0, y0], [x1, y1]] = self.0;
        x0 == x1 && y0 == y1
    }

    /// Inclusive containment test.
    #[must_use]
    pub fn contains(&self, cx: f64, cy: f64) -> bool {
        let [[x0, y0], [x1, y1]] = self.0;
        x0 <= cx && cx <= x1 && y0 <= cy && cy <= y1
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Domain {
    min: f64,
    max: f64,
}

impl Domain {
    fn padded(values: impl Iterator<Item = f64>) -> Option<Self> {
        let (min, max) = values.fold(None, |acc: Option<(f64, f64)>, v| {
            Some(acc.map_or((v, v), |(lo, hi)| (lo.min(v), hi.max(v))))
        })?;
        let pad = (max - min) * DOMAIN_PADDING;
        Some(Self {
            min: min - pad,
            max: max + pad,
        })
    }

    /// Maps a value into `0..=1`. A degenerate domain maps to the middle.
    fn normalize(self, v: f64) -> f64 {
        let span = self.max - self.min;
        if span.abs() < f64::EPSILON {
            0.5
        } else {
            (v - self.min) / span
        }
    }
}

/// Projects records into chart pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Projection {
    x: Axis,
    y: Axis,
    x_domain: Domain,
    y_domain: Domain,
}

impl Projection {
    fn fit(x: Axis, y: Axis, records: &[NormalizedRecord]) -> Option<Self> {
        let plotted = || {
            records
                .iter()
                .filter_map(move |r| Some((x.value(r)?, y.value(r)?)))
        };
        Some(Self {
            x,
            y,
            x_domain: Domain::padded(plotted().map(|(vx, _)| vx))?,
            y_domain: Domain::padded(plotted().map(|(_, vy)| vy))?,
        })
    }

    fn position(&self, record: &NormalizedRecord) -> Option<(f64, f64)> {
        let vx = self.x.value(record)?;
        let vy = self.y.value(record)?;
        Some((
            self.x_domain.normalize(vx) * CHART_WIDTH,
            (1.0 - self.y_domain.normalize(vy)) * CHART_HEIGHT,
        ))
    }
}

/// One plotted record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScatterPoint {
    /// Record index in the dataset.
    pub index: usize,
    /// Chart x, pixels.
    pub cx: f64,
    /// Chart y, pixels (downward).
    pub cy: f64,
    /// Symbol index of the record's event type.
    pub symbol: usize,
    /// Inside the current brush.
    pub brushed: bool,
    /// Event type currently disabled in the category view.
    pub disabled: bool,
}

/// Rendered scatter plot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScatterPlotView {
    /// Widget title.
    pub title: String,
    /// X axis label.
    pub x_label: String,
    /// Y axis label.
    pub y_label: String,
    /// Current brush.
    pub brush: BrushExtent,
    /// Records with both axis values.
    pub points: Vec<ScatterPoint>,
}

/// Scatter plot state.
#[derive(Debug, Clone, PartialEq)]
pub struct ScatterPlot {
    x: Axis,
    y: Axis,
    brush: BrushExtent,
    projection: Option<Projection>,
    disabled_categories: BTreeSet<String>,
}

impl ScatterPlot {
    /// Creates a plot with the default axes fitted to a dataset.
    #[must_use]
    pub fn new(dataset: &Dataset) -> Self {
        let stats = StatKey::all();
        let x = Axis::linear(stats[DEFAULT_X_STAT]);
        let y = Axis::linear(stats[DEFAULT_Y_STAT]);

        Self {
            x,
            y,
            brush: BrushExtent::default(),
            projection: Projection::fit(x, y, dataset.data()),
            disabled_categories: BTreeSet::new(),
        }
    }

    /// Current axes.
    #[must_use]
    pub const fn axes(&self) -> (Axis, Axis) {
        (self.x, self.y)
    }

    /// Changes the axes and refits the projection. The brush is cleared
    /// since its pixels no longer refer to the same values.
    pub fn set_axes(&mut self, x: Axis, y: Axis, dataset: &Dataset) {
        self.x = x;
        self.y = y;
        self.brush = BrushExtent::default();
        self.projection = Projection::fit(x, y, dataset.data());
    }

    /// Current brush.
    #[must_use]
    pub const fn brush(&self) -> BrushExtent {
        self.brush
    }

    /// Sets the brush rectangle in chart pixels.
    pub const fn set_brush(&mut self, extent: BrushExtent) {
        self.brush = extent;
    }

    /// Event types drawn as disabled.
    pub fn set_disabled_categories(&mut self, disabled: impl IntoIterator<Item = String>) {
        self.disabled_categories = disabled.into_iter().collect();
    }

    /// Chart position of a record, if it is plotted.
    #[must_use]
    pub fn position(&self, record: &NormalizedRecord) -> Option<(f64, f64)> {
        self.projection.as_ref()?.position(record)
    }

    /// Builds the chart view.
    #[must_use]
    pub fn view(&self, dataset: &Dataset) -> ScatterPlotView {
        let points = dataset
            .data()
            .iter()
            .enumerate()
            .filter_map(|(index, record)| {
                let (cx, cy) = self.position(record)?;
                Some(ScatterPoint {
                    index,
                    cx,
                    cy,
                    symbol: symbol_index(dataset, &record.event_type_short),
                    brushed: !self.brush.is_empty() && self.brush.contains(cx, cy),
                    disabled: self.disabled_categories.contains(&record.event_type_short),
                })
            })
            .collect();

        ScatterPlotView {
            title: self.title(),
            x_label: self.x.label(),
            y_label: self.y.label(),
            brush: self.brush,
            points,
        }
    }
}

impl Widget for ScatterPlot {
    fn id(&self) -> WidgetId {
        WidgetId::ScatterPlot
    }

    fn title(&self) -> String {
        "2-Factor Scatter Plot".to_string()
    }

    fn compute_filter_predicate(&self) -> Option<Predicate> {
        if self.brush.is_empty() {
            return None;
        }

        let brush = self.brush;
        let projection = self.projection;
        Some(Box::new(move |record| {
            projection
                .and_then(|p| p.position(record))
                .is_some_and(|(cx, cy)| brush.contains(cx, cy))
        }))
    }

    fn render(&self, dataset: &Dataset) -> WidgetView {
        WidgetView::ScatterPlot(self.view(dataset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::dataset;

    const T0: &str = "2005-08-29T00:00:00Z";
    const T1: &str = "2005-08-29T01:00:00Z";

    fn sample() -> Dataset {
        dataset(&[
            (
                "Flood",
                T0,
                T1,
                &[
                    ("event_impact_damagePropertyResult", "0"),
                    ("health_diabetes", "0.1"),
                ],
            ),
            (
                "Flood",
                T0,
                T1,
                &[
                    ("event_impact_damagePropertyResult", "100"),
                    ("health_diabetes", "0.2"),
                ],
            ),
            (
                "Hurricane",
                T0,
                T1,
                &[("event_impact_damagePropertyResult", "50")],
            ),
        ])
    }

    #[test]
    fn default_axes_are_damage_against_diabetes() {
        let plot = ScatterPlot::new(&sample());
        let (x, y) = plot.axes();
        assert_eq!(x.stat, StatKey::PropertyDamage);
        assert_eq!(y.stat, StatKey::Diabetes);
        assert_eq!(x.label(), "Property Damage (Million USD)");
        assert_eq!(y.label(), "Diabetes Rate (%)");
    }

    #[test]
    fn projects_with_padding_and_inverted_y() {
        let data = sample();
        let plot = ScatterPlot::new(&data);

        let (cx, cy) = plot.position(&data.data()[0]).unwrap();
        let pad = 1.0 / 1.1 * 0.05;
        assert!((cx - pad * CHART_WIDTH).abs() < 1e-9);
        assert!((cy - (1.0 - pad) * CHART_HEIGHT).abs() < 1e-9);

        assert!(plot.position(&data.data()[2]).is_none());
    }

    #[test]
    fn log_scale_requires_positive_values() {
        let data = sample();
        let axis = Axis {
            stat: StatKey::PropertyDamage,
            scale: Scale::Log,
        };
        assert_eq!(axis.value(&data.data()[0]), None);
        assert!((axis.value(&data.data()[1]).unwrap() - 101_f64.log10()).abs() < 1e-12);
    }

    #[test]
    fn empty_brush_has_no_predicate() {
        let mut plot = ScatterPlot::new(&sample());
        assert!(plot.compute_filter_predicate().is_none());
        plot.set_brush(BrushExtent([[10.0, 10.0], [10.0, 10.0]]));
        assert!(plot.compute_filter_predicate().is_none());
    }

    #[test]
    fn brush_keeps_plotted_points_inside() {
        let data = sample();
        let mut plot = ScatterPlot::new(&data);
        plot.set_brush(BrushExtent([[0.0, 0.0], [CHART_WIDTH / 2.0, CHART_HEIGHT]]));

        let predicate = plot.compute_filter_predicate().unwrap();
        let kept: Vec<bool> = data.data().iter().map(|r| predicate(r)).collect();
        assert_eq!(kept, vec![true, false, false]);

        let view = plot.view(&data);
        assert_eq!(view.points.len(), 2);
        assert!(view.points[0].brushed);
        assert!(!view.points[1].brushed);
    }

    #[test]
    fn brush_edges_are_inclusive() {
        let brush = BrushExtent([[1.0, 2.0], [3.0, 4.0]]);
        assert!(brush.contains(1.0, 2.0));
        assert!(brush.contains(3.0, 4.0));
        assert!(!brush.contains(3.0001, 4.0));
    }

    #[test]
    fn changing_axes_clears_brush() {
        let data = sample();
        let mut plot = ScatterPlot::new(&data);
        plot.set_brush(BrushExtent([[0.0, 0.0], [5.0, 5.0]]));
        plot.set_axes(
            Axis::linear(StatKey::PropertyDamage),
            Axis::linear(StatKey::PropertyDamage),
            &data,
        );
        assert!(plot.brush().is_empty());
        assert_eq!(plot.view(&data).points.len(), 3);
    }

    #[test]
    fn disabled_categories_are_marked() {
        let data = sample();
        let mut plot = ScatterPlot::new(&data);
        plot.set_disabled_categories(["Flood".to_string()]);
        assert!(plot.view(&data).points.iter().all(|p| p.disabled));
    }
}
