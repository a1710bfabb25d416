//! Playback time bar over the dataset's time range.
//!
//! The playhead is an offset from `t_min` in milliseconds. It starts at the
//! end of the range so that every record is initially visible, and advances
//! `speed × TIME_SCALE_MS` per animation frame while playing.

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use storm_impact_dataset::Dataset;
use storm_impact_dataset_models::TimeInfo;
use strum_macros::{AsRefStr, Display, EnumString};

use crate::{FilterError, Predicate, Widget, WidgetId, WidgetView};

/// Histogram resolution.
pub const N_BINS: usize = 120;

/// Playhead advance per frame and speed unit.
pub const TIME_SCALE_MS: i64 = 180_000;

/// Step size of the rewind/forward buttons, in speed units.
pub const STEP_UNITS: i64 = 200;

/// A tick label is placed every this many bins.
pub const LABEL_EVERY: usize = 15;

/// Playback speed multiplier.
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
pub enum Speed {
    /// One unit per frame.
    #[serde(rename = "1x")]
    #[strum(serialize = "1x")]
    X1,
    /// Four units per frame.
    #[default]
    #[serde(rename = "4x")]
    #[strum(serialize = "4x")]
    X4,
    /// Sixteen units per frame.
    #[serde(rename = "16x")]
    #[strum(serialize = "16x")]
    X16,
}

impl Speed {
    /// Multiplier applied to [`TIME_SCALE_MS`].
    #[must_use]
    pub const fn multiplier(self) -> i64 {
        match self {
            Self::X1 => 1,
            Self::X4 => 4,
            Self::X16 => 16,
        }
    }

    /// All speeds, slowest first.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::X1, Self::X4, Self::X16]
    }
}

impl TryFrom<u32> for Speed {
    type Error = FilterError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::X1),
            4 => Ok(Self::X4),
            16 => Ok(Self::X16),
            other => Err(FilterError::InvalidSpeed(other)),
        }
    }
}

/// Rendered time bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeBarView {
    /// Records active per bin.
    pub histogram: Vec<u32>,
    /// Largest bin count.
    pub max_count: u32,
    /// `(bin, label)` pairs, one every [`LABEL_EVERY`] bins.
    pub tick_labels: Vec<(usize, String)>,
    /// `start - end` of the padded range.
    pub range_label: String,
    /// Playhead position as a fraction of the range.
    pub indicator: f64,
    /// Whether playback is running.
    pub playing: bool,
    /// Playback speed.
    pub speed: Speed,
    /// Whether every record started so far is shown.
    pub accumulating: bool,
}

/// Playback state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeBar {
    time_info: TimeInfo,
    time: i64,
    speed: Speed,
    accumulating: bool,
    playing: bool,
}

impl TimeBar {
    /// Creates a paused time bar with the playhead at the end of the range.
    #[must_use]
    pub fn new(dataset: &Dataset) -> Self {
        let time_info = dataset.time_info();
        Self {
            time_info,
            time: time_info.t_range,
            speed: Speed::default(),
            accumulating: true,
            playing: false,
        }
    }

    /// Playhead offset from `t_min`, milliseconds.
    #[must_use]
    pub const fn time(&self) -> i64 {
        self.time
    }

    /// Absolute playhead time, epoch milliseconds.
    #[must_use]
    pub const fn current_time(&self) -> i64 {
        self.time_info.t_min + self.time
    }

    /// Whether playback is running.
    #[must_use]
    pub const fn is_playing(&self) -> bool {
        self.playing
    }

    /// Whether every record started so far is shown.
    #[must_use]
    pub const fn is_accumulating(&self) -> bool {
        self.accumulating
    }

    /// Current speed.
    #[must_use]
    pub const fn speed(&self) -> Speed {
        self.speed
    }

    /// Sets the playback speed.
    pub const fn set_speed(&mut self, speed: Speed) {
        self.speed = speed;
    }

    /// Flips accumulation mode.
    pub const fn toggle_accumulation(&mut self) {
        self.accumulating = !self.accumulating;
    }

    /// Starts or pauses playback. Starting at the end rewinds to the start.
    pub const fn play_pause(&mut self) {
        if self.playing {
            self.playing = false;
        } else {
            if self.time >= self.time_info.t_range {
                self.time = 0;
            }
            self.playing = true;
        }
    }

    /// Advances one animation frame. Playback stops at the end of the
    /// range. Returns whether the playhead moved.
    pub fn tick(&mut self) -> bool {
        if !self.playing {
            return false;
        }

        let before = self.time;
        let next = self.time + self.speed.multiplier() * TIME_SCALE_MS;
        if next > self.time_info.t_range {
            self.time = self.time_info.t_range;
            self.playing = false;
            log::debug!("Playback reached the end of the range");
        } else {
            self.time = next;
        }

        self.time != before
    }

    /// Moves the playhead by `units` speed units, clamped to the range.
    pub fn step(&mut self, units: i64) {
        self.time = (self.time + units * TIME_SCALE_MS).clamp(0, self.time_info.t_range.max(0));
    }

    /// Moves the playhead to a fraction of the range (e.g. a click on the
    /// histogram).
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn select_fraction(&mut self, fraction: f64) {
        let fraction = if fraction.is_nan() {
            0.0
        } else {
            fraction.clamp(0.0, 1.0)
        };
        self.time = (fraction * self.time_info.t_range as f64) as i64;
    }

    /// Moves the playhead to an absolute time, clamped to the range.
    pub fn seek(&mut self, at_ms: i64) {
        self.time = (at_ms - self.time_info.t_min).clamp(0, self.time_info.t_range.max(0));
    }

    /// Playhead position as a fraction of the range.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn indicator(&self) -> f64 {
        if self.time_info.t_range <= 0 {
            return 0.0;
        }
        self.time as f64 / self.time_info.t_range as f64
    }

    /// Builds the bar view.
    #[must_use]
    pub fn view(&self, dataset: &Dataset) -> TimeBarView {
        let histogram = dataset.time_histogram(N_BINS);
        let max_count = histogram.iter().copied().max().unwrap_or(0);

        TimeBarView {
            histogram,
            max_count,
            tick_labels: tick_labels(self.time_info, N_BINS),
            range_label: range_label(self.time_info),
            indicator: self.indicator(),
            playing: self.playing,
            speed: self.speed,
            accumulating: self.accumulating,
        }
    }
}

impl Widget for TimeBar {
    fn id(&self) -> WidgetId {
        WidgetId::TimeBar
    }

    fn title(&self) -> String {
        "Time".to_string()
    }

    fn compute_filter_predicate(&self) -> Option<Predicate> {
        let current = self.current_time();
        let accumulating = self.accumulating;
        Some(Box::new(move |record| {
            Dataset::filter_by_time(record, current, accumulating)
        }))
    }

    fn render(&self, dataset: &Dataset) -> WidgetView {
        WidgetView::TimeBar(self.view(dataset))
    }
}

/// `M/D-H:00` labels (UTC) at the start of every [`LABEL_EVERY`]th bin.
#[must_use]
pub fn tick_labels(info: TimeInfo, n_bins: usize) -> Vec<(usize, String)> {
    if n_bins == 0 {
        return Vec::new();
    }

    (0..n_bins)
        .step_by(LABEL_EVERY)
        .filter_map(|bin| {
            let offset = i64::try_from(bin).ok()? * info.t_range / i64::try_from(n_bins).ok()?;
            let dt = DateTime::from_timestamp_millis(info.t_min + offset)?;
            Some((bin, dt.format("%-m/%-d-%-H:00").to_string()))
        })
        .collect()
}

/// `YYYY-MM-DDTHH:MMZ - YYYY-MM-DDTHH:MMZ` for the padded range.
#[must_use]
pub fn range_label(info: TimeInfo) -> String {
    let format = |t: i64| {
        DateTime::from_timestamp_millis(t).map(|dt| dt.format("%Y-%m-%dT%H:%MZ").to_string())
    };

    match (format(info.t_min), format(info.t_max)) {
        (Some(start), Some(end)) => format!("{start} - {end}"),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use storm_impact_dataset_models::HOUR_MS;

    use super::*;
    use crate::test_support::dataset;

    fn katrina() -> Dataset {
        dataset(&[
            ("Hurricane", "2005-08-29T10:00:00Z", "2005-08-29T12:00:00Z", &[]),
            ("Flood", "2005-08-29T14:00:00Z", "2005-08-29T20:00:00Z", &[]),
        ])
    }

    #[test]
    fn starts_paused_at_end() {
        let data = katrina();
        let bar = TimeBar::new(&data);
        assert_eq!(bar.time(), data.time_info().t_range);
        assert_eq!(bar.current_time(), data.time_info().t_max);
        assert!(!bar.is_playing());
        assert!(bar.is_accumulating());
        assert_eq!(bar.speed(), Speed::X4);
    }

    #[test]
    fn play_from_end_rewinds() {
        let mut bar = TimeBar::new(&katrina());
        bar.play_pause();
        assert!(bar.is_playing());
        assert_eq!(bar.time(), 0);

        assert!(bar.tick());
        assert_eq!(bar.time(), 4 * TIME_SCALE_MS);

        bar.play_pause();
        assert!(!bar.tick());
        assert_eq!(bar.time(), 4 * TIME_SCALE_MS);
    }

    #[test]
    fn playback_stops_at_end() {
        let data = katrina();
        let mut bar = TimeBar::new(&data);
        bar.set_speed(Speed::X16);
        bar.play_pause();

        let mut frames = 0;
        while bar.is_playing() {
            bar.tick();
            frames += 1;
            assert!(frames < 1000);
        }
        assert_eq!(bar.time(), data.time_info().t_range);
    }

    #[test]
    fn step_and_select_clamp() {
        let data = katrina();
        let mut bar = TimeBar::new(&data);
        bar.step(STEP_UNITS);
        assert_eq!(bar.time(), data.time_info().t_range);
        bar.step(-10 * STEP_UNITS);
        assert_eq!(bar.time(), 0);

        bar.select_fraction(0.5);
        assert_eq!(bar.time(), data.time_info().t_range / 2);
        bar.select_fraction(3.0);
        assert_eq!(bar.time(), data.time_info().t_range);
        bar.select_fraction(-1.0);
        assert_eq!(bar.time(), 0);
    }

    #[test]
    fn seek_is_absolute_and_clamped() {
        let data = katrina();
        let info = data.time_info();
        let mut bar = TimeBar::new(&data);

        bar.seek(info.t_min + HOUR_MS);
        assert_eq!(bar.time(), HOUR_MS);
        assert_eq!(bar.current_time(), info.t_min + HOUR_MS);

        bar.seek(0);
        assert_eq!(bar.time(), 0);
        bar.seek(i64::MAX / 2);
        assert_eq!(bar.time(), info.t_range);
    }

    #[test]
    fn predicate_follows_playhead() {
        let data = katrina();
        let mut bar = TimeBar::new(&data);
        let visible = |bar: &TimeBar| {
            let p = bar.compute_filter_predicate().unwrap();
            data.data().iter().filter(|r| p(r)).count()
        };

        assert_eq!(visible(&bar), 2);

        // 11:00, one hour past t_min + 1h padding
        bar.select_fraction(0.0);
        bar.step(2 * HOUR_MS / TIME_SCALE_MS);
        assert_eq!(visible(&bar), 1);

        bar.toggle_accumulation();
        assert_eq!(visible(&bar), 1);

        // 13:00, between the two events
        bar.step(2 * HOUR_MS / TIME_SCALE_MS);
        assert_eq!(visible(&bar), 0);
        bar.toggle_accumulation();
        assert_eq!(visible(&bar), 1);
    }

    #[test]
    fn labels_use_utc() {
        let info = TimeInfo::from_bounds(
            DateTime::parse_from_rfc3339("2005-08-29T10:00:00Z")
                .unwrap()
                .timestamp_millis(),
            DateTime::parse_from_rfc3339("2005-08-30T10:00:00Z")
                .unwrap()
                .timestamp_millis(),
        );

        let ticks = tick_labels(info, N_BINS);
        assert_eq!(ticks.len(), 8);
        assert_eq!(ticks[0], (0, "8/29-9:00".to_string()));

        assert_eq!(range_label(info), "2005-08-29T09:00Z - 2005-08-30T11:00Z");
    }

    #[test]
    fn speed_parses_from_multiplier() {
        assert_eq!(Speed::try_from(16_u32).unwrap(), Speed::X16);
        assert_eq!(Speed::try_from(2_u32), Err(FilterError::InvalidSpeed(2)));
        assert_eq!(Speed::X1.to_string(), "1x");
    }

    #[test]
    fn view_has_fixed_bins() {
        let data = katrina();
        let view = TimeBar::new(&data).view(&data);
        assert_eq!(view.histogram.len(), N_BINS);
        assert_eq!(view.max_count, 1);
        assert!((view.indicator - 1.0).abs() < f64::EPSILON);
    }
}
