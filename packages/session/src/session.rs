//! The staged workflow: state, checkpoint history, and message handling.
//!
//! The session never performs I/O. Handling a message may yield
//! [`Request`]s that the host fulfils and answers with the matching
//! `*Loaded` message, carrying back the request's token.

use std::sync::Arc;

use storm_impact_dataset::{Dataset, NormalizedRecord};
use storm_impact_dataset_models::{FieldMapping, StatKey};
use storm_impact_filter::WidgetId;
use storm_impact_visualization::{ImpactDetail, LayerArgs, Rendered, VisualizationKind};

use crate::draw::DrawnArea;
use crate::experts::{Expert, ExpertTopics};
use crate::menu::{MenuContext, MenuOption, menu_options, placeholder};
use crate::message::{ExpertsToggle, Message};
use crate::request::{QueryCache, RequestKind, RequestToken, RequestTracker};
use crate::stage::Stage;
use crate::storms::{ImpactSource, Landfall, StormRegistry, TrackSource, track_line_wkt};
use crate::widgets::WidgetFolds;

/// Where to load impact records from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImpactRecordsSource {
    /// Static result file named after the storm.
    Precomputed(String),
    /// Counties intersecting these buffer polygons (WKT), one per track
    /// point.
    TrackBuffers(Vec<String>),
    /// Counties intersecting a drawn polygon (WKT).
    DrawnArea(String),
}

/// A load the host must perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Load the storm list.
    StormList {
        /// Token to answer with.
        token: RequestToken,
    },
    /// Load a storm's track.
    Track {
        /// Token to answer with.
        token: RequestToken,
        /// Storm identifier.
        storm: String,
        /// Where the track comes from.
        source: TrackSource,
    },
    /// Load impact records.
    ImpactRecords {
        /// Token to answer with.
        token: RequestToken,
        /// Where the records come from.
        source: ImpactRecordsSource,
    },
    /// Look up the states a track crosses.
    ImpactStates {
        /// Token to answer with.
        token: RequestToken,
        /// Track as a WKT `LINESTRING`.
        track_line: String,
    },
    /// Look up experts.
    Experts {
        /// Token to answer with.
        token: RequestToken,
        /// Required topics.
        topics: Vec<String>,
    },
}

/// Everything a checkpoint restores.
#[derive(Debug, Clone)]
pub struct SessionState {
    /// 3D view.
    pub is_3d: bool,
    /// Loading indicator.
    pub loading: bool,
    /// Current stage.
    pub stage: Stage,
    /// Selected storm identifier, empty when none.
    pub storm_name: String,
    /// Hand-drawn impact area, `Some` while drawing.
    pub drawn_area: Option<DrawnArea>,
    /// Loaded impact records.
    pub data: Option<Arc<Dataset>>,
    /// States crossed by the storm track.
    pub impact_states: Vec<String>,
    /// Selected statistic.
    pub stat_key: Option<StatKey>,
    /// Selected visualization.
    pub visualization: Option<VisualizationKind>,
    /// Open impact detail popup.
    pub impact_detail: Option<ImpactDetail>,
    /// Whether the expert layer is shown.
    pub experts_enabled: bool,
    /// Loaded experts.
    pub experts: Option<Vec<Expert>>,
    /// Open expert popup.
    pub expert_id: Option<String>,
    /// Whether the expert list is open.
    pub show_expert_list: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            is_3d: false,
            loading: false,
            stage: Stage::STORM_LIST,
            storm_name: String::new(),
            drawn_area: None,
            data: None,
            impact_states: Vec::new(),
            stat_key: None,
            visualization: None,
            impact_detail: None,
            experts_enabled: false,
            experts: None,
            expert_id: None,
            show_expert_list: false,
        }
    }
}

/// A user session.
#[derive(Debug)]
pub struct Session {
    state: SessionState,
    history: Vec<SessionState>,
    registry: StormRegistry,
    requests: RequestTracker,
    cache: QueryCache,
    widgets: WidgetFolds,
    expert_topics: ExpertTopics,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(StormRegistry::load())
    }
}

impl Session {
    /// Creates a session on the storm list stage.
    #[must_use]
    pub fn new(registry: StormRegistry) -> Self {
        Self {
            state: SessionState::default(),
            history: Vec::new(),
            registry,
            requests: RequestTracker::new(),
            cache: QueryCache::new(),
            widgets: WidgetFolds::new(),
            expert_topics: ExpertTopics::new(),
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &SessionState {
        &self.state
    }

    /// Number of checkpoints.
    #[must_use]
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Storm registry.
    #[must_use]
    pub const fn registry(&self) -> &StormRegistry {
        &self.registry
    }

    /// Landfall markers shown on the storm list stage.
    #[must_use]
    pub fn landfalls(&self) -> &[Landfall] {
        &self.registry.landfalls
    }

    /// Cached storm list and track.
    #[must_use]
    pub const fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// Widget fold state.
    #[must_use]
    pub const fn widgets(&self) -> &WidgetFolds {
        &self.widgets
    }

    /// Mutable widget fold state.
    pub const fn widgets_mut(&mut self) -> &mut WidgetFolds {
        &mut self.widgets
    }

    /// Expertise topic selection.
    #[must_use]
    pub const fn expert_topics(&self) -> &ExpertTopics {
        &self.expert_topics
    }

    /// Mutable expertise topic selection.
    pub const fn expert_topics_mut(&mut self) -> &mut ExpertTopics {
        &mut self.expert_topics
    }

    /// Omnibar placeholder for the current stage.
    #[must_use]
    pub fn placeholder(&self) -> String {
        placeholder(self.state.stage, &self.state.storm_name)
    }

    /// Omnibar menu for the current stage.
    #[must_use]
    pub fn menu(&self) -> Vec<MenuOption> {
        let ctx = MenuContext {
            storm_name: &self.state.storm_name,
            storms: self.cache.storm_list().unwrap_or_default(),
            has_data: self.state.data.is_some(),
            experts_enabled: self.state.experts_enabled,
            stat_key: self.state.stat_key,
        };
        menu_options(self.state.stage, &ctx)
    }

    /// Runs a menu option's action.
    pub fn select(&mut self, option: &MenuOption) -> Vec<Request> {
        log::debug!("Selected '{}'", option.title);
        option
            .action
            .messages()
            .into_iter()
            .flat_map(|message| self.apply(message))
            .collect()
    }

    /// Searches the expert topics currently selected.
    pub fn search_experts(&mut self) -> Vec<Request> {
        let topics = self
            .expert_topics
            .selected_topics()
            .into_iter()
            .map(str::to_string)
            .collect();
        self.apply(Message::EnableExperts(ExpertsToggle::Search(topics)))
    }

    /// Map layers of the selected visualization over `records`, grouped by
    /// the loaded dataset's region fields.
    #[must_use]
    pub fn layers(&self, records: &[&NormalizedRecord]) -> Option<Rendered> {
        let kind = self.state.visualization?;
        let default_fields;
        let fields = if let Some(data) = &self.state.data {
            data.fields()
        } else {
            default_fields = FieldMapping::default();
            &default_fields
        };

        Some(kind.layers(
            records,
            fields,
            &LayerArgs {
                is_3d: self.state.is_3d,
                stat_key: self.state.stat_key,
            },
        ))
    }

    /// Handles a message and returns the loads it makes necessary.
    pub fn apply(&mut self, message: Message) -> Vec<Request> {
        let storm_before = self.state.storm_name.clone();
        let mut requests = Vec::new();

        match message {
            Message::Reset => {
                self.state = SessionState::default();
                self.history.clear();
                self.requests.invalidate_all();
            }
            Message::Back => match self.history.pop() {
                Some(previous) => self.state = previous,
                None => log::debug!("No checkpoint to go back to"),
            },
            Message::Loading(loading) => self.state.loading = loading,
            Message::View { is_3d } => self.state.is_3d = is_3d,
            Message::Checkpoint => self.history.push(self.state.clone()),
            Message::SetStage(stage) => self.state.stage = stage,
            Message::SetStorm(storm) => {
                log::info!("Selected storm {storm}");
                self.state.storm_name = storm;
            }
            Message::DrawImpactArea => self.state.drawn_area = Some(DrawnArea::new()),
            Message::SetDrawnImpactArea(area) => self.state.drawn_area = Some(area),
            Message::StormListLoaded { token, storms } => {
                if self.requests.complete(token) {
                    log::info!("Loaded {} storms", storms.len());
                    self.cache.set_storm_list(storms);
                }
            }
            Message::TrackLoaded { token, storm, track } => {
                if self.requests.complete(token) {
                    log::info!("Loaded {} track points for {storm}", track.len());
                    self.cache.set_track(storm, track);
                    self.state.loading = false;
                }
            }
            Message::DataLoaded { token, dataset } => {
                if self.requests.complete(token) {
                    log::info!("Loaded {} impact records", dataset.len());
                    self.state.data = Some(dataset);
                    self.state.loading = false;
                    requests.extend(self.request_impact_states());
                }
            }
            Message::ImpactStatesLoaded { token, states } => {
                if self.requests.complete(token) {
                    let mut unique: Vec<String> = Vec::new();
                    for state in states {
                        if !unique.contains(&state) {
                            unique.push(state);
                        }
                    }
                    self.state.impact_states = unique;
                }
            }
            Message::ExpertsLoaded { token, experts } => {
                if self.requests.complete(token) {
                    log::info!("Loaded {} experts", experts.len());
                    self.state.experts_enabled = true;
                    self.state.experts = Some(experts);
                }
            }
            Message::Visualize(kind) => {
                self.widgets.fold_all(true);
                self.widgets.set_fold(WidgetId::ScatterPlot, false);
                self.widgets.set_fold(WidgetId::CategoryView, false);
                if kind.is_some() {
                    self.state.visualization = kind;
                }
            }
            Message::SetStatsKey(key) => self.state.stat_key = key,
            Message::SetImpactDetail(detail) => self.state.impact_detail = detail,
            Message::EnableExperts(toggle) => match toggle {
                ExpertsToggle::Search(topics) => {
                    let token = self.requests.supersede(RequestKind::Experts);
                    requests.push(Request::Experts { token, topics });
                }
                ExpertsToggle::ShowPanel => self.widgets.show_exclusively(WidgetId::ExpertView),
                ExpertsToggle::Disable => {
                    self.requests.invalidate(RequestKind::Experts);
                    self.state.experts_enabled = false;
                    requests.extend(self.apply(Message::Visualize(None)));
                }
            },
            Message::SetExpertId(id) => self.state.expert_id = id,
            Message::ShowExpertList(show) => self.state.show_expert_list = show,
            Message::FoldAllWidgets(folded) => self.widgets.fold_all(folded),
        }

        if self.state.storm_name != storm_before {
            self.on_storm_changed();
        }

        requests.extend(self.pending_requests());
        requests
    }

    fn on_storm_changed(&mut self) {
        log::debug!(
            "Storm changed to '{}', invalidating outstanding loads",
            self.state.storm_name
        );
        self.requests.invalidate_all();
        self.cache.invalidate_track();
        self.state.data = None;
        self.state.impact_states.clear();
    }

    /// Loads the current stage needs that are neither cached nor in flight.
    fn pending_requests(&mut self) -> Vec<Request> {
        let mut requests = Vec::new();
        let stage = self.state.stage;

        if stage.main == Stage::STORM_LIST.main
            && self.cache.storm_list().is_none()
            && let Some(token) = self.requests.issue(RequestKind::StormList)
        {
            requests.push(Request::StormList { token });
        }

        if stage == Stage::TRACK
            && !self.state.storm_name.is_empty()
            && self.cache.track_for(&self.state.storm_name).is_none()
            && let Some(token) = self.requests.issue(RequestKind::Track)
        {
            self.state.loading = true;
            requests.push(Request::Track {
                token,
                storm: self.state.storm_name.clone(),
                source: self.registry.track_source(&self.state.storm_name),
            });
        }

        if stage.main == Stage::IMPACT.main
            && self.state.data.is_none()
            && !self.requests.is_in_flight(RequestKind::ImpactRecords)
            && let Some(source) = self.impact_records_source()
            && let Some(token) = self.requests.issue(RequestKind::ImpactRecords)
        {
            self.state.loading = true;
            requests.push(Request::ImpactRecords { token, source });
        }

        requests
    }

    fn impact_records_source(&self) -> Option<ImpactRecordsSource> {
        let storm = &self.state.storm_name;

        if storm.is_empty() {
            let wkt = self.state.drawn_area.as_ref().and_then(DrawnArea::wkt);
            if wkt.is_none() {
                log::debug!("No storm selected and no area drawn");
            }
            return wkt.map(ImpactRecordsSource::DrawnArea);
        }

        match self.registry.impact_source(storm) {
            ImpactSource::Precomputed(name) => Some(ImpactRecordsSource::Precomputed(name)),
            ImpactSource::TrackBuffers => {
                let Some(track) = self.cache.track_for(storm) else {
                    log::debug!("Track of {storm} not loaded yet");
                    return None;
                };
                Some(ImpactRecordsSource::TrackBuffers(
                    track.iter().map(|p| p.impact_buffer().wkt()).collect(),
                ))
            }
        }
    }

    fn request_impact_states(&mut self) -> Option<Request> {
        let track = self.cache.track_for(&self.state.storm_name)?;
        if track.is_empty() {
            return None;
        }
        let track_line = track_line_wkt(track);
        let token = self.requests.issue(RequestKind::ImpactStates)?;
        Some(Request::ImpactStates { token, track_line })
    }
}
