//! Messages that drive the session, and the menu actions that emit them.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use storm_impact_dataset::Dataset;
use storm_impact_dataset_models::StatKey;
use storm_impact_visualization::{ImpactDetail, VisualizationKind};

use crate::draw::DrawnArea;
use crate::experts::Expert;
use crate::request::RequestToken;
use crate::stage::Stage;
use crate::storms::{StormListEntry, TrackPoint};

/// What an expert toggle asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpertsToggle {
    /// Look up experts with these topics.
    Search(Vec<String>),
    /// Open the expert panel alone.
    ShowPanel,
    /// Hide experts.
    Disable,
}

/// A state change request.
#[derive(Debug, Clone)]
pub enum Message {
    /// Return to the initial state and clear the history.
    Reset,
    /// Restore the last checkpoint.
    Back,
    /// Show or hide the loading indicator.
    Loading(bool),
    /// Switch between the 2D and 3D view.
    View {
        /// 3D when set.
        is_3d: bool,
    },
    /// Push the current state onto the history.
    Checkpoint,
    /// Go to a stage.
    SetStage(Stage),
    /// Select a storm (`"KATRINA 2005"`).
    SetStorm(String),
    /// Start drawing an impact area.
    DrawImpactArea,
    /// Replace the drawn impact area.
    SetDrawnImpactArea(DrawnArea),
    /// Storm list arrived.
    StormListLoaded {
        /// Request the result answers.
        token: RequestToken,
        /// Storms, newest first.
        storms: Vec<StormListEntry>,
    },
    /// Storm track arrived.
    TrackLoaded {
        /// Request the result answers.
        token: RequestToken,
        /// Storm the track belongs to.
        storm: String,
        /// Track points in time order.
        track: Vec<TrackPoint>,
    },
    /// Impact records arrived.
    DataLoaded {
        /// Request the result answers.
        token: RequestToken,
        /// Normalized dataset.
        dataset: Arc<Dataset>,
    },
    /// Impacted states arrived.
    ImpactStatesLoaded {
        /// Request the result answers.
        token: RequestToken,
        /// State names, possibly repeated.
        states: Vec<String>,
    },
    /// Experts arrived.
    ExpertsLoaded {
        /// Request the result answers.
        token: RequestToken,
        /// Matching experts.
        experts: Vec<Expert>,
    },
    /// Show a visualization (or just re-arrange the widgets when `None`).
    Visualize(Option<VisualizationKind>),
    /// Select the statistic the widgets and map use.
    SetStatsKey(Option<StatKey>),
    /// Open or close the impact detail popup.
    SetImpactDetail(Option<ImpactDetail>),
    /// Expert layer control.
    EnableExperts(ExpertsToggle),
    /// Open or close an expert's popup.
    SetExpertId(Option<String>),
    /// Open or close the expert list.
    ShowExpertList(bool),
    /// Fold or unfold every widget.
    FoldAllWidgets(bool),
}

/// An action attached to a menu option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum MenuAction {
    /// Restore the last checkpoint.
    Back,
    /// Reset the session.
    Home,
    /// Pick the upcoming-hurricane route.
    UpcomingHurricane,
    /// Pick the historical-storm route.
    HistoricalStorms,
    /// Select a storm from the list.
    SelectStorm {
        /// Storm identifier.
        storm: String,
    },
    /// Show impacts of the selected storm or the drawn area.
    ShowImpact,
    /// Nearby storm search (not available yet).
    ShowNearbyStorms,
    /// Start drawing an impact area.
    DrawImpactArea,
    /// Show a visualization.
    Visualize {
        /// Visualization to show.
        kind: VisualizationKind,
    },
    /// Open the expert panel.
    FindExperts,
    /// Open the expert list.
    ShowExpertList,
    /// Hide the expert layer.
    HideExperts,
}

impl MenuAction {
    /// Messages the action sends, in order.
    #[must_use]
    pub fn messages(&self) -> Vec<Message> {
        match self {
            Self::Back => vec![Message::Back],
            Self::Home => vec![Message::Reset],
            Self::UpcomingHurricane => vec![Message::Checkpoint, Message::SetStage(Stage::DRAW_AREA)],
            Self::HistoricalStorms => vec![Message::SetStage(Stage::STORM_LIST)],
            Self::SelectStorm { storm } => vec![
                Message::Checkpoint,
                Message::SetStage(Stage::TRACK),
                Message::SetStorm(storm.clone()),
            ],
            Self::ShowImpact => vec![Message::Checkpoint, Message::SetStage(Stage::IMPACT)],
            Self::ShowNearbyStorms => Vec::new(),
            Self::DrawImpactArea => vec![Message::DrawImpactArea],
            Self::Visualize { kind } => vec![Message::Visualize(Some(*kind))],
            Self::FindExperts => vec![Message::EnableExperts(ExpertsToggle::ShowPanel)],
            Self::ShowExpertList => vec![Message::ShowExpertList(true)],
            Self::HideExperts => vec![Message::EnableExperts(ExpertsToggle::Disable)],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_storm_checkpoints_first() {
        let messages = MenuAction::SelectStorm {
            storm: "IKE 2008".to_string(),
        }
        .messages();
        assert!(matches!(messages[0], Message::Checkpoint));
        assert!(matches!(messages[1], Message::SetStage(Stage::TRACK)));
        assert!(matches!(&messages[2], Message::SetStorm(s) if s == "IKE 2008"));
    }

    #[test]
    fn nearby_storms_does_nothing() {
        assert!(MenuAction::ShowNearbyStorms.messages().is_empty());
    }

    #[test]
    fn actions_serialize_tagged() {
        let json = serde_json::to_value(MenuAction::Visualize {
            kind: VisualizationKind::PolyHisto,
        })
        .unwrap();
        assert_eq!(json["action"], "visualize");
        assert_eq!(json["kind"], "polyHisto");

        let action: MenuAction = serde_json::from_str(r#"{"action": "home"}"#).unwrap();
        assert_eq!(action, MenuAction::Home);
    }
}
