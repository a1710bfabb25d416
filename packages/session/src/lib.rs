#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! The staged storm-impact workflow.
//!
//! A [`Session`] walks through choosing a route, picking a storm, viewing
//! its track (or drawing an impact area), and exploring impact records. It
//! is driven by [`Message`]s, keeps a checkpoint history for going back,
//! and asks its host for data loads through token-tagged [`Request`]s so
//! that results arriving after the user moved on are dropped.

pub mod draw;
pub mod experts;
pub mod menu;
pub mod message;
pub mod request;
pub mod session;
pub mod stage;
pub mod storms;
pub mod widgets;

pub use draw::DrawnArea;
pub use experts::{Expert, ExpertTopics};
pub use menu::{MenuOption, search};
pub use message::{ExpertsToggle, MenuAction, Message};
pub use request::{QueryCache, RequestKind, RequestToken, RequestTracker};
pub use session::{ImpactRecordsSource, Request, Session, SessionState};
pub use stage::Stage;
pub use storms::{StormRegistry, TrackPoint};
pub use widgets::WidgetFolds;

/// Errors from parsing session inputs.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// A required binding field is absent.
    #[error("Missing field '{0}'")]
    MissingField(&'static str),

    /// A numeric field did not parse.
    #[error("Invalid number in '{field}': {value}")]
    InvalidNumber {
        /// Field name.
        field: &'static str,
        /// Offending value.
        value: String,
    },

    /// A WKT value was not the expected geometry.
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// A stage string did not parse.
    #[error("Invalid stage '{0}'")]
    InvalidStage(String),
}

/// Errors from loading the storm registry.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// TOML parsing failed.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}
