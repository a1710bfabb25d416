//! Workflow stages.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::SessionError;

/// A workflow stage, written `"2"` or `"2-1"`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct Stage {
    /// Main stage.
    pub main: u8,
    /// Sub stage, `0` when absent.
    pub sub: u8,
}

impl Stage {
    /// Upcoming-or-historical route selector.
    pub const ROUTE_SELECTOR: Self = Self::new(0, 0);
    /// Historical storm list.
    pub const STORM_LIST: Self = Self::new(1, 0);
    /// Storm track of the selected storm.
    pub const TRACK: Self = Self::new(2, 0);
    /// Drawing an impact area by hand.
    pub const DRAW_AREA: Self = Self::new(2, 1);
    /// Impact records and widgets.
    pub const IMPACT: Self = Self::new(3, 0);

    /// Creates a stage.
    #[must_use]
    pub const fn new(main: u8, sub: u8) -> Self {
        Self { main, sub }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.sub == 0 {
            write!(f, "{}", self.main)
        } else {
            write!(f, "{}-{}", self.main, self.sub)
        }
    }
}

impl FromStr for Stage {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SessionError::InvalidStage(s.to_string());
        let (main, sub) = s.split_once('-').unwrap_or((s, "0"));
        Ok(Self {
            main: main.trim().parse().map_err(|_| invalid())?,
            sub: sub.trim().parse().map_err(|_| invalid())?,
        })
    }
}

impl TryFrom<String> for Stage {
    type Error = SessionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Stage> for String {
    fn from(stage: Stage) -> Self {
        stage.to_string()
    }
}
