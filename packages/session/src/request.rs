//! Request tokens for asynchronous loads and the explicit query cache.
//!
//! Every load the session asks its host to perform carries a
//! [`RequestToken`]. When the result comes back the token is checked
//! against the [`RequestTracker`]; results for tokens that were invalidated
//! in the meantime (storm changed, session reset) are discarded.

use std::collections::BTreeMap;

use strum_macros::{AsRefStr, Display};

use crate::storms::{StormListEntry, TrackPoint};

/// What a request loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum RequestKind {
    /// The storm list.
    StormList,
    /// A storm's track.
    Track,
    /// A storm's impact records.
    ImpactRecords,
    /// States crossed by a storm's track.
    ImpactStates,
    /// Experts matching selected topics.
    Experts,
}

/// Identifies one outstanding request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestToken {
    kind: RequestKind,
    generation: u64,
    serial: u64,
}

impl RequestToken {
    /// What the request loads.
    #[must_use]
    pub const fn kind(&self) -> RequestKind {
        self.kind
    }
}

/// Issues and validates request tokens.
#[derive(Debug, Clone, Default)]
pub struct RequestTracker {
    generation: u64,
    serial: u64,
    in_flight: BTreeMap<RequestKind, RequestToken>,
}

impl RequestTracker {
    /// Creates a tracker with nothing in flight.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a token, or `None` when a request of the same kind is already
    /// in flight.
    pub fn issue(&mut self, kind: RequestKind) -> Option<RequestToken> {
        if self.in_flight.contains_key(&kind) {
            return None;
        }
        Some(self.supersede(kind))
    }

    /// Issues a token that replaces any request of the same kind in flight.
    /// The replaced token becomes stale.
    pub fn supersede(&mut self, kind: RequestKind) -> RequestToken {
        self.serial += 1;
        let token = RequestToken {
            kind,
            generation: self.generation,
            serial: self.serial,
        };
        if let Some(previous) = self.in_flight.insert(kind, token) {
            log::debug!("{kind} request #{} superseded", previous.serial);
        }
        log::debug!("Issued {kind} request #{}", token.serial);
        token
    }

    /// Invalidates the outstanding request of one kind, if any.
    pub fn invalidate(&mut self, kind: RequestKind) {
        if let Some(token) = self.in_flight.remove(&kind) {
            log::debug!("Invalidated {kind} request #{}", token.serial);
        }
    }

    /// Whether a request of this kind is in flight.
    #[must_use]
    pub fn is_in_flight(&self, kind: RequestKind) -> bool {
        self.in_flight.contains_key(&kind)
    }

    /// Invalidates every outstanding token.
    pub fn invalidate_all(&mut self) {
        if !self.in_flight.is_empty() {
            log::debug!("Invalidating {} outstanding requests", self.in_flight.len());
        }
        self.generation += 1;
        self.in_flight.clear();
    }

    /// Completes a request. Returns `false` (and logs a warning) when the
    /// token is stale and its result must be discarded.
    pub fn complete(&mut self, token: RequestToken) -> bool {
        let current = token.generation == self.generation
            && self.in_flight.get(&token.kind) == Some(&token);

        if current {
            self.in_flight.remove(&token.kind);
        } else {
            log::warn!(
                "Discarding stale {} result (request #{})",
                token.kind,
                token.serial
            );
        }
        current
    }
}

/// Cached storm list and the most recently loaded track.
#[derive(Debug, Clone, Default)]
pub struct QueryCache {
    storm_list: Option<Vec<StormListEntry>>,
    track: Option<(String, Vec<TrackPoint>)>,
}

impl QueryCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached storm list.
    #[must_use]
    pub fn storm_list(&self) -> Option<&[StormListEntry]> {
        self.storm_list.as_deref()
    }

    /// Caches the storm list.
    pub fn set_storm_list(&mut self, storms: Vec<StormListEntry>) {
        self.storm_list = Some(storms);
    }

    /// The cached track, if it belongs to `storm`.
    #[must_use]
    pub fn track_for(&self, storm: &str) -> Option<&[TrackPoint]> {
        self.track
            .as_ref()
            .filter(|(name, _)| name == storm)
            .map(|(_, track)| track.as_slice())
    }

    /// Caches a storm's track, replacing any other.
    pub fn set_track(&mut self, storm: impl Into<String>, track: Vec<TrackPoint>) {
        self.track = Some((storm.into(), track));
    }

    /// Drops the cached track.
    pub fn invalidate_track(&mut self) {
        self.track = None;
    }
}
