//! `flightsync-types` – shared data model.
//!
//! Everything that crosses a crate boundary lives here: the identity key of
//! an aircraft, the per-feed fragments, the partially filled and complete
//! aircraft records, render commands, bus events and the workspace error.
//!
//! # Modules
//!
//! - [`geometry`] – [`Vec2`][geometry::Vec2]: 2-D vector helpers used for
//!   screen-space math (distance, delta, normalise, scale).

pub mod geometry;

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub use geometry::Vec2;

// ────────────────────────────────────────────────────────────────────────────
// Identity
// ────────────────────────────────────────────────────────────────────────────

/// ICAO 24-bit transponder address, normalised to trimmed upper-case hex.
///
/// This is the only key shared by both feeds, so it is the identity of an
/// aircraft across the whole system.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IcaoCode(String);

impl IcaoCode {
    /// Normalise `raw` into a key. Returns `None` for blank input.
    pub fn new(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_uppercase()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IcaoCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A WGS84 position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Fragments
// ────────────────────────────────────────────────────────────────────────────

/// Position report as delivered by the state-vector feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionReport {
    pub icao: IcaoCode,
    pub longitude: f64,
    pub latitude: f64,
    /// True track in degrees clockwise from north.
    pub heading: f64,
}

/// Flight metadata as delivered by the aircraft-list feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightInfo {
    pub icao: IcaoCode,
    pub model: String,
    pub origin: String,
    pub destination: String,
}

/// One feed's partial report about one aircraft for one polling cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Fragment {
    Position(PositionReport),
    Info(FlightInfo),
}

impl Fragment {
    pub fn key(&self) -> &IcaoCode {
        match self {
            Fragment::Position(p) => &p.icao,
            Fragment::Info(i) => &i.icao,
        }
    }
}

/// A size-bounded chunk of fragments emitted by one feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedBatch {
    /// Name of the feed that produced the batch (e.g. `"opensky"`).
    pub feed: String,
    pub fragments: Vec<Fragment>,
}

// ────────────────────────────────────────────────────────────────────────────
// Aircraft records
// ────────────────────────────────────────────────────────────────────────────

/// An aircraft as far as the feeds have described it so far.
///
/// Records are merged by value: [`PartialAircraft::merged`] consumes the old
/// record and returns the new one. A field that has been populated is never
/// reset to `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartialAircraft {
    pub icao: IcaoCode,
    pub model: Option<String>,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    pub heading: Option<f64>,
    pub origin: Option<String>,
    pub destination: Option<String>,
}

impl PartialAircraft {
    /// An empty record for `icao`.
    pub fn new(icao: IcaoCode) -> Self {
        Self {
            icao,
            model: None,
            longitude: None,
            latitude: None,
            heading: None,
            origin: None,
            destination: None,
        }
    }

    /// Overwrite every field the fragment carries (last writer wins).
    pub fn merged(self, fragment: &Fragment) -> Self {
        match fragment {
            Fragment::Position(p) => Self {
                longitude: Some(p.longitude),
                latitude: Some(p.latitude),
                heading: Some(p.heading),
                ..self
            },
            Fragment::Info(i) => Self {
                model: Some(i.model.clone()),
                origin: Some(i.origin.clone()),
                destination: Some(i.destination.clone()),
                ..self
            },
        }
    }

    pub fn is_complete(&self) -> bool {
        self.model.is_some()
            && self.longitude.is_some()
            && self.latitude.is_some()
            && self.heading.is_some()
            && self.origin.is_some()
            && self.destination.is_some()
    }
}

/// Immutable projection of a [`PartialAircraft`] whose six fields are all
/// populated. Derived on demand, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompleteAircraft {
    pub icao: IcaoCode,
    pub model: String,
    pub position: GeoPoint,
    pub heading: f64,
    pub origin: String,
    pub destination: String,
}

impl CompleteAircraft {
    /// Returns `Some` iff every required field is populated.
    pub fn from_partial(partial: &PartialAircraft) -> Option<Self> {
        Some(Self {
            icao: partial.icao.clone(),
            model: partial.model.clone()?,
            position: GeoPoint::new(partial.latitude?, partial.longitude?),
            heading: partial.heading?,
            origin: partial.origin.clone()?,
            destination: partial.destination.clone()?,
        })
    }
}

/// A named target point the actor should fly to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Destination {
    pub name: String,
    pub position: GeoPoint,
}

impl Destination {
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.into(),
            position: GeoPoint::new(latitude, longitude),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Render + input contracts
// ────────────────────────────────────────────────────────────────────────────

/// Lifecycle command for the render consumer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RenderCommand {
    /// Place a new node; no animation.
    Create {
        key: IcaoCode,
        position: Vec2,
        heading: f64,
    },
    /// Animate an existing node towards a new pose over `duration`.
    Update {
        key: IcaoCode,
        target_position: Vec2,
        target_heading: f64,
        duration: Duration,
    },
    /// Drop a node whose aircraft is no longer tracked.
    Remove { key: IcaoCode },
}

impl RenderCommand {
    pub fn key(&self) -> &IcaoCode {
        match self {
            RenderCommand::Create { key, .. }
            | RenderCommand::Update { key, .. }
            | RenderCommand::Remove { key } => key,
        }
    }
}

/// Pointer input for one drawing gesture.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GestureEvent {
    Started,
    Sample(Vec2),
    Ended,
}

// ────────────────────────────────────────────────────────────────────────────
// Bus events
// ────────────────────────────────────────────────────────────────────────────

/// Unified event wrapper for the event bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// e.g., "flightsync-runtime::session"
    pub source: String,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(source: impl Into<String>, payload: EventPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            source: source.into(),
            payload,
        }
    }
}

/// Everything the session reports to its consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventPayload {
    Render(RenderCommand),
    /// Waypoints appended to the visible trace of the current gesture.
    TraceExtended(Vec<Vec2>),
    /// The visible trace (waypoints and curve) must be removed.
    TraceCleared,
    /// The actor started following a freshly built curve.
    PathStarted { waypoints: usize },
    Collision {
        other: CompleteAircraft,
        message: String,
    },
    DestinationReached { name: String },
    NewDestination(Destination),
    Status {
        complete: usize,
        total: usize,
        merges: u64,
    },
    FeedFault { feed: String, message: String },
}

// ────────────────────────────────────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────────────────────────────────────

/// Workspace-wide error type.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FlightError {
    #[error("Feed {feed} failed: {details}")]
    Feed { feed: String, details: String },

    #[error("Feed {feed} payload could not be parsed: {details}")]
    Parse { feed: String, details: String },

    #[error("Channel Error: {0}")]
    Channel(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Destination list must not be empty")]
    EmptyDestinations,
}
