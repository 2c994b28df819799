//! [`Session`] – one running game over live traffic.
//!
//! The session owns every piece of mutable state: the fusion pipeline, the
//! rendered node set, the path resampler, the actor and the destination
//! ring. It is driven from exactly one task, so nothing here is shared or
//! locked. Each entry point returns the [`SessionEvent`]s it produced and
//! also publishes them on the [`EventBus`].
//!
//! | Entry point | Produces |
//! |---|---|
//! | [`Session::on_feed_message`] | `Render` create/update, `Status`, `FeedFault` |
//! | [`Session::on_gesture`] | `TraceExtended`, `TraceCleared`, `PathStarted` |
//! | [`Session::tick`] | `TraceCleared`, `DestinationReached`, `NewDestination`, `Collision`, `Render` remove |
//!
//! # Example
//!
//! ```rust
//! use std::time::Instant;
//! use flightsync_middleware::EventBus;
//! use flightsync_runtime::session::{Session, SessionConfig};
//! use flightsync_types::{GestureEvent, Vec2};
//!
//! let config = SessionConfig { seed: Some(1), ..SessionConfig::default() };
//! let mut session = Session::new(config, EventBus::default()).unwrap();
//!
//! let start = session.actor().position;
//! session.on_gesture(GestureEvent::Started);
//! session.on_gesture(GestureEvent::Sample(start.add(Vec2::new(100.0, 0.0))));
//! session.on_gesture(GestureEvent::Ended);
//! assert!(session.actor().is_following());
//!
//! session.tick(1.0 / 60.0, Instant::now());
//! ```

use std::time::{Duration, Instant};

use flightsync_fusion::{FusionPipeline, FusionStatus, RetentionPolicy};
use flightsync_middleware::{EventBus, FeedEvent, FeedMessage};
use flightsync_path::{PathResampler, SmoothedCurve};
use flightsync_scene::{
    ActorState, ActorTick, CollisionReport, DestinationRing, GeoBounds, MercatorViewport,
    Projection, ProximityChecker, ProximityConfig, RenderSync,
};
use flightsync_types::{Destination, Event, EventPayload, FlightError, GestureEvent, Vec2};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info, warn};

/// Everything a session reports. Identical to the bus payload.
pub type SessionEvent = EventPayload;

const EVENT_SOURCE: &str = "flightsync-runtime::session";

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration bundle for [`Session`].
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub screen_width: f64,
    pub screen_height: f64,
    pub bounds: GeoBounds,
    /// Distance between consecutive waypoints of a drawn path.
    pub waypoint_step: f64,
    /// Actor speed in screen units per second.
    pub actor_speed: f64,
    /// Duration of a rendered node's move to its new pose.
    pub transition: Duration,
    pub proximity: ProximityConfig,
    pub retention: RetentionPolicy,
    pub destinations: Vec<Destination>,
    /// Fixed RNG seed for reproducible respawns; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            screen_width: 1024.0,
            screen_height: 768.0,
            bounds: GeoBounds::default(),
            waypoint_step: 20.0,
            actor_speed: 40.0,
            transition: Duration::from_secs(12),
            proximity: ProximityConfig::default(),
            retention: RetentionPolicy::Unbounded,
            destinations: default_destinations(),
            seed: None,
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), FlightError> {
        if !(self.waypoint_step.is_finite() && self.waypoint_step > 0.0) {
            return Err(FlightError::InvalidConfig(format!(
                "waypoint_step must be > 0, got {}",
                self.waypoint_step
            )));
        }
        if !(self.actor_speed.is_finite() && self.actor_speed > 0.0) {
            return Err(FlightError::InvalidConfig(format!(
                "actor_speed must be > 0, got {}",
                self.actor_speed
            )));
        }
        if self.destinations.is_empty() {
            return Err(FlightError::EmptyDestinations);
        }
        let p = &self.proximity;
        if p.destination_radius < 0.0 || p.actor_radius < 0.0 || p.aircraft_radius < 0.0 {
            return Err(FlightError::InvalidConfig(
                "proximity radii must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// The seven towns around Frankfurt the actor is sent to in turn.
pub fn default_destinations() -> Vec<Destination> {
    vec![
        Destination::new("Gießen", 50.586726, 8.676122),
        Destination::new("Korbach", 51.272788, 8.849097),
        Destination::new("Limburg", 50.397752, 8.088486),
        Destination::new("Stadtallendorf", 50.829915, 9.020694),
        Destination::new("Herborn", 50.676845, 8.278230),
        Destination::new("Büdingen", 50.286168, 9.073924),
        Destination::new("Frankfurt", 50.114083, 8.629691),
    ]
}

// ─────────────────────────────────────────────────────────────────────────────
// Session
// ─────────────────────────────────────────────────────────────────────────────

pub struct Session {
    pipeline: FusionPipeline,
    render: RenderSync,
    viewport: MercatorViewport,
    resampler: PathResampler,
    actor: ActorState,
    actor_speed: f64,
    destinations: DestinationRing,
    proximity: ProximityChecker,
    rng: StdRng,
    bus: EventBus,
    /// Whether a drawn trace is currently shown.
    trace_visible: bool,
}

impl Session {
    /// Validate `config` and build a session with the actor freshly spawned.
    pub fn new(config: SessionConfig, bus: EventBus) -> Result<Self, FlightError> {
        config.validate()?;

        let viewport = MercatorViewport::new(config.screen_width, config.screen_height, config.bounds)?;
        let resampler = PathResampler::new(config.waypoint_step)?;
        let destinations = DestinationRing::new(config.destinations)?;
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let mut actor = ActorState::default();
        actor.respawn(&mut rng, viewport.width());

        info!(
            width = viewport.width(),
            height = viewport.height(),
            destinations = destinations.len(),
            "session ready"
        );

        Ok(Self {
            pipeline: FusionPipeline::new(config.retention),
            render: RenderSync::new(config.transition),
            viewport,
            resampler,
            actor,
            actor_speed: config.actor_speed,
            destinations,
            proximity: ProximityChecker::new(config.proximity),
            rng,
            bus,
            trace_visible: false,
        })
    }

    /// Initial state for freshly attached consumers: the active destination
    /// and the (empty) status line.
    pub fn announce(&mut self) -> Vec<SessionEvent> {
        let events = vec![
            EventPayload::NewDestination(self.destinations.active().clone()),
            self.status_event(),
        ];
        self.publish(&events);
        events
    }

    /// Apply one message from the feed called `feed`.
    pub fn on_feed_message(&mut self, feed: &str, message: &FeedMessage, now: Instant) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        match message {
            Ok(FeedEvent::Batch(batch)) => {
                for fused in self.pipeline.ingest(batch, now) {
                    if let Some(command) = self.render.apply(&fused.aircraft, &self.viewport) {
                        events.push(EventPayload::Render(command));
                    }
                }
                events.push(self.status_event());
            }
            Ok(FeedEvent::ParseError { raw }) => {
                warn!(feed, bytes = raw.len(), "feed delivered an unparsable payload");
                events.push(EventPayload::FeedFault {
                    feed: feed.to_string(),
                    message: format!("unparsable payload ({} bytes)", raw.len()),
                });
            }
            Err(e) => {
                warn!(feed, error = %e, "feed poll failed");
                events.push(EventPayload::FeedFault {
                    feed: feed.to_string(),
                    message: e.to_string(),
                });
            }
        }
        self.publish(&events);
        events
    }

    /// Apply one pointer event of a drawing gesture.
    pub fn on_gesture(&mut self, gesture: GestureEvent) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        match gesture {
            GestureEvent::Started => {
                self.actor.cancel();
                self.clear_trace(&mut events);
                self.resampler.begin(self.actor.position);
                self.trace_visible = true;
                events.push(EventPayload::TraceExtended(vec![self.actor.position]));
            }
            GestureEvent::Sample(point) => {
                let added = self.resampler.push(self.clamp_to_screen(point));
                if added > 0 {
                    let waypoints = self.resampler.waypoints();
                    let fresh = waypoints[waypoints.len() - added..].to_vec();
                    events.push(EventPayload::TraceExtended(fresh));
                }
            }
            GestureEvent::Ended => {
                if self.resampler.is_active() {
                    let waypoints = self.resampler.finish();
                    match SmoothedCurve::build(&waypoints) {
                        Some(curve) if !curve.is_degenerate() => {
                            self.actor.follow(&curve, self.actor_speed);
                            debug!(waypoints = waypoints.len(), "actor following drawn path");
                            events.push(EventPayload::PathStarted {
                                waypoints: waypoints.len(),
                            });
                        }
                        _ => self.clear_trace(&mut events),
                    }
                }
            }
        }
        self.publish(&events);
        events
    }

    /// Advance the frame clock by `dt` seconds.
    pub fn tick(&mut self, dt: f64, now: Instant) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        self.render.advance(dt);

        if self.actor.tick(dt) == ActorTick::Arrived {
            self.clear_trace(&mut events);
            let target = self.destination_screen();
            if self.proximity.check_destination(self.actor.position, target) {
                let reached = self.destinations.active().name.clone();
                info!(destination = %reached, "destination reached");
                events.push(EventPayload::DestinationReached { name: reached });
                let next = self.destinations.rotate().clone();
                events.push(EventPayload::NewDestination(next));
            }
        }

        let hit = self
            .proximity
            .check_collision(self.actor.position, self.render.nodes())
            .map(|node| node.aircraft.clone());
        if let Some(other) = hit {
            let report = CollisionReport::from(&other);
            info!(icao = %report.icao, model = %report.model, "actor collided");
            events.push(EventPayload::Collision {
                message: report.message(),
                other,
            });
            self.resampler.clear();
            self.clear_trace(&mut events);
            self.actor.respawn(&mut self.rng, self.viewport.width());
        }

        for key in self.pipeline.evict_stale(now) {
            if let Some(command) = self.render.remove(&key) {
                events.push(EventPayload::Render(command));
            }
        }

        self.publish(&events);
        events
    }

    /// Turn feed processing on or off.
    pub fn set_enabled(&mut self, enabled: bool) -> Vec<SessionEvent> {
        self.pipeline.set_enabled(enabled);
        info!(enabled, "feed processing toggled");
        let events = vec![self.status_event()];
        self.publish(&events);
        events
    }

    pub fn status(&self) -> FusionStatus {
        self.pipeline.status()
    }

    /// Publish the current status line.
    pub fn report_status(&mut self) -> Vec<SessionEvent> {
        let events = vec![self.status_event()];
        self.publish(&events);
        events
    }

    pub fn actor(&self) -> &ActorState {
        &self.actor
    }

    pub fn render(&self) -> &RenderSync {
        &self.render
    }

    pub fn viewport(&self) -> &MercatorViewport {
        &self.viewport
    }

    pub fn active_destination(&self) -> &Destination {
        self.destinations.active()
    }

    /// Screen position of the active destination.
    pub fn destination_screen(&self) -> Vec2 {
        self.viewport.project(self.destinations.active().position)
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    // ─────────────────────────────────────────────────────────────────────
    // Internal helpers
    // ─────────────────────────────────────────────────────────────────────

    fn status_event(&self) -> SessionEvent {
        let status = self.pipeline.status();
        EventPayload::Status {
            complete: status.complete,
            total: status.total,
            merges: status.merges,
        }
    }

    /// Pull a pointer sample onto the screen rectangle.
    fn clamp_to_screen(&self, point: Vec2) -> Vec2 {
        Vec2::new(
            point.x.clamp(0.0, self.viewport.width()),
            point.y.clamp(0.0, self.viewport.height()),
        )
    }

    fn clear_trace(&mut self, events: &mut Vec<SessionEvent>) {
        if self.trace_visible {
            self.trace_visible = false;
            events.push(EventPayload::TraceCleared);
        }
    }

    fn publish(&self, events: &[SessionEvent]) {
        for payload in events {
            // No subscriber on a lane is normal for a headless run.
            let _ = self.bus.publish(Event::new(EVENT_SOURCE, payload.clone()));
        }
    }
}
