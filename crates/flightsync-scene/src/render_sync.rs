//! Render-sync diff engine.
//!
//! Keeps exactly one [`RenderedNode`] per aircraft key and decides, for
//! every complete aircraft delivered by fusion, whether the renderer has to
//! create a node or animate an existing one:
//!
//! 1. Project the aircraft; if it lands outside the viewport, drop it.
//! 2. Key unknown → [`RenderCommand::Create`] at the projected pose.
//! 3. Key known → [`RenderCommand::Update`] towards the projected pose over
//!    the transition duration. Nodes are never recreated.
//!
//! The decision reads the node map at the moment each aircraft is applied,
//! so a key arriving twice in one batch produces a create and then an
//! update. Nodes outside the viewport are kept; removal is only driven by
//! [`RenderSync::remove`].
//!
//! # Example
//!
//! ```rust
//! use flightsync_scene::{GeoBounds, MercatorViewport, RenderSync};
//! use flightsync_types::{CompleteAircraft, GeoPoint, IcaoCode, RenderCommand};
//!
//! let viewport = MercatorViewport::new(1000.0, 800.0, GeoBounds::default()).unwrap();
//! let mut sync = RenderSync::default();
//! let aircraft = CompleteAircraft {
//!     icao: IcaoCode::new("3C6444").unwrap(),
//!     model: "A320".into(),
//!     position: GeoPoint::new(50.1, 8.6),
//!     heading: 90.0,
//!     origin: "FRA".into(),
//!     destination: "LHR".into(),
//! };
//!
//! assert!(matches!(sync.apply(&aircraft, &viewport), Some(RenderCommand::Create { .. })));
//! assert!(matches!(sync.apply(&aircraft, &viewport), Some(RenderCommand::Update { .. })));
//! ```

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::f64::consts::{PI, TAU};
use std::time::Duration;

use flightsync_types::{CompleteAircraft, IcaoCode, RenderCommand, Vec2};
use tracing::debug;

use crate::projection::{Projection, screen_heading};

/// Default duration of a node's move to its new pose.
pub const DEFAULT_TRANSITION: Duration = Duration::from_secs(12);

/// Screen-space mirror of one aircraft.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedNode {
    pub key: IcaoCode,
    pub position: Vec2,
    pub heading: f64,
    pub target_position: Vec2,
    pub target_heading: f64,
    /// Last complete record applied to the node.
    pub aircraft: CompleteAircraft,
    start_position: Vec2,
    start_heading: f64,
    elapsed: f64,
    duration: f64,
}

impl RenderedNode {
    fn new(aircraft: CompleteAircraft, position: Vec2, heading: f64) -> Self {
        Self {
            key: aircraft.icao.clone(),
            position,
            heading,
            target_position: position,
            target_heading: heading,
            aircraft,
            start_position: position,
            start_heading: heading,
            elapsed: 0.0,
            duration: 0.0,
        }
    }

    /// Start a new transition from the current pose.
    fn retarget(&mut self, aircraft: CompleteAircraft, position: Vec2, heading: f64, duration: f64) {
        self.start_position = self.position;
        self.start_heading = self.heading;
        self.target_position = position;
        self.target_heading = heading;
        self.elapsed = 0.0;
        self.duration = duration;
        self.aircraft = aircraft;
        if duration <= 0.0 {
            self.position = position;
            self.heading = heading;
        }
    }

    fn advance(&mut self, dt: f64) {
        if self.is_settled() {
            return;
        }
        self.elapsed = (self.elapsed + dt).min(self.duration);
        let t = self.elapsed / self.duration;
        self.position = self.start_position.lerp(self.target_position, t);
        self.heading = self.start_heading + shortest_arc(self.start_heading, self.target_heading) * t;
    }

    /// Seconds left in the current transition.
    pub fn remaining(&self) -> f64 {
        (self.duration - self.elapsed).max(0.0)
    }

    pub fn is_settled(&self) -> bool {
        self.remaining() <= 0.0
    }
}

/// Signed angle in `(-π, π]` that turns `from` onto `to`.
fn shortest_arc(from: f64, to: f64) -> f64 {
    let delta = (to - from).rem_euclid(TAU);
    if delta > PI { delta - TAU } else { delta }
}

/// Authoritative node set and the diff logic against it.
#[derive(Debug)]
pub struct RenderSync {
    nodes: HashMap<IcaoCode, RenderedNode>,
    transition: Duration,
}

impl Default for RenderSync {
    fn default() -> Self {
        Self::new(DEFAULT_TRANSITION)
    }
}

impl RenderSync {
    pub fn new(transition: Duration) -> Self {
        Self {
            nodes: HashMap::new(),
            transition,
        }
    }

    /// Diff one complete aircraft against the node set.
    ///
    /// Returns `None` when the aircraft projects outside the viewport.
    pub fn apply(&mut self, aircraft: &CompleteAircraft, projection: &dyn Projection) -> Option<RenderCommand> {
        let position = projection.project(aircraft.position);
        if !projection.contains(position) {
            return None;
        }
        let heading = screen_heading(aircraft.heading);
        let key = aircraft.icao.clone();

        match self.nodes.entry(key.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(RenderedNode::new(aircraft.clone(), position, heading));
                debug!(icao = %key, x = position.x, y = position.y, "node created");
                Some(RenderCommand::Create {
                    key,
                    position,
                    heading,
                })
            }
            Entry::Occupied(mut slot) => {
                slot.get_mut()
                    .retarget(aircraft.clone(), position, heading, self.transition.as_secs_f64());
                Some(RenderCommand::Update {
                    key,
                    target_position: position,
                    target_heading: heading,
                    duration: self.transition,
                })
            }
        }
    }

    /// Move every node along its current transition.
    pub fn advance(&mut self, dt: f64) {
        for node in self.nodes.values_mut() {
            node.advance(dt);
        }
    }

    /// Forget a node, e.g. because its aircraft was evicted from the store.
    pub fn remove(&mut self, key: &IcaoCode) -> Option<RenderCommand> {
        self.nodes.remove(key).map(|node| {
            debug!(icao = %key, "node removed");
            RenderCommand::Remove { key: node.key }
        })
    }

    pub fn get(&self, key: &IcaoCode) -> Option<&RenderedNode> {
        self.nodes.get(key)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &RenderedNode> {
        self.nodes.values()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn transition(&self) -> Duration {
        self.transition
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flightsync_types::GeoPoint;

    /// Identity projection onto a 100 × 100 screen.
    struct Flat;

    impl Projection for Flat {
        fn project(&self, geo: GeoPoint) -> Vec2 {
            Vec2::new(geo.longitude, geo.latitude)
        }

        fn contains(&self, p: Vec2) -> bool {
            (0.0..100.0).contains(&p.x) && (0.0..100.0).contains(&p.y)
        }
    }

    fn aircraft(key: &str, x: f64, y: f64, heading: f64) -> CompleteAircraft {
        CompleteAircraft {
            icao: IcaoCode::new(key).unwrap(),
            model: "B738".into(),
            position: GeoPoint::new(y, x),
            heading,
            origin: "FRA".into(),
            destination: "MUC".into(),
        }
    }

    #[test]
    fn first_sighting_creates_then_updates() {
        let mut sync = RenderSync::default();
        let create = sync.apply(&aircraft("A1", 10.0, 10.0, 0.0), &Flat);
        assert_eq!(
            create,
            Some(RenderCommand::Create {
                key: IcaoCode::new("A1").unwrap(),
                position: Vec2::new(10.0, 10.0),
                heading: 0.0,
            })
        );

        let update = sync.apply(&aircraft("A1", 20.0, 10.0, 90.0), &Flat);
        match update {
            Some(RenderCommand::Update {
                target_position,
                target_heading,
                duration,
                ..
            }) => {
                assert_eq!(target_position, Vec2::new(20.0, 10.0));
                assert!((target_heading + std::f64::consts::FRAC_PI_2).abs() < 1e-12);
                assert_eq!(duration, DEFAULT_TRANSITION);
            }
            other => panic!("expected update, got {other:?}"),
        }
        assert_eq!(sync.len(), 1);
    }

    #[test]
    fn outside_viewport_is_dropped_not_queued() {
        let mut sync = RenderSync::default();
        assert!(sync.apply(&aircraft("A1", 150.0, 10.0, 0.0), &Flat).is_none());
        assert!(sync.is_empty());

        // Entering the viewport later is a plain create.
        assert!(matches!(
            sync.apply(&aircraft("A1", 50.0, 10.0, 0.0), &Flat),
            Some(RenderCommand::Create { .. })
        ));
    }

    #[test]
    fn existing_node_leaving_viewport_is_kept() {
        let mut sync = RenderSync::default();
        sync.apply(&aircraft("A1", 50.0, 50.0, 0.0), &Flat);
        assert!(sync.apply(&aircraft("A1", 500.0, 50.0, 0.0), &Flat).is_none());
        let node = sync.get(&IcaoCode::new("A1").unwrap()).unwrap();
        assert_eq!(node.target_position, Vec2::new(50.0, 50.0));
    }

    #[test]
    fn duplicate_key_in_one_batch_creates_once() {
        let mut sync = RenderSync::default();
        let batch = [aircraft("A1", 10.0, 10.0, 0.0), aircraft("A1", 11.0, 10.0, 0.0)];
        let commands: Vec<RenderCommand> = batch.iter().filter_map(|a| sync.apply(a, &Flat)).collect();
        assert!(matches!(commands[0], RenderCommand::Create { .. }));
        assert!(matches!(commands[1], RenderCommand::Update { .. }));
        assert_eq!(sync.len(), 1);
    }

    #[test]
    fn advance_interpolates_to_target() {
        let mut sync = RenderSync::new(Duration::from_secs(10));
        sync.apply(&aircraft("A1", 0.0, 0.0, 0.0), &Flat);
        sync.apply(&aircraft("A1", 50.0, 0.0, 0.0), &Flat);
        let key = IcaoCode::new("A1").unwrap();

        sync.advance(5.0);
        let node = sync.get(&key).unwrap();
        assert!((node.position.x - 25.0).abs() < 1e-9);
        assert!((node.remaining() - 5.0).abs() < 1e-9);

        sync.advance(20.0);
        let node = sync.get(&key).unwrap();
        assert_eq!(node.position, Vec2::new(50.0, 0.0));
        assert!(node.is_settled());
    }

    #[test]
    fn retarget_starts_from_current_pose() {
        let mut sync = RenderSync::new(Duration::from_secs(10));
        sync.apply(&aircraft("A1", 0.0, 0.0, 0.0), &Flat);
        sync.apply(&aircraft("A1", 40.0, 0.0, 0.0), &Flat);
        sync.advance(5.0);
        sync.apply(&aircraft("A1", 20.0, 0.0, 0.0), &Flat);
        sync.advance(5.0);
        let node = sync.get(&IcaoCode::new("A1").unwrap()).unwrap();
        assert!((node.position.x - 20.0).abs() < 1e-9);
    }

    #[test]
    fn heading_takes_shortest_arc() {
        assert!((shortest_arc(0.1, TAU - 0.1) + 0.2).abs() < 1e-12);
        assert!((shortest_arc(-3.0, 3.0) - (6.0 - TAU)).abs() < 1e-12);
        assert!((shortest_arc(1.0, 2.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn remove_returns_command_once() {
        let mut sync = RenderSync::default();
        sync.apply(&aircraft("A1", 10.0, 10.0, 0.0), &Flat);
        let key = IcaoCode::new("A1").unwrap();
        assert_eq!(sync.remove(&key), Some(RenderCommand::Remove { key: key.clone() }));
        assert!(sync.remove(&key).is_none());
        assert!(sync.is_empty());
    }
}
