//! Destination arrival and collision checks.
//!
//! Both checks are plain distance comparisons in screen space with an
//! exclusive boundary: an actor exactly `radius` away from its destination
//! has not arrived, and two circles that only touch have not collided.
//!
//! | Check | Condition |
//! |---|---|
//! | Destination | `distance(actor, destination) < destination_radius` |
//! | Collision | `distance(actor, node) < actor_radius + aircraft_radius` |

use flightsync_types::{CompleteAircraft, Destination, FlightError, IcaoCode, Vec2};
use serde::{Deserialize, Serialize};

use crate::render_sync::RenderedNode;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProximityConfig {
    pub destination_radius: f64,
    pub actor_radius: f64,
    pub aircraft_radius: f64,
}

impl Default for ProximityConfig {
    fn default() -> Self {
        Self {
            destination_radius: 40.0,
            actor_radius: 10.0,
            aircraft_radius: 10.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ProximityChecker {
    config: ProximityConfig,
}

impl ProximityChecker {
    pub fn new(config: ProximityConfig) -> Self {
        Self { config }
    }

    /// Whether the actor is inside the destination circle.
    pub fn check_destination(&self, actor: Vec2, destination: Vec2) -> bool {
        actor.distance_to(destination) < self.config.destination_radius
    }

    /// The nearest node whose circle overlaps the actor's, if any.
    pub fn check_collision<'a>(
        &self,
        actor: Vec2,
        nodes: impl IntoIterator<Item = &'a RenderedNode>,
    ) -> Option<&'a RenderedNode> {
        let reach = self.config.actor_radius + self.config.aircraft_radius;
        nodes
            .into_iter()
            .map(|node| (actor.distance_to(node.position), node))
            .filter(|(distance, _)| *distance < reach)
            .min_by(|(a, _), (b, _)| a.total_cmp(b))
            .map(|(_, node)| node)
    }

    pub fn config(&self) -> ProximityConfig {
        self.config
    }
}

/// What the actor crashed into.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollisionReport {
    pub icao: IcaoCode,
    pub model: String,
    pub origin: String,
    pub destination: String,
}

impl CollisionReport {
    pub fn message(&self) -> String {
        format!(
            "You crashed into {}.\n\n{} -> {}",
            self.model, self.origin, self.destination
        )
    }
}

impl From<&CompleteAircraft> for CollisionReport {
    fn from(aircraft: &CompleteAircraft) -> Self {
        Self {
            icao: aircraft.icao.clone(),
            model: aircraft.model.clone(),
            origin: aircraft.origin.clone(),
            destination: aircraft.destination.clone(),
        }
    }
}

/// Fixed, non-empty list of destinations with one active entry. Rotation
/// wraps around.
#[derive(Debug, Clone)]
pub struct DestinationRing {
    destinations: Vec<Destination>,
    active: usize,
}

impl DestinationRing {
    pub fn new(destinations: Vec<Destination>) -> Result<Self, FlightError> {
        if destinations.is_empty() {
            return Err(FlightError::EmptyDestinations);
        }
        Ok(Self {
            destinations,
            active: 0,
        })
    }

    pub fn active(&self) -> &Destination {
        &self.destinations[self.active]
    }

    /// Advance to the next destination and return it.
    pub fn rotate(&mut self) -> &Destination {
        self.active = (self.active + 1) % self.destinations.len();
        self.active()
    }

    pub fn len(&self) -> usize {
        self.destinations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.destinations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Destination> {
        self.destinations.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::Projection;
    use crate::render_sync::RenderSync;
    use flightsync_types::GeoPoint;

    struct Flat;

    impl Projection for Flat {
        fn project(&self, geo: GeoPoint) -> Vec2 {
            Vec2::new(geo.longitude, geo.latitude)
        }

        fn contains(&self, _p: Vec2) -> bool {
            true
        }
    }

    fn aircraft(key: &str, x: f64, y: f64) -> CompleteAircraft {
        CompleteAircraft {
            icao: IcaoCode::new(key).unwrap(),
            model: "Boeing 737-800".into(),
            position: GeoPoint::new(y, x),
            heading: 0.0,
            origin: "Frankfurt".into(),
            destination: "Palma".into(),
        }
    }

    fn ring(names: &[&str]) -> DestinationRing {
        DestinationRing::new(
            names
                .iter()
                .map(|n| Destination::new(*n, 50.0, 8.0))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn destination_boundary_is_exclusive() {
        let checker = ProximityChecker::default();
        let target = Vec2::new(100.0, 100.0);
        assert!(checker.check_destination(Vec2::new(139.9, 100.0), target));
        assert!(!checker.check_destination(Vec2::new(140.0, 100.0), target));
        assert!(!checker.check_destination(Vec2::new(140.0 + 1e-9, 100.0), target));
    }

    #[test]
    fn touching_circles_do_not_collide() {
        let checker = ProximityChecker::default();
        let mut sync = RenderSync::default();
        sync.apply(&aircraft("A1", 20.0, 0.0), &Flat);
        assert!(checker.check_collision(Vec2::ZERO, sync.nodes()).is_none());
        assert!(checker.check_collision(Vec2::new(-1e-9, 0.0), sync.nodes()).is_none());
        assert!(checker.check_collision(Vec2::new(1e-9, 0.0), sync.nodes()).is_some());
        assert!(checker.check_collision(Vec2::new(0.5, 0.0), sync.nodes()).is_some());
    }

    #[test]
    fn nearest_overlapping_node_wins() {
        let checker = ProximityChecker::default();
        let mut sync = RenderSync::default();
        sync.apply(&aircraft("FAR", 15.0, 0.0), &Flat);
        sync.apply(&aircraft("NEAR", 5.0, 0.0), &Flat);
        sync.apply(&aircraft("OUT", 500.0, 0.0), &Flat);
        let hit = checker.check_collision(Vec2::ZERO, sync.nodes()).unwrap();
        assert_eq!(hit.key.as_str(), "NEAR");
    }

    #[test]
    fn crash_message_names_model_and_route() {
        let report = CollisionReport::from(&aircraft("A1", 0.0, 0.0));
        assert_eq!(
            report.message(),
            "You crashed into Boeing 737-800.\n\nFrankfurt -> Palma"
        );
    }

    #[test]
    fn empty_ring_is_rejected() {
        assert_eq!(
            DestinationRing::new(Vec::new()).unwrap_err(),
            FlightError::EmptyDestinations
        );
    }

    #[test]
    fn ring_rotates_and_wraps() {
        let mut ring = ring(&["Giessen", "Korbach", "Limburg"]);
        assert_eq!(ring.active().name, "Giessen");
        assert_eq!(ring.rotate().name, "Korbach");
        assert_eq!(ring.rotate().name, "Limburg");
        assert_eq!(ring.rotate().name, "Giessen");
    }

    #[test]
    fn full_cycle_returns_to_start() {
        let mut ring = ring(&["a", "b", "c", "d", "e", "f", "g"]);
        let first = ring.active().clone();
        for _ in 0..ring.len() {
            ring.rotate();
        }
        assert_eq!(ring.active(), &first);
    }
}
