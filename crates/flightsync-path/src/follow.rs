//! Constant-speed curve traversal.
//!
//! [`PathFollower`] flattens a [`SmoothedCurve`] once and then walks the
//! resulting polyline at `speed` units per second, facing along the segment
//! it is on. Headings are screen-space angles from `atan2(dy, dx)`.
//!
//! A follower is one-shot: once it reports `finished` it stays at the end.

use flightsync_types::Vec2;
use tracing::debug;

use crate::curve::SmoothedCurve;

/// Quadratic segments are approximated by this many line pieces.
pub const FLATTEN_STEPS: usize = 16;

/// Pose after one [`PathFollower::advance`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FollowStep {
    pub position: Vec2,
    pub heading: f64,
    pub finished: bool,
}

#[derive(Debug, Clone)]
pub struct PathFollower {
    polyline: Vec<Vec2>,
    speed: f64,
    /// Index of the polyline vertex the follower last passed.
    index: usize,
    position: Vec2,
    heading: f64,
}

impl PathFollower {
    pub fn new(curve: &SmoothedCurve, speed: f64) -> Self {
        let mut polyline = curve.flatten(FLATTEN_STEPS);
        polyline.dedup();

        let heading = match polyline.as_slice() {
            [a, b, ..] => b.delta(*a).angle(),
            _ => 0.0,
        };

        Self {
            position: curve.start(),
            polyline,
            speed: speed.max(0.0),
            index: 0,
            heading,
        }
    }

    /// Move `dt` seconds further along the path.
    pub fn advance(&mut self, dt: f64) -> FollowStep {
        let mut budget = self.speed * dt.max(0.0);

        while budget > 0.0 && self.index + 1 < self.polyline.len() {
            let from = self.polyline[self.index];
            let target = self.polyline[self.index + 1];
            self.heading = target.delta(from).angle();

            let to_target = self.position.distance_to(target);
            if to_target <= budget {
                self.position = target;
                self.index += 1;
                budget -= to_target;
            } else {
                self.position = self.position.lerp(target, budget / to_target);
                budget = 0.0;
            }
        }

        let finished = self.is_finished();
        if finished {
            debug!(x = self.position.x, y = self.position.y, "path follow finished");
        }
        FollowStep {
            position: self.position,
            heading: self.heading,
            finished,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.index + 1 >= self.polyline.len()
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn heading(&self) -> f64 {
        self.heading
    }
}
