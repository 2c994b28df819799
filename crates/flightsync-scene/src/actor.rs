//! The user-steered aircraft.
//!
//! The actor is either idle or following a curve built from a finished
//! gesture. Starting a new follow replaces the running one; a collision
//! sends the actor back to a random spawn point near the top of the screen.

use std::f64::consts::TAU;

use flightsync_path::{PathFollower, SmoothedCurve};
use flightsync_types::Vec2;
use rand::Rng;
use tracing::debug;

/// Screen row the actor respawns on.
pub const RESPAWN_Y: f64 = 200.0;

/// Default cruise speed in screen units per second.
pub const DEFAULT_SPEED: f64 = 40.0;

#[derive(Debug, Clone, Default)]
pub enum Motion {
    #[default]
    Idle,
    Following(PathFollower),
}

/// Outcome of one [`ActorState::tick`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActorTick {
    Idle,
    Moving,
    /// The follow completed during this tick; the actor is idle again.
    Arrived,
}

#[derive(Debug, Clone, Default)]
pub struct ActorState {
    pub position: Vec2,
    pub heading: f64,
    pub motion: Motion,
}

impl ActorState {
    pub fn new(position: Vec2, heading: f64) -> Self {
        Self {
            position,
            heading,
            motion: Motion::Idle,
        }
    }

    /// Start following `curve`, dropping any follow in progress.
    pub fn follow(&mut self, curve: &SmoothedCurve, speed: f64) {
        self.motion = Motion::Following(PathFollower::new(curve, speed));
    }

    pub fn cancel(&mut self) {
        self.motion = Motion::Idle;
    }

    pub fn is_following(&self) -> bool {
        matches!(self.motion, Motion::Following(_))
    }

    pub fn tick(&mut self, dt: f64) -> ActorTick {
        let Motion::Following(follower) = &mut self.motion else {
            return ActorTick::Idle;
        };

        let step = follower.advance(dt);
        self.position = step.position;
        self.heading = step.heading;

        if step.finished {
            self.motion = Motion::Idle;
            ActorTick::Arrived
        } else {
            ActorTick::Moving
        }
    }

    /// Stop and reappear at a random column on [`RESPAWN_Y`] with a random
    /// heading.
    pub fn respawn<R: Rng>(&mut self, rng: &mut R, width: f64) {
        self.motion = Motion::Idle;
        let x = if width > 0.0 { rng.random_range(0.0..width) } else { 0.0 };
        self.position = Vec2::new(x, RESPAWN_Y);
        self.heading = rng.random_range(0.0..TAU);
        debug!(x, heading = self.heading, "actor respawned");
    }
}
