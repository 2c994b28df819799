//! Fixed-step path resampler.
//!
//! Pointer samples arrive at whatever rate the input device delivers them.
//! The resampler emits a waypoint every `step` units along the straight
//! line from the last waypoint towards the newest sample, so a fast stroke
//! and a slow stroke over the same track produce the same waypoints.
//!
//! ```text
//! latest ──step──▶ w1 ──step──▶ w2 ── < step ── sample
//! ```
//!
//! # Example
//!
//! ```rust
//! use flightsync_path::resampler::PathResampler;
//! use flightsync_types::Vec2;
//!
//! let mut resampler = PathResampler::new(20.0).unwrap();
//! resampler.begin(Vec2::new(0.0, 0.0));
//! assert_eq!(resampler.push(Vec2::new(45.0, 0.0)), 2);
//! assert_eq!(
//!     resampler.finish(),
//!     vec![Vec2::new(0.0, 0.0), Vec2::new(20.0, 0.0), Vec2::new(40.0, 0.0)]
//! );
//! ```

use flightsync_types::{FlightError, Vec2};
use tracing::warn;

/// Relative slack on the step so a sample exactly `k * step` away yields
/// exactly `k` waypoints despite floating-point drift.
const STEP_TOLERANCE: f64 = 1e-9;

/// Upper bound on the waypoints a single sample may produce.
pub const MAX_WAYPOINTS_PER_SAMPLE: usize = 10_000;

#[derive(Debug, Clone)]
pub struct PathResampler {
    step: f64,
    latest: Option<Vec2>,
    waypoints: Vec<Vec2>,
}

impl PathResampler {
    /// `step` must be finite and strictly positive.
    pub fn new(step: f64) -> Result<Self, FlightError> {
        if !step.is_finite() || step <= 0.0 {
            return Err(FlightError::InvalidConfig(format!(
                "waypoint step must be > 0, got {step}"
            )));
        }
        Ok(Self {
            step,
            latest: None,
            waypoints: Vec::new(),
        })
    }

    /// Start a gesture at `first`, discarding any previous waypoints.
    pub fn begin(&mut self, first: Vec2) {
        self.waypoints.clear();
        self.waypoints.push(first);
        self.latest = Some(first);
    }

    /// Feed one pointer sample and return how many waypoints it produced.
    /// Ignored while no gesture is active.
    ///
    /// Stops early once a step no longer brings `latest` closer to the
    /// sample (the step is below float resolution at these coordinates) or
    /// after [`MAX_WAYPOINTS_PER_SAMPLE`] waypoints.
    pub fn push(&mut self, sample: Vec2) -> usize {
        let Some(mut latest) = self.latest else {
            return 0;
        };

        let threshold = self.step * (1.0 - STEP_TOLERANCE);
        let mut remaining = sample.distance_to(latest);
        let mut added = 0;
        while remaining >= threshold {
            if added == MAX_WAYPOINTS_PER_SAMPLE {
                warn!(step = self.step, remaining, "sample too far away, waypoints capped");
                break;
            }
            let next = latest.add(sample.delta(latest).normalized().scale(self.step));
            let next_remaining = sample.distance_to(next);
            if next_remaining >= remaining {
                warn!(step = self.step, remaining, "step below float resolution, sample dropped");
                break;
            }
            latest = next;
            remaining = next_remaining;
            self.waypoints.push(latest);
            added += 1;
        }
        self.latest = Some(latest);
        added
    }

    /// End the gesture and hand out its waypoints. The resampler is empty
    /// afterwards.
    pub fn finish(&mut self) -> Vec<Vec2> {
        self.latest = None;
        std::mem::take(&mut self.waypoints)
    }

    /// Drop the gesture without producing a path.
    pub fn clear(&mut self) {
        self.latest = None;
        self.waypoints.clear();
    }

    pub fn waypoints(&self) -> &[Vec2] {
        &self.waypoints
    }

    pub fn is_active(&self) -> bool {
        self.latest.is_some()
    }

    pub fn step(&self) -> f64 {
        self.step
    }
}
