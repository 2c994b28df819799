//! `flightsync-path` – Drawn Paths
//!
//! Turns a stream of raw pointer samples into evenly spaced waypoints, the
//! waypoints into a smooth curve, and the curve into motion.
//!
//! # Modules
//!
//! - [`resampler`] – Fixed-step waypoint emission from pointer samples.
//! - [`curve`] – Quadratic-through-midpoints smoothing.
//! - [`follow`] – Constant-speed traversal of a curve.

pub mod curve;
pub mod follow;
pub mod resampler;

pub use curve::{CurveSegment, SmoothedCurve};
pub use follow::{FollowStep, PathFollower};
pub use resampler::PathResampler;
