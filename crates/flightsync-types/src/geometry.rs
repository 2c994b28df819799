//! 2-D vector helpers for screen-space math.
//!
//! All operations are pure and return new values.
//!
//! # Example
//!
//! ```rust
//! use flightsync_types::geometry::Vec2;
//!
//! let a = Vec2::new(0.0, 0.0);
//! let b = Vec2::new(3.0, 4.0);
//! assert_eq!(a.distance_to(b), 5.0);
//! let scaled = b.delta(a).normalized().scale(10.0);
//! assert!(scaled.distance_to(Vec2::new(6.0, 8.0)) < 1e-12);
//! ```

use serde::{Deserialize, Serialize};

/// A point or direction in screen space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean length.
    pub fn magnitude(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Euclidean distance between `self` and `other`.
    pub fn distance_to(self, other: Self) -> f64 {
        self.delta(other).magnitude()
    }

    /// `self - other`.
    pub fn delta(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }

    pub fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }

    pub fn scale(self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    /// Unit vector in the same direction. The zero vector is returned as is.
    pub fn normalized(self) -> Self {
        let m = self.magnitude();
        if m > 0.0 { self.scale(1.0 / m) } else { self }
    }

    pub fn midpoint(self, other: Self) -> Self {
        Self::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    /// Linear interpolation, `t = 0` yields `self`, `t = 1` yields `other`.
    pub fn lerp(self, other: Self, t: f64) -> Self {
        self.add(other.delta(self).scale(t))
    }

    /// Angle of the vector against +X in radians.
    pub fn angle(self) -> f64 {
        self.y.atan2(self.x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_symmetric() {
        let a = Vec2::new(1.0, 1.0);
        let b = Vec2::new(4.0, 5.0);
        assert_eq!(a.distance_to(b), 5.0);
        assert_eq!(b.distance_to(a), 5.0);
    }

    #[test]
    fn normalized_zero_stays_zero() {
        assert_eq!(Vec2::ZERO.normalized(), Vec2::ZERO);
    }

    #[test]
    fn normalized_has_unit_length() {
        let n = Vec2::new(-7.0, 24.0).normalized();
        assert!((n.magnitude() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn normalized_then_scaled_points_along_the_delta() {
        let scaled = Vec2::new(3.0, 4.0).delta(Vec2::ZERO).normalized().scale(10.0);
        assert!(scaled.distance_to(Vec2::new(6.0, 8.0)) < 1e-12);
    }

    #[test]
    fn midpoint_and_lerp_agree() {
        let a = Vec2::new(0.0, 10.0);
        let b = Vec2::new(20.0, 30.0);
        assert_eq!(a.midpoint(b), Vec2::new(10.0, 20.0));
        assert_eq!(a.lerp(b, 0.5), a.midpoint(b));
        assert_eq!(a.lerp(b, 1.0), b);
    }

    #[test]
    fn angle_of_axes() {
        assert_eq!(Vec2::new(1.0, 0.0).angle(), 0.0);
        assert!((Vec2::new(0.0, 1.0).angle() - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    }
}
