//! Quadratic-through-midpoints smoothing.
//!
//! A waypoint sequence `p0 … pn` is turned into a piecewise curve that
//! starts at `p0`, ends at `pn` and passes through the midpoint of every
//! consecutive pair. Interior waypoints become control points, so the
//! curve bends towards them without passing through them:
//!
//! ```text
//! move  p0
//! line  mid(p0, p1)
//! quad  control p1, to mid(p1, p2)
//! quad  control p2, to mid(p2, p3)
//! …
//! line  pn
//! ```
//!
//! The construction is local; changing one waypoint only affects the two
//! segments around it.

use flightsync_types::Vec2;
use serde::{Deserialize, Serialize};

/// One drawing instruction, continuing from the previous segment's end.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CurveSegment {
    Line { to: Vec2 },
    Quad { control: Vec2, to: Vec2 },
}

impl CurveSegment {
    pub fn end(&self) -> Vec2 {
        match *self {
            CurveSegment::Line { to } | CurveSegment::Quad { to, .. } => to,
        }
    }
}

/// Immutable smoothed path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmoothedCurve {
    start: Vec2,
    segments: Vec<CurveSegment>,
}

impl SmoothedCurve {
    /// Build the curve through `points`.
    ///
    /// Returns `None` for no points. A single point gives a degenerate curve
    /// that starts where it ends and has no segments.
    pub fn build(points: &[Vec2]) -> Option<Self> {
        let (&start, rest) = points.split_first()?;
        let Some(&last) = rest.last() else {
            return Some(Self {
                start,
                segments: Vec::new(),
            });
        };

        let mut segments = Vec::with_capacity(points.len());
        for (i, pair) in points.windows(2).enumerate() {
            let mid = pair[0].midpoint(pair[1]);
            if i == 0 {
                segments.push(CurveSegment::Line { to: mid });
            } else {
                segments.push(CurveSegment::Quad {
                    control: pair[0],
                    to: mid,
                });
            }
        }
        segments.push(CurveSegment::Line { to: last });

        Some(Self { start, segments })
    }

    pub fn start(&self) -> Vec2 {
        self.start
    }

    pub fn end(&self) -> Vec2 {
        self.segments.last().map_or(self.start, CurveSegment::end)
    }

    pub fn segments(&self) -> &[CurveSegment] {
        &self.segments
    }

    /// True for a single-point curve.
    pub fn is_degenerate(&self) -> bool {
        self.segments.is_empty()
    }

    /// Approximate the curve by a polyline. Lines contribute their end
    /// point, quadratics `segments_per_quad` evenly spaced samples in `t`.
    pub fn flatten(&self, segments_per_quad: usize) -> Vec<Vec2> {
        let steps = segments_per_quad.max(1);
        let mut points = vec![self.start];
        let mut pen = self.start;

        for segment in &self.segments {
            match *segment {
                CurveSegment::Line { to } => points.push(to),
                CurveSegment::Quad { control, to } => {
                    for k in 1..=steps {
                        let t = k as f64 / steps as f64;
                        points.push(quad_point(pen, control, to, t));
                    }
                }
            }
            pen = segment.end();
        }
        points
    }
}

/// Quadratic Bézier `B(t) = (1-t)² p0 + 2(1-t)t c + t² p2`.
fn quad_point(p0: Vec2, control: Vec2, p2: Vec2, t: f64) -> Vec2 {
    let u = 1.0 - t;
    p0.scale(u * u).add(control.scale(2.0 * u * t)).add(p2.scale(t * t))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(x: f64, y: f64) -> Vec2 {
        Vec2::new(x, y)
    }

    #[test]
    fn empty_input_has_no_curve() {
        assert!(SmoothedCurve::build(&[]).is_none());
    }

    #[test]
    fn single_point_is_degenerate() {
        let curve = SmoothedCurve::build(&[v(3.0, 4.0)]).unwrap();
        assert!(curve.is_degenerate());
        assert_eq!(curve.start(), v(3.0, 4.0));
        assert_eq!(curve.end(), v(3.0, 4.0));
    }

    #[test]
    fn two_points_are_two_lines_via_midpoint() {
        let curve = SmoothedCurve::build(&[v(0.0, 0.0), v(10.0, 0.0)]).unwrap();
        assert_eq!(
            curve.segments(),
            &[
                CurveSegment::Line { to: v(5.0, 0.0) },
                CurveSegment::Line { to: v(10.0, 0.0) },
            ]
        );
    }

    #[test]
    fn interior_points_become_controls() {
        let p = [v(0.0, 0.0), v(20.0, 0.0), v(20.0, 20.0), v(40.0, 20.0)];
        let curve = SmoothedCurve::build(&p).unwrap();
        assert_eq!(
            curve.segments(),
            &[
                CurveSegment::Line { to: v(10.0, 0.0) },
                CurveSegment::Quad { control: v(20.0, 0.0), to: v(20.0, 10.0) },
                CurveSegment::Quad { control: v(20.0, 20.0), to: v(30.0, 20.0) },
                CurveSegment::Line { to: v(40.0, 20.0) },
            ]
        );
        assert_eq!(curve.start(), p[0]);
        assert_eq!(curve.end(), p[3]);
    }

    #[test]
    fn passes_through_every_midpoint() {
        let p = [v(0.0, 0.0), v(20.0, 5.0), v(35.0, 30.0), v(10.0, 50.0), v(0.0, 70.0)];
        let curve = SmoothedCurve::build(&p).unwrap();
        let ends: Vec<Vec2> = curve.segments().iter().map(CurveSegment::end).collect();
        for pair in p.windows(2) {
            assert!(ends.contains(&pair[0].midpoint(pair[1])));
        }
    }

    #[test]
    fn flatten_starts_and_ends_on_curve_endpoints() {
        let p = [v(0.0, 0.0), v(20.0, 0.0), v(20.0, 20.0)];
        let curve = SmoothedCurve::build(&p).unwrap();
        let poly = curve.flatten(8);
        assert_eq!(poly.first(), Some(&v(0.0, 0.0)));
        assert_eq!(poly.last(), Some(&v(20.0, 20.0)));
        // start + line + 8 quad samples + line
        assert_eq!(poly.len(), 1 + 1 + 8 + 1);
    }

    #[test]
    fn quad_midpoint_sample() {
        let point = quad_point(v(0.0, 0.0), v(10.0, 10.0), v(20.0, 0.0), 0.5);
        assert_eq!(point, v(10.0, 5.0));
    }
}
