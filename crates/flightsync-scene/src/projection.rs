//! Geographic to screen projection.
//!
//! [`MercatorViewport`] maps a longitude/latitude box onto a
//! `width × height` screen with the origin in the top-left corner and `y`
//! growing downwards. Latitude is stretched with the spherical web-mercator
//! formula so the picture matches a slippy map of the same box.
//!
//! | Screen | Geographic |
//! |---|---|
//! | `(0, 0)` | north-west corner |
//! | `(width, height)` | south-east corner |

use std::f64::consts::FRAC_PI_4;

use flightsync_types::{FlightError, GeoPoint, Vec2};
use serde::{Deserialize, Serialize};

/// Geographic to screen mapping plus the visibility test for its output.
pub trait Projection {
    fn project(&self, geo: GeoPoint) -> Vec2;

    /// Whether a projected point is on screen.
    fn contains(&self, point: Vec2) -> bool;
}

/// Convert a compass heading (degrees clockwise from north) into the
/// rotation applied to an aircraft node.
pub fn screen_heading(degrees: f64) -> f64 {
    -degrees.to_radians()
}

/// Longitude/latitude box in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl Default for GeoBounds {
    /// Central Hesse and its surroundings.
    fn default() -> Self {
        Self {
            west: 7.5,
            south: 49.8,
            east: 10.0,
            north: 51.6,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MercatorViewport {
    width: f64,
    height: f64,
    bounds: GeoBounds,
    merc_north: f64,
    merc_south: f64,
}

impl MercatorViewport {
    pub fn new(width: f64, height: f64, bounds: GeoBounds) -> Result<Self, FlightError> {
        if !(width > 0.0 && height > 0.0) {
            return Err(FlightError::InvalidConfig(format!(
                "viewport must have a positive size, got {width}x{height}"
            )));
        }
        if !(bounds.east > bounds.west && bounds.north > bounds.south) {
            return Err(FlightError::InvalidConfig(format!(
                "map bounds are empty: {bounds:?}"
            )));
        }
        if bounds.north.abs() >= 90.0 || bounds.south.abs() >= 90.0 {
            return Err(FlightError::InvalidConfig(
                "map bounds must stay clear of the poles".to_string(),
            ));
        }
        Ok(Self {
            width,
            height,
            bounds,
            merc_north: mercator_y(bounds.north),
            merc_south: mercator_y(bounds.south),
        })
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn bounds(&self) -> GeoBounds {
        self.bounds
    }
}

impl Projection for MercatorViewport {
    fn project(&self, geo: GeoPoint) -> Vec2 {
        let x = (geo.longitude - self.bounds.west) / (self.bounds.east - self.bounds.west) * self.width;
        let y = (self.merc_north - mercator_y(geo.latitude)) / (self.merc_north - self.merc_south)
            * self.height;
        Vec2::new(x, y)
    }

    fn contains(&self, point: Vec2) -> bool {
        (0.0..self.width).contains(&point.x) && (0.0..self.height).contains(&point.y)
    }
}

fn mercator_y(latitude: f64) -> f64 {
    (FRAC_PI_4 + latitude.to_radians() / 2.0).tan().ln()
}
