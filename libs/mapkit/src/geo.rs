//! Coordinate types shared between the host loop and the engine.

use serde::{Deserialize, Serialize};

/// A point in the host's world space (y is up).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HostPosition {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl HostPosition {
    /// Value that no real sample compares equal to, so the first tick always reports a change.
    pub const UNSET: HostPosition = HostPosition {
        x: f32::MIN,
        y: f32::MIN,
        z: f32::MIN,
    };

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

impl Default for HostPosition {
    fn default() -> Self {
        Self::UNSET
    }
}

/// A point in map space: `y` is the planar axis, `elevation` the vertical one.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MapPoint {
    pub x: f64,
    pub y: f64,
    pub elevation: f64,
}

impl MapPoint {
    pub const fn new(x: f64, y: f64, elevation: f64) -> Self {
        Self { x, y, elevation }
    }
}

impl From<HostPosition> for MapPoint {
    fn from(p: HostPosition) -> Self {
        MapPoint {
            x: f64::from(p.x),
            y: f64::from(p.z),
            elevation: f64::from(p.y),
        }
    }
}

/// Geographic coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoCoordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoCoordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl std::fmt::Display for GeoCoordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.latitude, self.longitude)
    }
}
