use mapkit::{GeoCoordinate, MapPoint};
use thiserror::Error;

/// Metres per degree of latitude on a spherical earth.
pub const METERS_PER_DEGREE: f64 = 111_320.0;

#[derive(Debug, Error, PartialEq)]
pub enum OriginError {
    #[error("latitude {0} is outside [-90, 90]")]
    Latitude(f64),
    #[error("longitude {0} is outside [-180, 180]")]
    Longitude(f64),
    #[error("origin latitude {0} is too close to a pole for a planar projection")]
    Polar(f64),
}

/// Geographic anchor of the map plane.
///
/// Projection is equirectangular around the origin: accurate enough for the
/// few kilometres a session covers, and exactly invertible.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoOrigin {
    coordinate: GeoCoordinate,
    meters_per_degree_lon: f64,
}

impl GeoOrigin {
    pub fn new(coordinate: GeoCoordinate) -> Result<Self, OriginError> {
        if !(-90.0..=90.0).contains(&coordinate.latitude) {
            return Err(OriginError::Latitude(coordinate.latitude));
        }
        if !(-180.0..=180.0).contains(&coordinate.longitude) {
            return Err(OriginError::Longitude(coordinate.longitude));
        }
        let meters_per_degree_lon = METERS_PER_DEGREE * coordinate.latitude.to_radians().cos();
        if meters_per_degree_lon < 1.0 {
            return Err(OriginError::Polar(coordinate.latitude));
        }
        Ok(Self {
            coordinate,
            meters_per_degree_lon,
        })
    }

    pub fn coordinate(&self) -> GeoCoordinate {
        self.coordinate
    }

    /// Map point (metres east `x`, metres north `y`) to latitude/longitude.
    pub fn to_geo(&self, point: MapPoint) -> GeoCoordinate {
        GeoCoordinate::new(
            self.coordinate.latitude + point.y / METERS_PER_DEGREE,
            self.coordinate.longitude + point.x / self.meters_per_degree_lon,
        )
    }

    /// Inverse of [`GeoOrigin::to_geo`]; elevation is zero.
    pub fn to_map(&self, coordinate: GeoCoordinate) -> MapPoint {
        MapPoint::new(
            (coordinate.longitude - self.coordinate.longitude) * self.meters_per_degree_lon,
            (coordinate.latitude - self.coordinate.latitude) * METERS_PER_DEGREE,
            0.0,
        )
    }
}
