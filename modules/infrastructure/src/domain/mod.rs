mod origin;

pub use origin::{GeoOrigin, OriginError, METERS_PER_DEGREE};
