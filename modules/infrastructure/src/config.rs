use serde::{Deserialize, Serialize};

/// Settings read from the `geo` section of the settings file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeoConfig {
    /// World origin; map point (0, 0) sits here.
    pub origin: OriginConfig,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OriginConfig {
    pub latitude: f64,
    pub longitude: f64,
}
