use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Settings read from the `tile` section of the settings file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TileConfig {
    /// Edge length of a square tile, in map units.
    #[serde(default = "default_size")]
    pub size: f64,
    /// Distance from a tile edge at which the neighbour tile is preloaded.
    #[serde(default = "default_offset")]
    pub offset: f64,
}

#[derive(Debug, Error, PartialEq)]
pub enum TileConfigError {
    #[error("tile size must be a positive number, got {0}")]
    Size(f64),
    #[error("tile offset must be within [0, size/2), got {offset} for size {size}")]
    Offset { offset: f64, size: f64 },
}

impl Default for TileConfig {
    fn default() -> Self {
        Self {
            size: default_size(),
            offset: default_offset(),
        }
    }
}

impl TileConfig {
    pub fn validate(&self) -> Result<(), TileConfigError> {
        if !(self.size.is_finite() && self.size > 0.0) {
            return Err(TileConfigError::Size(self.size));
        }
        if !(self.offset >= 0.0 && self.offset < self.size / 2.0) {
            return Err(TileConfigError::Offset {
                offset: self.offset,
                size: self.size,
            });
        }
        Ok(())
    }
}

fn default_size() -> f64 {
    500.0
}

fn default_offset() -> f64 {
    50.0
}
