//! Tile plugin: tile grid geometry and the controller that decides which
//! tiles the engine needs for the current avatar position.

pub mod config;
pub mod domain;
pub mod plugin;

pub use config::{TileConfig, TileConfigError};
pub use domain::{
    TileBounds, TileChanged, TileController, TileEvicted, TileIndex, TileLoaded, TileSettings,
};
pub use plugin::TilePlugin;
