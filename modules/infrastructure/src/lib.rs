//! Infrastructure plugin: world origin and shared services.

pub mod config;
pub mod domain;
pub mod plugin;

pub use domain::{GeoOrigin, OriginError};
pub use plugin::InfrastructurePlugin;
