//! Scene plugin: keeps the set of loaded tiles with their geographic placement.

pub mod config;
pub mod domain;
pub mod plugin;

pub use domain::{SceneGraph, SceneTile};
pub use plugin::ScenePlugin;
