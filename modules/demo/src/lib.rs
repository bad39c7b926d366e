//! Demo plugin: reports tile activity to the host's trace console.

pub mod config;
pub mod listener;
pub mod plugin;

pub use listener::DemoTileListener;
pub use plugin::DemoPlugin;
