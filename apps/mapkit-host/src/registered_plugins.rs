// Bootstrapper plugins, in the order they run. Later plugins may resolve what
// earlier ones registered: scene needs the origin and the tile grid, demo
// picks up the scene when present. Keep the order when adding entries.

use std::sync::Arc;

use mapkit::{PluginRegistry, RegistryError};

pub fn plugin_registry() -> Result<PluginRegistry, RegistryError> {
    let mut b = PluginRegistry::builder();
    b.register("infrastructure", Arc::new(infrastructure::InfrastructurePlugin))
        .register("tile", Arc::new(tile::TilePlugin))
        .register("scene", Arc::new(scene::ScenePlugin))
        .register("demo", Arc::new(demo::DemoPlugin));
    b.build()
}
