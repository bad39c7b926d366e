use std::sync::Arc;

use anyhow::Context;
use infrastructure::GeoOrigin;
use mapkit::{BootstrapperPlugin, ConfigSection, Container, MessageBus};
use tile::TileSettings;
use tracing::{info, warn};

use crate::config::SceneConfig;
use crate::domain::SceneGraph;

/// A corner position keeps four tiles loaded at once.
const TILES_AT_CORNER: usize = 4;

/// Builds the scene graph from what the infrastructure and tile plugins
/// registered; must run after both.
#[derive(Debug, Default)]
pub struct ScenePlugin;

impl BootstrapperPlugin for ScenePlugin {
    fn run(&self, container: &Container) -> anyhow::Result<bool> {
        info!("Bootstrapping scene");

        let origin = container
            .resolve::<GeoOrigin>()
            .context("scene requires the infrastructure plugin")?;
        let grid = container
            .resolve::<TileSettings>()
            .context("scene requires the tile plugin")?;
        let settings = container.resolve::<ConfigSection>()?;
        let cfg: SceneConfig = settings
            .get_or("scene", SceneConfig::default())
            .context("scene settings")?;

        if cfg.max_tiles < TILES_AT_CORNER {
            warn!(
                max_tiles = cfg.max_tiles,
                tile_size = grid.size(),
                "Scene holds fewer tiles than a corner position loads; tiles will be evicted early"
            );
        }

        let scene = Arc::new(SceneGraph::new(*origin, cfg.max_tiles));
        let bus = container.resolve::<MessageBus>()?;
        scene.attach(&bus);
        container.register_instance(scene)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mapkit::{GeoCoordinate, MapPoint, MapPositionChanged};
    use tile::{TileController, TileIndex, TilePlugin};

    fn container(settings: serde_json::Value) -> (Container, Arc<MessageBus>) {
        let c = Container::new();
        let bus = Arc::new(MessageBus::new());
        c.register_instance(Arc::new(ConfigSection::from_value(settings)))
            .unwrap();
        c.register_instance(Arc::clone(&bus)).unwrap();
        (c, bus)
    }

    #[test]
    fn fails_without_earlier_plugins() {
        let (c, _bus) = container(serde_json::json!({}));
        let err = ScenePlugin.run(&c).unwrap_err();
        assert!(format!("{err:#}").contains("infrastructure plugin"));
    }

    #[test]
    fn records_tiles_loaded_by_the_controller() {
        let (c, bus) = container(serde_json::json!({
            "tile": { "size": 100.0, "offset": 10.0 },
            "scene": { "max_tiles": 4 }
        }));
        c.register_instance(Arc::new(
            GeoOrigin::new(GeoCoordinate::new(10.0, 20.0)).unwrap(),
        ))
        .unwrap();
        TilePlugin.run(&c).unwrap();
        ScenePlugin.run(&c).unwrap();

        bus.publish(&MapPositionChanged {
            point: MapPoint::new(50.0, 50.0, 0.0),
        });

        let scene = c.resolve::<SceneGraph>().unwrap();
        assert_eq!(scene.max_tiles(), 4);
        let tile = scene.get(TileIndex::new(0, 0)).unwrap();
        assert!(tile.center.latitude > 10.0);
        assert!(c.resolve::<TileController>().unwrap().is_loaded(TileIndex::new(0, 0)));
    }

    #[test]
    fn returning_to_an_evicted_tile_loads_it_again() {
        let (c, bus) = container(serde_json::json!({
            "tile": { "size": 100.0, "offset": 10.0 },
            "scene": { "max_tiles": 2 }
        }));
        c.register_instance(Arc::new(
            GeoOrigin::new(GeoCoordinate::new(0.0, 0.0)).unwrap(),
        ))
        .unwrap();
        TilePlugin.run(&c).unwrap();
        ScenePlugin.run(&c).unwrap();

        for x in [50.0, 150.0, 250.0, 50.0] {
            bus.publish(&MapPositionChanged {
                point: MapPoint::new(x, 50.0, 0.0),
            });
        }

        let scene = c.resolve::<SceneGraph>().unwrap();
        let indices: Vec<_> = scene.tiles().iter().map(|t| t.index).collect();
        assert_eq!(indices, vec![TileIndex::new(2, 0), TileIndex::new(0, 0)]);

        let controller = c.resolve::<TileController>().unwrap();
        assert_eq!(controller.current_tile(), Some(TileIndex::new(0, 0)));
        assert!(controller.is_loaded(TileIndex::new(0, 0)));
        assert!(!controller.is_loaded(TileIndex::new(1, 0)));
        assert_eq!(controller.loaded_count(), scene.len());
    }
}
