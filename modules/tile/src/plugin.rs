use std::sync::Arc;

use anyhow::Context;
use mapkit::{BootstrapperPlugin, ConfigSection, Container, MessageBus};
use tracing::{debug, info};

use crate::config::TileConfig;
use crate::domain::{TileController, TileSettings};

/// Registers the tile grid settings and the tile controller, and attaches the
/// controller to position updates.
#[derive(Debug, Default)]
pub struct TilePlugin;

impl BootstrapperPlugin for TilePlugin {
    fn run(&self, container: &Container) -> anyhow::Result<bool> {
        info!("Bootstrapping tile subsystem");

        let settings = container.resolve::<ConfigSection>()?;
        let cfg: TileConfig = settings
            .get_or("tile", TileConfig::default())
            .context("tile settings")?;
        let grid = TileSettings::new(&cfg).context("tile settings")?;
        debug!(size = grid.size(), offset = grid.offset(), "Tile grid");

        container.register_instance(Arc::new(grid))?;
        container.register_singleton(|r| {
            let settings = r.resolve::<TileSettings>()?;
            let bus = r.resolve::<MessageBus>()?;
            Ok(Arc::new(TileController::new(*settings, bus)))
        })?;

        let controller = container.resolve::<TileController>()?;
        controller.attach();
        Ok(true)
    }
}
