use std::sync::Arc;

use anyhow::Context;
use mapkit::{BootstrapperPlugin, ConfigSection, Container, MessageBus, Trace, TracingTrace};
use scene::SceneGraph;
use tracing::info;

use crate::config::DemoConfig;
use crate::listener::DemoTileListener;

/// Hooks the demo listener to the bus. The scene is optional.
#[derive(Debug, Default)]
pub struct DemoPlugin;

impl BootstrapperPlugin for DemoPlugin {
    fn run(&self, container: &Container) -> anyhow::Result<bool> {
        info!("Bootstrapping demo listener");

        let settings = container.resolve::<ConfigSection>()?;
        let cfg: DemoConfig = settings
            .get_or("demo", DemoConfig::default())
            .context("demo settings")?;

        let trace = container
            .try_resolve::<dyn Trace>()?
            .unwrap_or_else(|| Arc::new(TracingTrace) as Arc<dyn Trace>);
        let scene = container.try_resolve::<SceneGraph>()?;
        let bus = container.resolve::<MessageBus>()?;

        let listener = Arc::new(DemoTileListener::new(trace, scene, cfg.trace_positions));
        listener.attach(&bus);
        container.register_instance(listener)?;
        Ok(true)
    }
}
