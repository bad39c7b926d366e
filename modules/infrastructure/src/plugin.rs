use std::sync::Arc;

use anyhow::Context;
use mapkit::{BootstrapperPlugin, ConfigSection, Container, GeoCoordinate, Trace, TracingTrace};
use tracing::{debug, info};

use crate::config::GeoConfig;
use crate::domain::GeoOrigin;

/// Registers the services every later plugin may rely on: the geographic
/// origin and a trace sink when the host did not provide one.
#[derive(Debug, Default)]
pub struct InfrastructurePlugin;

impl BootstrapperPlugin for InfrastructurePlugin {
    fn run(&self, container: &Container) -> anyhow::Result<bool> {
        info!("Bootstrapping infrastructure");

        let settings = container.resolve::<ConfigSection>()?;
        let cfg: GeoConfig = settings.require("geo").context("geo settings")?;
        let origin = GeoOrigin::new(GeoCoordinate::new(
            cfg.origin.latitude,
            cfg.origin.longitude,
        ))
        .context("geo/origin")?;
        debug!(origin = %origin.coordinate(), "World origin");
        container.register_instance(Arc::new(origin))?;

        if !container.contains::<dyn Trace>() {
            debug!("No trace sink registered; using log output");
            container.register_instance::<dyn Trace>(Arc::new(TracingTrace))?;
        }

        Ok(true)
    }
}
