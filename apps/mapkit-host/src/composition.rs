//! Composition root: the only place that fills the container directly.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use mapkit::{
    BootstrapperService, BufferedTrace, ConfigSection, Container, FileSystemService, GameRunner,
    HostPathResolver, LocalFileSystem, MessageBus, PathResolver, SequentialBootstrapper, Trace,
};
use mapkit_bootstrap::AppConfig;

use crate::registered_plugins::plugin_registry;

/// Build the container, register host services and plugins, and start the runner.
///
/// Any failure is reported to `trace` before it is returned.
pub fn compose(config: &AppConfig, trace: Arc<BufferedTrace>) -> Result<GameRunner> {
    match try_compose(config, Arc::clone(&trace)) {
        Ok(runner) => Ok(runner),
        Err(e) => {
            let cause: &(dyn std::error::Error + 'static) = e.as_ref();
            trace.error("host", "Error running game", Some(cause));
            Err(e)
        }
    }
}

fn try_compose(config: &AppConfig, trace: Arc<BufferedTrace>) -> Result<GameRunner> {
    let container = Arc::new(Container::with_policy(config.container.duplicate_bindings));
    let bus = Arc::new(MessageBus::new());

    let data_dir = config.data_dir();
    tracing::info!(data_dir = %data_dir.display(), "Registering host services");
    let resolver: Arc<dyn PathResolver> = Arc::new(HostPathResolver::new(data_dir));
    let fs: Arc<dyn FileSystemService> = Arc::new(LocalFileSystem::new(Arc::clone(&resolver)));
    let settings = ConfigSection::load(&config.host.settings_file, fs.as_ref())
        .with_context(|| format!("loading settings '{}'", config.host.settings_file))?;

    container.register_instance(resolver)?;
    container.register_instance(fs)?;
    container.register_instance(Arc::new(settings))?;

    let slow = Duration::from_millis(config.bootstrap.slow_plugin_warn_ms);
    container.register_singleton::<dyn BootstrapperService, _>(move |_| {
        Ok(Arc::new(
            SequentialBootstrapper::new().with_slow_plugin_threshold(slow),
        ))
    })?;

    let plugins = plugin_registry()?;
    container.register_instance::<dyn Trace>(trace)?;

    let mut runner = GameRunner::new(container, bus, plugins)?;
    runner.start()?;

    for warning in runner.container().duplicate_warnings() {
        tracing::warn!(%warning, "Duplicate binding during bootstrap");
    }
    Ok(runner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use demo::DemoTileListener;
    use mapkit::{HostLoopAdapter, HostPosition, RunnerState, TraceLevel};
    use mapkit_bootstrap::DuplicatePolicy;
    use scene::SceneGraph;
    use tempfile::tempdir;

    const SETTINGS: &str = r#"{
        "geo": { "origin": { "latitude": 52.5317, "longitude": 13.3872 } },
        "tile": { "size": 100.0, "offset": 10.0 },
        "scene": { "max_tiles": 4 },
        "demo": { "trace_positions": false }
    }"#;

    fn config_in(dir: &std::path::Path) -> AppConfig {
        let mut config = AppConfig::default();
        config.host.home_dir = dir.to_string_lossy().to_string();
        config.host.data_dir = dir.to_string_lossy().to_string();
        config
    }

    #[test]
    fn composes_and_runs_all_plugins() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("Config")).unwrap();
        std::fs::write(dir.path().join("Config/settings.json"), SETTINGS).unwrap();
        let trace = Arc::new(BufferedTrace::new(64));

        let runner = compose(&config_in(dir.path()), Arc::clone(&trace)).unwrap();
        assert_eq!(runner.state(), RunnerState::Running);

        let mut adapter = HostLoopAdapter::new();
        adapter.tick(&runner, HostPosition::new(150.0, 0.0, 50.0));

        let scene = runner.container().resolve::<SceneGraph>().unwrap();
        assert_eq!(scene.len(), 1);
        let listener = runner.container().resolve::<DemoTileListener>().unwrap();
        assert_eq!(listener.tiles_loaded(), 1);
        assert!(trace.records_at_least(TraceLevel::Error).is_empty());
    }

    #[test]
    fn missing_settings_file_is_reported_and_returned() {
        let dir = tempdir().unwrap();
        let trace = Arc::new(BufferedTrace::new(8));

        let err = compose(&config_in(dir.path()), Arc::clone(&trace)).unwrap_err();
        assert!(format!("{err:#}").contains("Config/settings.json"));

        let errors = trace.records_at_least(TraceLevel::Error);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "Error running game");
    }

    #[test]
    fn plugin_failure_names_the_plugin() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("Config")).unwrap();
        std::fs::write(
            dir.path().join("Config/settings.json"),
            r#"{ "geo": { "origin": { "latitude": 0.0, "longitude": 0.0 } }, "tile": { "size": 0.0 } }"#,
        )
        .unwrap();
        let trace = Arc::new(BufferedTrace::new(8));

        let err = compose(&config_in(dir.path()), Arc::clone(&trace)).unwrap_err();
        assert!(format!("{err:#}").contains("'tile'"));
        assert!(trace
            .records_at_least(TraceLevel::Error)
            .iter()
            .any(|r| r.message == "Error running game"));
    }

    #[test]
    fn strict_container_still_composes() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("Config")).unwrap();
        std::fs::write(dir.path().join("Config/settings.json"), SETTINGS).unwrap();
        let mut config = config_in(dir.path());
        config.container.duplicate_bindings = DuplicatePolicy::Reject;

        let runner = compose(&config, Arc::new(BufferedTrace::new(8))).unwrap();
        assert!(runner.container().duplicate_warnings().is_empty());
    }
}
