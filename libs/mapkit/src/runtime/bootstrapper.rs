//! Bootstrapper service - runs the ordered plugin list against the container.

use std::time::{Duration, Instant};

use thiserror::Error;

use crate::container::Container;
use crate::contracts::PluginDescriptor;

/// Runs plugins strictly in the given order and stops at the first failure.
pub trait BootstrapperService: Send + Sync {
    fn run_all(
        &self,
        container: &Container,
        plugins: &[PluginDescriptor],
    ) -> Result<BootstrapReport, BootstrapError>;
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("bootstrapper plugin '{plugin}' failed")]
    PluginFailed {
        plugin: &'static str,
        #[source]
        source: anyhow::Error,
    },
    #[error("bootstrapper plugin '{plugin}' reported an unsuccessful run")]
    PluginDeclined { plugin: &'static str },
}

impl BootstrapError {
    /// Name of the plugin that stopped the bootstrap.
    pub fn plugin(&self) -> &'static str {
        match self {
            BootstrapError::PluginFailed { plugin, .. } | BootstrapError::PluginDeclined { plugin } => {
                plugin
            }
        }
    }
}

/// Plugins that completed, in run order, with their wall time.
#[derive(Debug, Default, Clone)]
pub struct BootstrapReport {
    pub completed: Vec<(&'static str, Duration)>,
}

impl BootstrapReport {
    pub fn names(&self) -> Vec<&'static str> {
        self.completed.iter().map(|(n, _)| *n).collect()
    }

    pub fn total(&self) -> Duration {
        self.completed.iter().map(|(_, d)| *d).sum()
    }
}

#[derive(Debug, Clone, Default)]
pub struct SequentialBootstrapper {
    slow_plugin_threshold: Option<Duration>,
}

impl SequentialBootstrapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Warn when a single plugin runs longer than `threshold`. Zero disables it.
    pub fn with_slow_plugin_threshold(mut self, threshold: Duration) -> Self {
        self.slow_plugin_threshold = (!threshold.is_zero()).then_some(threshold);
        self
    }
}

impl BootstrapperService for SequentialBootstrapper {
    fn run_all(
        &self,
        container: &Container,
        plugins: &[PluginDescriptor],
    ) -> Result<BootstrapReport, BootstrapError> {
        tracing::info!(count = plugins.len(), "Phase: bootstrap");

        let mut report = BootstrapReport::default();
        for entry in plugins {
            tracing::debug!(plugin = entry.name, "Running bootstrapper plugin");
            let started = Instant::now();

            let ok = entry
                .plugin
                .run(container)
                .map_err(|e| BootstrapError::PluginFailed {
                    plugin: entry.name,
                    source: e,
                })?;

            let elapsed = started.elapsed();
            if !ok {
                return Err(BootstrapError::PluginDeclined { plugin: entry.name });
            }

            if let Some(limit) = self.slow_plugin_threshold {
                if elapsed > limit {
                    tracing::warn!(
                        plugin = entry.name,
                        elapsed_ms = elapsed.as_millis() as u64,
                        limit_ms = limit.as_millis() as u64,
                        "Bootstrapper plugin is slow"
                    );
                }
            }
            tracing::info!(
                plugin = entry.name,
                elapsed_ms = elapsed.as_millis() as u64,
                "Bootstrapper plugin completed"
            );
            report.completed.push((entry.name, elapsed));
        }

        tracing::info!(
            plugins = ?report.names(),
            total_ms = report.total().as_millis() as u64,
            "Bootstrap complete"
        );
        Ok(report)
    }
}
