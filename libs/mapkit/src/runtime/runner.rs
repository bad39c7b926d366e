//! Game runner - owns the container and bus, drives bootstrap, then accepts
//! position updates from the host loop.
//!
//! Lifecycle: `Created → Bootstrapping → Running`, or `Faulted` when bootstrap
//! fails. `shutdown()` moves a running or faulted runner to `ShuttingDown`.
//! A runner never bootstraps twice.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::bus::MessageBus;
use crate::container::{Container, ContainerError};
use crate::geo::MapPoint;
use crate::messages::{MapPositionChanged, RunnerStateChanged};
use crate::registry::PluginRegistry;
use crate::runtime::bootstrapper::{BootstrapError, BootstrapReport, BootstrapperService};
use crate::trace::{Trace, TracingTrace};

const TRACE_CATEGORY: &str = "runner";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunnerState {
    Created,
    Bootstrapping,
    Running,
    Faulted,
    ShuttingDown,
}

impl fmt::Display for RunnerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RunnerState::Created => "created",
            RunnerState::Bootstrapping => "bootstrapping",
            RunnerState::Running => "running",
            RunnerState::Faulted => "faulted",
            RunnerState::ShuttingDown => "shutting_down",
        })
    }
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("cannot {operation} a runner in state '{state}'")]
    InvalidState {
        operation: &'static str,
        state: RunnerState,
    },
    #[error("bootstrap failed")]
    Bootstrap(#[from] BootstrapError),
    #[error("runner wiring failed")]
    Container(#[from] ContainerError),
}

pub struct GameRunner {
    container: Arc<Container>,
    bus: Arc<MessageBus>,
    plugins: PluginRegistry,
    state: RunnerState,
}

impl fmt::Debug for GameRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameRunner")
            .field("state", &self.state)
            .field("plugins", &self.plugins.names())
            .finish_non_exhaustive()
    }
}

impl GameRunner {
    /// Create a runner and make the bus resolvable from the container.
    pub fn new(
        container: Arc<Container>,
        bus: Arc<MessageBus>,
        plugins: PluginRegistry,
    ) -> Result<Self, RunnerError> {
        container.register_instance(Arc::clone(&bus))?;
        Ok(Self {
            container,
            bus,
            plugins,
            state: RunnerState::Created,
        })
    }

    pub fn state(&self) -> RunnerState {
        self.state
    }

    pub fn container(&self) -> &Arc<Container> {
        &self.container
    }

    pub fn bus(&self) -> &Arc<MessageBus> {
        &self.bus
    }

    pub fn plugins(&self) -> &PluginRegistry {
        &self.plugins
    }

    /// Run every plugin through the registered [`BootstrapperService`].
    ///
    /// On failure the runner is left `Faulted`, the error is reported to the
    /// [`Trace`] sink and then returned.
    pub fn start(&mut self) -> Result<BootstrapReport, RunnerError> {
        if self.state != RunnerState::Created {
            return Err(RunnerError::InvalidState {
                operation: "start",
                state: self.state,
            });
        }

        self.transition(RunnerState::Bootstrapping);
        match self.bootstrap() {
            Ok(report) => {
                self.transition(RunnerState::Running);
                Ok(report)
            }
            Err(e) => {
                self.transition(RunnerState::Faulted);
                self.trace().error(TRACE_CATEGORY, "Bootstrap failed", Some(&e));
                Err(e)
            }
        }
    }

    fn bootstrap(&self) -> Result<BootstrapReport, RunnerError> {
        let service = self.container.resolve::<dyn BootstrapperService>()?;
        Ok(service.run_all(&self.container, self.plugins.plugins())?)
    }

    /// Forward a new avatar position to the engine. Ignored unless running.
    pub fn on_position_changed(&self, point: MapPoint) {
        if self.state != RunnerState::Running {
            tracing::debug!(state = %self.state, ?point, "Position update ignored");
            return;
        }
        self.bus.publish(&MapPositionChanged { point });
    }

    pub fn shutdown(&mut self) -> Result<(), RunnerError> {
        match self.state {
            RunnerState::Running | RunnerState::Faulted => {
                self.transition(RunnerState::ShuttingDown);
                Ok(())
            }
            state => Err(RunnerError::InvalidState {
                operation: "shut down",
                state,
            }),
        }
    }

    fn transition(&mut self, to: RunnerState) {
        let from = std::mem::replace(&mut self.state, to);
        tracing::info!(%from, %to, "Runner state changed");
        self.bus.publish(&RunnerStateChanged { from, to });
    }

    fn trace(&self) -> Arc<dyn Trace> {
        match self.container.try_resolve::<dyn Trace>() {
            Ok(Some(trace)) => trace,
            Ok(None) => Arc::new(TracingTrace),
            Err(e) => {
                tracing::warn!(error = %e, "Trace sink unavailable; using log output");
                Arc::new(TracingTrace)
            }
        }
    }
}
