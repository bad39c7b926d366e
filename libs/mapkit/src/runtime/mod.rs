mod bootstrapper;
mod host_loop;
mod runner;

pub use bootstrapper::{BootstrapError, BootstrapReport, BootstrapperService, SequentialBootstrapper};
pub use host_loop::HostLoopAdapter;
pub use runner::{GameRunner, RunnerError, RunnerState};
