//! # MapKit - bootstrap core for the map engine host
//!
//! The host builds a [`Container`] and a [`MessageBus`], registers the
//! infrastructure services (paths, file system, settings), the
//! [`BootstrapperService`] and an ordered list of bootstrapper plugins, then
//! hands everything to a [`GameRunner`].
//!
//! ## Bootstrap
//!
//! - Plugins run once, strictly in registration order.
//! - The first plugin that fails or declines stops the sequence; the error names it.
//! - Plugins may register capabilities for later plugins.
//!
//! ## Frame loop
//!
//! Once running, the host calls [`HostLoopAdapter::tick`] every frame. A moved
//! avatar is converted to map space and published as [`MapPositionChanged`].
//!
//! ```rust,ignore
//! let container = Arc::new(Container::new());
//! container.register_singleton::<dyn BootstrapperService, _>(|_| {
//!     Ok(Arc::new(SequentialBootstrapper::new()))
//! })?;
//!
//! let mut plugins = PluginRegistry::builder();
//! plugins.register("tile", Arc::new(TilePlugin));
//!
//! let mut runner = GameRunner::new(container, Arc::new(MessageBus::new()), plugins.build()?)?;
//! runner.start()?;
//!
//! let mut adapter = HostLoopAdapter::new();
//! adapter.tick(&runner, HostPosition::new(1.0, 0.0, 2.0));
//! ```

pub use anyhow::Result;

pub mod bus;
pub mod container;
pub mod contracts;
pub mod geo;
pub mod messages;
pub mod registry;
pub mod runtime;
pub mod trace;

pub use bus::{MessageBus, SubscriptionId};
pub use container::{
    Capability, Container, ContainerError, DuplicateBindingWarning, DuplicatePolicy, Lifetime,
    Resolver,
};
pub use contracts::{BootstrapperPlugin, PluginDescriptor};
pub use geo::{GeoCoordinate, HostPosition, MapPoint};
pub use messages::{MapPositionChanged, RunnerStateChanged};
pub use registry::{PluginRegistry, PluginRegistryBuilder, RegistryError};
pub use runtime::{
    BootstrapError, BootstrapReport, BootstrapperService, GameRunner, HostLoopAdapter,
    RunnerError, RunnerState, SequentialBootstrapper,
};
pub use trace::{BufferedTrace, Trace, TraceLevel, TraceRecord, TracingTrace};

// Infrastructure services plugins resolve from the container.
pub use mapkit_bootstrap::{
    ConfigError, ConfigSection, FileSystemService, FsError, HostPathResolver, LocalFileSystem,
    PathResolver,
};
