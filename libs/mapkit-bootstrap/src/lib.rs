//! Host-side plumbing for MapKit: layered host configuration, the engine
//! settings file, path resolution, file access, logging and shutdown signals.

pub mod config;
pub mod config_section;
pub mod fs;
pub mod logging;
pub mod paths;
pub mod signals;

pub use config::*;
pub use config_section::{ConfigError, ConfigSection};
pub use fs::{FileSystemService, FsError, LocalFileSystem};
pub use logging::*;
pub use paths::{HostPathResolver, PathResolver};
pub use signals::*;
