pub mod home_dir;
pub mod resolver;

pub use resolver::{HostPathResolver, PathResolver};
