//! Logical → host-specific path resolution.

use std::path::{Path, PathBuf, MAIN_SEPARATOR};

/// Resolves a logical engine path (always written with `/`) into a path the
/// host operating system understands.
pub trait PathResolver: Send + Sync {
    fn resolve(&self, path: &str) -> PathBuf;
}

/// Resolves relative paths against a fixed root and rewrites separators for
/// the current platform. Absolute paths are only normalized.
#[derive(Debug, Clone)]
pub struct HostPathResolver {
    root: PathBuf,
}

impl HostPathResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl PathResolver for HostPathResolver {
    fn resolve(&self, path: &str) -> PathBuf {
        let native: String = path
            .chars()
            .map(|c| if c == '/' || c == '\\' { MAIN_SEPARATOR } else { c })
            .collect();
        let p = Path::new(&native);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.root.join(p)
        }
    }
}
