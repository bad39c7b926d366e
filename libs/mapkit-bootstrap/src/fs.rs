//! File-system access for engine resources, routed through a [`PathResolver`].

use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::paths::PathResolver;

#[derive(Debug, Error)]
pub enum FsError {
    #[error("file not found: {path}")]
    NotFound { path: PathBuf },
    #[error("I/O error on '{path}'")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FsError {
    fn from_io(path: PathBuf, source: std::io::Error) -> Self {
        if source.kind() == ErrorKind::NotFound {
            FsError::NotFound { path }
        } else {
            FsError::Io { path, source }
        }
    }
}

/// Reads engine resources by logical path.
pub trait FileSystemService: Send + Sync {
    fn read_text(&self, path: &str) -> Result<String, FsError>;
    fn read_bytes(&self, path: &str) -> Result<Vec<u8>, FsError>;
    fn exists(&self, path: &str) -> bool;
}

/// Local disk implementation.
pub struct LocalFileSystem {
    resolver: Arc<dyn PathResolver>,
}

impl LocalFileSystem {
    pub fn new(resolver: Arc<dyn PathResolver>) -> Self {
        Self { resolver }
    }
}

impl FileSystemService for LocalFileSystem {
    fn read_text(&self, path: &str) -> Result<String, FsError> {
        let resolved = self.resolver.resolve(path);
        tracing::debug!(path, resolved = %resolved.display(), "Reading text file");
        std::fs::read_to_string(&resolved).map_err(|e| FsError::from_io(resolved, e))
    }

    fn read_bytes(&self, path: &str) -> Result<Vec<u8>, FsError> {
        let resolved = self.resolver.resolve(path);
        tracing::debug!(path, resolved = %resolved.display(), "Reading binary file");
        std::fs::read(&resolved).map_err(|e| FsError::from_io(resolved, e))
    }

    fn exists(&self, path: &str) -> bool {
        self.resolver.resolve(path).exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::HostPathResolver;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn reads_relative_to_resolver_root() {
        let tmp = tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("Config")).unwrap();
        fs::write(tmp.path().join("Config/settings.json"), "{}").unwrap();

        let fs_service = LocalFileSystem::new(Arc::new(HostPathResolver::new(tmp.path())));

        assert!(fs_service.exists("Config/settings.json"));
        assert_eq!(fs_service.read_text("Config/settings.json").unwrap(), "{}");
        assert_eq!(fs_service.read_bytes("Config/settings.json").unwrap(), b"{}");
    }

    #[test]
    fn missing_file_is_not_found() {
        let tmp = tempdir().unwrap();
        let fs_service = LocalFileSystem::new(Arc::new(HostPathResolver::new(tmp.path())));

        assert!(!fs_service.exists("nope.json"));
        match fs_service.read_text("nope.json").unwrap_err() {
            FsError::NotFound { path } => assert!(path.ends_with("nope.json")),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn reading_a_directory_is_an_io_error() {
        let tmp = tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("Config")).unwrap();
        let fs_service = LocalFileSystem::new(Arc::new(HostPathResolver::new(tmp.path())));

        assert!(matches!(
            fs_service.read_text("Config"),
            Err(FsError::Io { .. })
        ));
    }
}
