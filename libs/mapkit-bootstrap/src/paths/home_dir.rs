use std::{
    env, fs,
    path::{Path, PathBuf},
};

/// Errors for resolving the home directory
#[derive(Debug, thiserror::Error)]
pub enum HomeDirError {
    #[error("HOME environment variable is not set")]
    HomeMissing,
    #[error("APPDATA environment variable is not set")]
    AppDataMissing,
    #[error("home_dir must be an absolute path on Windows: {0}")]
    WindowsAbsoluteRequired(String),
    #[error("home_dir must be an absolute path (after ~ expansion): {0}")]
    AbsoluteRequired(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Normalize and resolve the host home directory (logs and other per-user state).
///
/// - A configured value may start with `~`, which expands to the user's home
///   (`$HOME`, or `%USERPROFILE%` on Windows). The result must be absolute.
/// - Without a configured value the platform default is used:
///   `%APPDATA%/<default_subdir>` on Windows, `$HOME/<default_subdir>` elsewhere.
///
/// If `create` is true, the directory is created if missing.
pub fn resolve_home_dir(
    config_home: Option<String>,
    default_subdir: &str,
    create: bool,
) -> Result<PathBuf, HomeDirError> {
    let path = match config_home {
        Some(raw) => {
            let expanded = expand_tilde(&raw)?;
            if !expanded.is_absolute() {
                return Err(not_absolute(raw, &expanded));
            }
            expanded
        }
        None => platform_default_root()?.join(default_subdir),
    };

    if create {
        fs::create_dir_all(&path)?;
    }
    Ok(path)
}

fn expand_tilde(raw: &str) -> Result<PathBuf, HomeDirError> {
    let Some(rest) = raw.strip_prefix('~') else {
        return Ok(PathBuf::from(raw));
    };
    // "~user" forms are not supported; anything after '~' is joined to the user home.
    let rest = rest.trim_start_matches(['/', '\\']);
    let home = user_home()?;
    Ok(if rest.is_empty() {
        home
    } else {
        Path::new(&home).join(rest)
    })
}

#[cfg(target_os = "windows")]
fn user_home() -> Result<PathBuf, HomeDirError> {
    env::var("USERPROFILE")
        .or_else(|_| env::var("HOME"))
        .map(PathBuf::from)
        .map_err(|_| HomeDirError::HomeMissing)
}

#[cfg(not(target_os = "windows"))]
fn user_home() -> Result<PathBuf, HomeDirError> {
    env::var("HOME")
        .map(PathBuf::from)
        .map_err(|_| HomeDirError::HomeMissing)
}

#[cfg(target_os = "windows")]
fn platform_default_root() -> Result<PathBuf, HomeDirError> {
    env::var("APPDATA")
        .map(PathBuf::from)
        .map_err(|_| HomeDirError::AppDataMissing)
}

#[cfg(not(target_os = "windows"))]
fn platform_default_root() -> Result<PathBuf, HomeDirError> {
    user_home()
}

#[cfg(target_os = "windows")]
fn not_absolute(raw: String, _expanded: &Path) -> HomeDirError {
    HomeDirError::WindowsAbsoluteRequired(raw)
}

#[cfg(not(target_os = "windows"))]
fn not_absolute(_raw: String, expanded: &Path) -> HomeDirError {
    HomeDirError::AbsoluteRequired(expanded.to_string_lossy().into())
}
