use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::paths::home_dir::resolve_home_dir;

/// Main host configuration with strongly-typed sections.
///
/// Engine settings consumed by bootstrapper plugins do not live here; they are
/// read from the JSON file named by [`HostConfig::settings_file`].
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Host process configuration.
    pub host: HostConfig,
    /// Dependency container behaviour.
    #[serde(default)]
    pub container: ContainerConfig,
    /// Bootstrap phase tuning.
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
    /// Logging configuration (optional, uses defaults if None).
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HostConfig {
    pub home_dir: String, // will be normalized to absolute path
    /// Root for relative engine paths; empty means the working directory.
    #[serde(default)]
    pub data_dir: String,
    pub settings_file: String,
    pub frame_rate: u32,
    #[serde(default = "default_trace_capacity")]
    pub trace_capacity: usize,
}

/// What the container does when a capability is bound twice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Last registration wins; a warning is recorded.
    #[default]
    Overwrite,
    /// Second registration is rejected with an error.
    Reject,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ContainerConfig {
    #[serde(default)]
    pub duplicate_bindings: DuplicatePolicy,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BootstrapConfig {
    /// Plugins running longer than this are reported; 0 disables the check.
    #[serde(default = "default_slow_plugin_warn_ms")]
    pub slow_plugin_warn_ms: u64,
}

/// Logging configuration - maps subsystem names to their logging settings.
/// Key "default" is the catch-all for logs that don't match explicit subsystems.
pub type LoggingConfig = HashMap<String, Section>;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Section {
    pub console_level: String, // "info", "debug", "error", "off"
    #[serde(default)]
    pub file: String, // "logs/mapkit.log"
    #[serde(default)]
    pub file_level: String,
    pub max_age_days: Option<u32>,
    #[serde(default)]
    pub max_backups: Option<usize>, // How many files to keep
    #[serde(default)]
    pub max_size_mb: Option<u64>, // Max size of the file in MB
}

const fn default_trace_capacity() -> usize {
    256
}

const fn default_slow_plugin_warn_ms() -> u64 {
    500
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            // Empty => use platform default resolved by resolve_home_dir():
            // Windows: %APPDATA%/.mapkit
            // Unix/macOS: $HOME/.mapkit
            home_dir: String::new(),
            data_dir: String::new(),
            settings_file: "Config/settings.json".to_string(),
            frame_rate: 30,
            trace_capacity: default_trace_capacity(),
        }
    }
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            slow_plugin_warn_ms: default_slow_plugin_warn_ms(),
        }
    }
}

/// Create a default logging configuration.
pub fn default_logging_config() -> LoggingConfig {
    let mut logging = HashMap::new();
    logging.insert(
        "default".to_string(),
        Section {
            console_level: "info".to_string(),
            file: "logs/mapkit.log".to_string(),
            file_level: "debug".to_string(),
            max_age_days: Some(7),
            max_backups: Some(3),
            max_size_mb: Some(100),
        },
    );
    logging
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: HostConfig::default(),
            container: ContainerConfig::default(),
            bootstrap: BootstrapConfig::default(),
            logging: Some(default_logging_config()),
        }
    }
}

impl AppConfig {
    /// Load configuration with layered loading: defaults → YAML file → environment variables.
    /// Also normalizes `host.home_dir` into an absolute path and creates the directory.
    pub fn load_layered<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        use figment::{
            providers::{Env, Format, Serialized, Yaml},
            Figment,
        };

        // Logging stays None unless explicitly provided by YAML/ENV.
        let base = AppConfig {
            logging: None,
            ..AppConfig::default()
        };

        let figment = Figment::new()
            .merge(Serialized::defaults(base))
            .merge(Yaml::file(config_path.as_ref()))
            // Example: MAPKIT__HOST__FRAME_RATE=60 maps to host.frame_rate
            .merge(Env::prefixed("MAPKIT__").split("__"));

        let mut config: AppConfig = figment
            .extract()
            .with_context(|| "Failed to extract config from figment".to_string())?;

        normalize_home_dir_inplace(&mut config.host).context("Failed to resolve host.home_dir")?;

        Ok(config)
    }

    /// Load configuration from file or create with default values.
    pub fn load_or_default<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_layered(path),
            None => {
                let mut c = Self::default();
                normalize_home_dir_inplace(&mut c.host)
                    .context("Failed to resolve host.home_dir (defaults)")?;
                Ok(c)
            }
        }
    }

    /// Serialize configuration to YAML.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize config to YAML")
    }

    /// Apply overrides from command line arguments.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(settings) = &args.settings {
            self.host.settings_file = settings.clone();
        }
        if let Some(frame_rate) = args.frame_rate {
            self.host.frame_rate = frame_rate;
        }

        // Set logging level based on verbose flags for "default" section.
        let logging = self.logging.get_or_insert_with(default_logging_config);
        if let Some(default_section) = logging.get_mut("default") {
            default_section.console_level = match args.verbose {
                0 => default_section.console_level.clone(), // keep
                1 => "debug".to_string(),
                _ => "trace".to_string(),
            };
        }
    }

    /// Directory that relative engine paths are resolved against.
    pub fn data_dir(&self) -> PathBuf {
        if self.host.data_dir.trim().is_empty() {
            PathBuf::from(".")
        } else {
            PathBuf::from(&self.host.data_dir)
        }
    }
}

/// Command line arguments structure.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub config: Option<String>,
    pub settings: Option<String>,
    pub frame_rate: Option<u32>,
    pub print_config: bool,
    pub verbose: u8,
}

const fn default_subdir() -> &'static str {
    ".mapkit"
}

/// Normalize `host.home_dir` using `resolve_home_dir` and store the absolute path back.
fn normalize_home_dir_inplace(host: &mut HostConfig) -> Result<()> {
    // Treat empty string as "not provided" => None.
    let opt = if host.home_dir.trim().is_empty() {
        None
    } else {
        Some(host.home_dir.clone())
    };

    let resolved: PathBuf = resolve_home_dir(opt, default_subdir(), /*create*/ true)
        .context("home_dir normalization failed")?;

    host.home_dir = resolved.to_string_lossy().to_string();
    Ok(())
}

#[cfg(test)]
mod tests;
