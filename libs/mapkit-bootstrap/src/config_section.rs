//! Engine settings file access.
//!
//! The settings file is a single JSON document whose schema belongs to the
//! subsystems that read it. Keys are `/`-separated paths (`tile/size`), and a
//! [`ConfigSection`] can be narrowed to a sub-object so each bootstrapper plugin
//! only sees its own part of the document.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::fs::{FileSystemService, FsError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read settings file")]
    Read(#[from] FsError),
    #[error("malformed settings file '{origin}'")]
    Parse {
        origin: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("settings file '{origin}' must contain a JSON object at the top level")]
    NotAnObject { origin: String },
    #[error("invalid value for setting '{key}'")]
    InvalidValue {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("missing required setting '{key}'")]
    Missing { key: String },
}

/// A view into the settings document rooted at some key path.
#[derive(Debug, Clone)]
pub struct ConfigSection {
    root: Arc<Value>,
    /// Key path of this view, without leading or trailing '/'. Empty for the root.
    prefix: String,
}

impl ConfigSection {
    /// Load and parse the settings file at `path` through the file-system service.
    pub fn load(path: &str, fs: &dyn FileSystemService) -> Result<Self, ConfigError> {
        let text = fs.read_text(path)?;
        let section = Self::parse(path, &text)?;
        tracing::info!(path, keys = ?section.keys(), "Settings loaded");
        Ok(section)
    }

    /// Parse settings from text. `origin` only appears in error messages.
    pub fn parse(origin: &str, text: &str) -> Result<Self, ConfigError> {
        let value: Value = serde_json::from_str(text).map_err(|source| ConfigError::Parse {
            origin: origin.to_string(),
            source,
        })?;
        if !value.is_object() {
            return Err(ConfigError::NotAnObject {
                origin: origin.to_string(),
            });
        }
        Ok(Self::from_value(value))
    }

    pub fn from_value(value: Value) -> Self {
        Self {
            root: Arc::new(value),
            prefix: String::new(),
        }
    }

    /// Full key path of this section (empty for the document root).
    pub fn path(&self) -> &str {
        &self.prefix
    }

    /// Narrow the view to a nested object. Returns `None` when the key is
    /// absent or does not hold an object.
    pub fn section(&self, key: &str) -> Option<ConfigSection> {
        let full = self.full_key(key);
        match self.root.pointer(&to_pointer(&full)) {
            Some(Value::Object(_)) => Some(ConfigSection {
                root: Arc::clone(&self.root),
                prefix: full,
            }),
            _ => None,
        }
    }

    /// Keys directly under this section, sorted.
    pub fn keys(&self) -> Vec<String> {
        match self.node() {
            Some(Value::Object(map)) => map.keys().cloned().collect(),
            _ => Vec::new(),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.raw(key).is_some()
    }

    /// Typed lookup; `Ok(None)` when the key is absent or `null`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        match self.raw(key) {
            None | Some(Value::Null) => Ok(None),
            Some(v) => serde_json::from_value(v.clone())
                .map(Some)
                .map_err(|source| ConfigError::InvalidValue {
                    key: self.full_key(key),
                    source,
                }),
        }
    }

    /// Typed lookup that fails when the key is absent.
    pub fn require<T: DeserializeOwned>(&self, key: &str) -> Result<T, ConfigError> {
        self.get(key)?.ok_or_else(|| ConfigError::Missing {
            key: self.full_key(key),
        })
    }

    /// Typed lookup falling back to `default` when absent; malformed values still fail.
    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> Result<T, ConfigError> {
        Ok(self.get(key)?.unwrap_or(default))
    }

    pub fn get_string(&self, key: &str, default: &str) -> String {
        self.raw(key)
            .and_then(Value::as_str)
            .unwrap_or(default)
            .to_string()
    }

    pub fn get_f64(&self, key: &str, default: f64) -> f64 {
        self.raw(key).and_then(Value::as_f64).unwrap_or(default)
    }

    pub fn get_i64(&self, key: &str, default: i64) -> i64 {
        self.raw(key).and_then(Value::as_i64).unwrap_or(default)
    }

    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.raw(key).and_then(Value::as_bool).unwrap_or(default)
    }

    fn node(&self) -> Option<&Value> {
        self.root.pointer(&to_pointer(&self.prefix))
    }

    fn raw(&self, key: &str) -> Option<&Value> {
        self.root.pointer(&to_pointer(&self.full_key(key)))
    }

    fn full_key(&self, key: &str) -> String {
        let key = key.trim_matches('/');
        match (self.prefix.is_empty(), key.is_empty()) {
            (true, _) => key.to_string(),
            (false, true) => self.prefix.clone(),
            (false, false) => format!("{}/{}", self.prefix, key),
        }
    }
}

/// Convert a `/`-separated key path into an RFC 6901 JSON pointer.
fn to_pointer(key: &str) -> String {
    if key.is_empty() {
        return String::new();
    }
    key.split('/')
        .filter(|s| !s.is_empty())
        .map(|segment| format!("/{}", segment.replace('~', "~0")))
        .collect()
}
