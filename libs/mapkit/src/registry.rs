use std::collections::HashSet;
use std::sync::Arc;

use thiserror::Error;

use crate::contracts::{BootstrapperPlugin, PluginDescriptor};

/// The final, ordered plugin list handed to the runner.
pub struct PluginRegistry {
    plugins: Vec<PluginDescriptor>, // registration order
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("plugins", &self.names())
            .finish()
    }
}

impl PluginRegistry {
    pub fn builder() -> PluginRegistryBuilder {
        PluginRegistryBuilder::default()
    }

    pub fn plugins(&self) -> &[PluginDescriptor] {
        &self.plugins
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.plugins.iter().map(|p| p.name).collect()
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn BootstrapperPlugin>> {
        self.plugins
            .iter()
            .find(|p| p.name == name)
            .map(|p| Arc::clone(&p.plugin))
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

/// Collects plugins in the order the host declares them.
/// Names must be unique; violations are reported together at build time.
#[derive(Default)]
pub struct PluginRegistryBuilder {
    plugins: Vec<PluginDescriptor>,
    seen: HashSet<&'static str>,
    errors: Vec<String>,
}

impl PluginRegistryBuilder {
    pub fn register(&mut self, name: &'static str, plugin: Arc<dyn BootstrapperPlugin>) -> &mut Self {
        if name.trim().is_empty() {
            self.errors
                .push(format!("Plugin #{} has an empty name", self.plugins.len() + 1));
            return self;
        }
        if !self.seen.insert(name) {
            self.errors
                .push(format!("Plugin '{name}' is already registered"));
            return self;
        }
        self.plugins.push(PluginDescriptor::new(name, plugin));
        self
    }

    pub fn build(self) -> Result<PluginRegistry, RegistryError> {
        if !self.errors.is_empty() {
            return Err(RegistryError::InvalidRegistryConfiguration {
                errors: self.errors,
            });
        }

        tracing::info!(
            plugins = ?self.plugins.iter().map(|p| p.name).collect::<Vec<_>>(),
            "Bootstrapper plugin order resolved"
        );

        Ok(PluginRegistry {
            plugins: self.plugins,
        })
    }
}

/// Structured errors for the plugin registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("invalid plugin registry configuration:\n{errors:#?}")]
    InvalidRegistryConfiguration { errors: Vec<String> },
}
