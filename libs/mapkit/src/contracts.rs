use std::sync::Arc;

use crate::container::Container;

/// Unit of startup logic run against the container.
///
/// Plugins run once, in registration order, on the bootstrap thread. A plugin
/// may resolve capabilities registered by earlier plugins and register new
/// ones for later plugins. Returning `Ok(false)` declines the bootstrap
/// without an error and still stops the sequence.
pub trait BootstrapperPlugin: Send + Sync + 'static {
    fn run(&self, container: &Container) -> anyhow::Result<bool>;
}

impl<F> BootstrapperPlugin for F
where
    F: Fn(&Container) -> anyhow::Result<bool> + Send + Sync + 'static,
{
    fn run(&self, container: &Container) -> anyhow::Result<bool> {
        self(container)
    }
}

/// A plugin together with the name used in diagnostics.
#[derive(Clone)]
pub struct PluginDescriptor {
    pub name: &'static str,
    pub plugin: Arc<dyn BootstrapperPlugin>,
}

impl PluginDescriptor {
    pub fn new(name: &'static str, plugin: Arc<dyn BootstrapperPlugin>) -> Self {
        Self { name, plugin }
    }
}

impl std::fmt::Debug for PluginDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginDescriptor")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
