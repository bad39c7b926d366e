use serde::{Deserialize, Serialize};

/// Settings read from the `demo` section of the settings file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DemoConfig {
    /// Also report every position update, not only tile events.
    #[serde(default)]
    pub trace_positions: bool,
}
