use serde::{Deserialize, Serialize};

/// Settings read from the `scene` section of the settings file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SceneConfig {
    /// Tiles kept in the scene before the oldest one is evicted.
    #[serde(default = "default_max_tiles")]
    pub max_tiles: usize,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            max_tiles: default_max_tiles(),
        }
    }
}

fn default_max_tiles() -> usize {
    9
}
