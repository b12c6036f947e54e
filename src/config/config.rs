use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GridConfig {
    pub frozen: FrozenConfig,
    pub behavior: BehaviorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FrozenConfig {
    /// Columns frozen to the left viewport edge, in display order
    pub left_count: usize,

    /// Columns frozen to the right viewport edge
    pub right_count: usize,

    /// Upper bound an embedding UI should enforce on either side
    pub max_frozen: usize,
}

impl Default for FrozenConfig {
    fn default() -> Self {
        Self {
            left_count: 0,
            right_count: 0,
            max_frozen: 4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Address group headers through hierarchy-node indexing
    pub groups_as_nodes: bool,

    /// Width assigned to columns created without an explicit width
    pub default_column_width: u16,

    /// Persist the layout snapshot automatically on shutdown
    pub auto_save_layout: bool,

    /// Where the layout snapshot lives; defaults next to the config file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout_path: Option<PathBuf>,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            groups_as_nodes: false,
            default_column_width: 15,
            auto_save_layout: true,
            layout_path: None,
        }
    }
}

impl GridConfig {
    /// Load from the default location, falling back to defaults if the
    /// file doesn't exist.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("failed to read config from {}", path.display()))?;
            let config: GridConfig = toml::from_str(&contents)
                .with_context(|| format!("invalid config in {}", path.display()))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save to the default location, creating the directory if needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let contents = toml::to_string_pretty(self)?;
        fs::write(&path, contents)
            .with_context(|| format!("failed to write config to {}", path.display()))?;
        Ok(())
    }

    /// Platform config path: `<config_dir>/slotgrid/config.toml`.
    pub fn config_path() -> Result<PathBuf> {
        let base = dirs::config_dir().context("could not determine config directory")?;
        Ok(base.join("slotgrid").join("config.toml"))
    }

    /// Where the layout snapshot should be persisted.
    pub fn layout_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.behavior.layout_path {
            return Ok(path.clone());
        }
        let base = dirs::config_dir().context("could not determine config directory")?;
        Ok(base.join("slotgrid").join("layout.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_round_trip_through_toml() {
        let config = GridConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: GridConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.frozen.max_frozen, 4);
        assert_eq!(parsed.behavior.default_column_width, 15);
        assert!(!parsed.behavior.groups_as_nodes);
    }

    #[test]
    fn missing_sections_take_defaults() {
        let parsed: GridConfig = toml::from_str("[frozen]\nleft_count = 2\n").unwrap();
        assert_eq!(parsed.frozen.left_count, 2);
        assert_eq!(parsed.frozen.max_frozen, 4);
        assert!(parsed.behavior.auto_save_layout);
    }
}
