//! Configuration loaded from `ramsift.toml`.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use ramsift_core::SearchConfig;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub search: SearchConfig,
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Candidates printed by `list` and `scan` when no limit is given
    pub list_limit: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self { list_limit: 20 }
    }
}

impl CliConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Load `path`, falling back to defaults when it is missing or invalid
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => {
                info!("Loaded config from {:?}", path);
                config
            }
            Err(e) => {
                warn!("Failed to load config: {:#}, using defaults", e);
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_partial_config() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[search]\ngroup_span = 16\n\n[display]\nlist_limit = 5").unwrap();

        let config = CliConfig::load(file.path()).unwrap();
        assert_eq!(config.search.group_span, 16);
        assert_eq!(config.search.max_block_size, ramsift_core::MAX_BLOCK_SIZE);
        assert_eq!(config.display.list_limit, 5);
    }

    #[test]
    fn test_load_empty_config() {
        let file = NamedTempFile::new().unwrap();
        assert_eq!(CliConfig::load(file.path()).unwrap(), CliConfig::default());
    }

    #[test]
    fn test_load_or_default_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let config = CliConfig::load_or_default(&dir.path().join("missing.toml"));
        assert_eq!(config, CliConfig::default());

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[display]\nlist_limit = \"many\"").unwrap();
        assert_eq!(CliConfig::load_or_default(file.path()), CliConfig::default());
    }
}
