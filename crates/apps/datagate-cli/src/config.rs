//! CLI configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use datagate_engine::EngineConfig;
use datagate_store::{database_path, default_data_dir};

use crate::error::{CliError, CliResult};

/// Name of the configuration file inside the data directory.
pub const CONFIG_FILE: &str = "config.toml";

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "DATAGATE_DATA_DIR";

/// CLI configuration loaded from TOML.
///
/// The `engine` section is not used by the CLI itself; it is the same
/// file a service embedding the engine reads, so `init` writes it out
/// with defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Engine configuration.
    pub engine: EngineConfig,
}

impl CliConfig {
    /// Load configuration from a file, falling back to defaults when the
    /// file does not exist.
    pub fn load(path: &Path) -> CliResult<Self> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str(&contents)?
        } else {
            Self::default()
        };

        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            config.storage.data_dir = PathBuf::from(dir);
        }

        config
            .engine
            .validate()
            .map_err(|e| CliError::config(e.to_string()))?;
        Ok(config)
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> CliResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)
            .map_err(|e| CliError::config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Path of the escrow database.
    pub fn database_path(&self) -> PathBuf {
        database_path(&self.storage.data_dir)
    }
}

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the escrow database.
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Get the default configuration file path.
pub fn default_config_path() -> PathBuf {
    default_data_dir().join(CONFIG_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = CliConfig::load(&temp_dir.path().join("absent.toml")).unwrap();
        assert_eq!(
            config.engine.grant_duration_ms(),
            EngineConfig::default().grant_duration_ms()
        );
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join(CONFIG_FILE);

        let mut config = CliConfig::default();
        config.storage.data_dir = temp_dir.path().join("data");
        config.engine = config.engine.with_grant_duration(Duration::from_secs(3600));
        config.save(&path).unwrap();

        let loaded = CliConfig::load(&path).unwrap();
        assert_eq!(loaded.engine.grant_duration_ms(), 3_600_000);
        if std::env::var(DATA_DIR_ENV).is_err() {
            assert_eq!(loaded.storage.data_dir, temp_dir.path().join("data"));
        }
    }

    #[test]
    fn test_partial_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[engine.grant_retry]\nbatch_size = 7\n").unwrap();

        let config = CliConfig::load(&path).unwrap();
        assert_eq!(config.engine.grant_retry.batch_size, 7);
    }

    #[test]
    fn test_invalid_engine_section_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[engine]\ngrant_duration = 0\n").unwrap();

        let err = CliConfig::load(&path).unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }

    #[test]
    fn test_malformed_toml() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "storage = [").unwrap();

        assert!(matches!(CliConfig::load(&path), Err(CliError::Toml(_))));
    }
}
