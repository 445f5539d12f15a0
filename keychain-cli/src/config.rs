//! CLI configuration.

use crate::platform::{get_default_checksum_path, get_default_store_path};
use anyhow::Context;
use keychain_core::KeychainConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::Level;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub store_path: PathBuf,
    pub checksum_path: PathBuf,
    pub log_level: String,
    pub keychain: KeychainConfig,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            store_path: get_default_store_path(),
            checksum_path: get_default_checksum_path(),
            log_level: "info".to_string(),
            keychain: KeychainConfig::default(),
        }
    }
}

impl CliConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        Ok(config)
    }

    /// Load `path` if it exists, otherwise fall back to defaults
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn log_level(&self) -> anyhow::Result<Level> {
        self.log_level
            .parse()
            .map_err(|_| anyhow::anyhow!("Unknown log level: {}", self.log_level))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = CliConfig::load_or_default(&dir.path().join("absent.toml")).unwrap();

        assert_eq!(config.log_level, "info");
        assert_eq!(config.keychain, KeychainConfig::default());
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "store_path = \"/tmp/kc.json\"\nlog_level = \"debug\"\n\n[keychain]\nkdf_iterations = 2000"
        )
        .unwrap();

        let config = CliConfig::load(file.path()).unwrap();

        assert_eq!(config.store_path, PathBuf::from("/tmp/kc.json"));
        assert_eq!(config.checksum_path, get_default_checksum_path());
        assert_eq!(config.keychain.kdf_iterations, 2000);
        assert_eq!(config.log_level().unwrap(), Level::DEBUG);
    }

    #[test]
    fn test_invalid_log_level() {
        let config = CliConfig {
            log_level: "chatty".to_string(),
            ..CliConfig::default()
        };
        assert!(config.log_level().is_err());
    }
}
