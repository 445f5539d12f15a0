//! Platform-specific default locations

use std::path::PathBuf;

/// Get the platform-specific data directory for storing the keychain
///
/// Returns:
/// - Windows: %LOCALAPPDATA%\Keychain
/// - macOS: ~/Library/Application Support/Keychain
/// - Linux/Other: ~/.local/share/Keychain
pub fn get_data_dir() -> PathBuf {
    let base = dirs::data_local_dir()
        .or_else(dirs::data_dir)
        .or_else(|| dirs::home_dir().map(|h| h.join(".data")))
        .unwrap_or_else(|| PathBuf::from("."));

    base.join("Keychain")
}

/// Get the platform-specific config directory
pub fn get_config_dir() -> PathBuf {
    let base = dirs::config_dir()
        .or_else(dirs::data_dir)
        .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
        .unwrap_or_else(|| PathBuf::from("."));

    base.join("Keychain")
}

/// Default location of the serialized keychain
pub fn get_default_store_path() -> PathBuf {
    get_data_dir().join("keychain.json")
}

/// Default location of the trusted checksum
///
/// Kept in the config directory, apart from the store itself.
pub fn get_default_checksum_path() -> PathBuf {
    get_config_dir().join("keychain.sha256")
}

/// Default location of the CLI configuration file
pub fn get_default_config_path() -> PathBuf {
    get_config_dir().join("config.toml")
}
