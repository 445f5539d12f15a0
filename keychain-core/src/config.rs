//! Keychain configuration.

use crate::crypto::{DEFAULT_KDF_ITERATIONS, MIN_KDF_ITERATIONS};
use crate::{KeychainError, Result};
use serde::{Deserialize, Serialize};

/// Settings applied when a new keychain is created
///
/// Loaded keychains always use the parameters recorded in their
/// representation, so changing these never breaks existing stores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeychainConfig {
    /// PBKDF2 iteration count for new keychains
    pub kdf_iterations: u32,
}

impl Default for KeychainConfig {
    fn default() -> Self {
        Self {
            kdf_iterations: DEFAULT_KDF_ITERATIONS,
        }
    }
}

impl KeychainConfig {
    pub fn validate(&self) -> Result<()> {
        if self.kdf_iterations < MIN_KDF_ITERATIONS {
            return Err(KeychainError::InvalidArgument(format!(
                "kdf_iterations must be at least {}",
                MIN_KDF_ITERATIONS
            )));
        }
        Ok(())
    }
}
