//! PBKDF2 key derivation function for master password processing.
//!
//! Uses PBKDF2-HMAC-SHA256 with:
//! - Iterations: 100,000 by default (minimum 1,000)
//! - Output length: 32 bytes (256 bits)
//! - Salt length: 16 bytes, drawn once per keychain

use crate::crypto::{keyring::MasterKey, provider::CryptoProvider, CryptoError, Result};
use crate::encoding::base64_bytes;
use serde::{Deserialize, Serialize};

/// Salt length in bytes
pub const SALT_LEN: usize = 16;

/// Iteration count used for new keychains
pub const DEFAULT_KDF_ITERATIONS: u32 = 100_000;

/// Lowest iteration count accepted on `init` or `load`
pub const MIN_KDF_ITERATIONS: u32 = 1_000;

/// Parameters for PBKDF2 key derivation
///
/// Stored in the clear inside the serialized keychain so the same master key
/// can be re-derived on load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// Salt for key derivation (16 bytes)
    #[serde(with = "base64_bytes")]
    pub salt: [u8; SALT_LEN],

    /// PBKDF2 iteration count
    pub iterations: u32,
}

impl KdfParams {
    /// Create parameters with a fresh random salt
    pub fn generate(provider: &dyn CryptoProvider, iterations: u32) -> Result<Self> {
        let mut salt = [0u8; SALT_LEN];
        provider.fill_random(&mut salt)?;

        let params = Self { salt, iterations };
        params.validate()?;
        Ok(params)
    }

    /// Verify that parameters are within acceptable ranges
    pub fn validate(&self) -> Result<()> {
        if self.iterations < MIN_KDF_ITERATIONS {
            return Err(CryptoError::KdfFailed(format!(
                "Iteration count too low (minimum: {})",
                MIN_KDF_ITERATIONS
            )));
        }
        Ok(())
    }
}

/// Derive a master key from a password using PBKDF2-HMAC-SHA256
///
/// # Arguments
/// * `provider` - Crypto capability performing the derivation
/// * `password` - The master password as UTF-8 bytes
/// * `params` - KDF parameters (salt, iterations)
pub fn derive_master_key(
    provider: &dyn CryptoProvider,
    password: &[u8],
    params: &KdfParams,
) -> Result<MasterKey> {
    params.validate()?;

    let key = provider.pbkdf2_sha256(password, &params.salt, params.iterations)?;
    Ok(MasterKey::from_bytes(*key))
}
