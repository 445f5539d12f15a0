//! Password keychain core library
//!
//! Derives keys from one master password, encrypts `(domain, password)`
//! records, and produces a serialized representation plus checksum that
//! untrusted storage can hold. Loading detects a wrong master password,
//! rollback to an older representation, and tampered or swapped records.

pub mod config;
pub mod crypto;
mod encoding;
pub mod integrity;
pub mod keychain;
pub mod store;

pub use config::KeychainConfig;
pub use crypto::{
    CryptoError, CryptoProvider, EncryptedRecord, Fingerprint, KdfParams, RustCryptoProvider,
    DEFAULT_KDF_ITERATIONS, MAX_PASSWORD_LENGTH, MIN_KDF_ITERATIONS,
};
pub use keychain::{Dump, Keychain};
pub use store::{Store, FORMAT_VERSION};

use thiserror::Error;

/// Result type for keychain operations
pub type Result<T> = std::result::Result<T, KeychainError>;

/// Error type for keychain operations
///
/// Messages never include passwords, domain names or key material.
#[derive(Error, Debug)]
pub enum KeychainError {
    #[error("Invalid master password")]
    InvalidPassword,

    #[error("Checksum mismatch - keychain was rolled back or tampered with")]
    RollbackOrTamper,

    #[error("Tampering detected - stored record failed authentication")]
    TamperingDetected,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Malformed representation: {0}")]
    MalformedRepresentation(String),

    #[error("Unsupported representation version: {0}")]
    UnsupportedVersion(u32),

    #[error("Crypto error: {0}")]
    Crypto(CryptoError),
}

impl From<CryptoError> for KeychainError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::PasswordTooLong(_) => KeychainError::InvalidArgument(err.to_string()),
            other => KeychainError::Crypto(other),
        }
    }
}
