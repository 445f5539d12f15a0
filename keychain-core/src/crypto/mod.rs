//! Cryptographic building blocks for the keychain.
//!
//! This module provides:
//! - PBKDF2-HMAC-SHA256 master key derivation
//! - Domain-separated sub-key derivation (index key, cipher key, password check)
//! - AES-256-GCM record encryption with length-hiding padding
//! - The injectable crypto capability and its RustCrypto implementation
//! - Zeroization utilities

pub mod cipher;
pub mod kdf;
pub mod keyring;
pub mod provider;
pub mod zero;

pub use cipher::{decrypt_record, encrypt_record, EncryptedRecord, MAX_PASSWORD_LENGTH};
pub use kdf::{derive_master_key, KdfParams, DEFAULT_KDF_ITERATIONS, MIN_KDF_ITERATIONS};
pub use keyring::{CipherKey, DerivedKeys, Fingerprint, IndexKey, MasterKey, PasswordCheck};
pub use provider::{CryptoProvider, RustCryptoProvider};
pub use zero::SecureBuffer;

use thiserror::Error;

/// Errors that can occur in cryptographic operations
#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Key derivation failed: {0}")]
    KdfFailed(String),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Invalid nonce: {0}")]
    InvalidNonce(String),

    #[error("Password exceeds maximum length of {0} bytes")]
    PasswordTooLong(usize),

    #[error("Invalid padding: {0}")]
    InvalidPadding(String),

    #[error("Authentication failed - data may have been tampered with")]
    AuthenticationFailed,

    #[error("Random number generation failed: {0}")]
    RandomFailed(String),
}

/// Result type for crypto operations
pub type Result<T> = std::result::Result<T, CryptoError>;
