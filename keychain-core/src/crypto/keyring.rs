//! Key hierarchy and management.
//!
//! Implements the domain-separated derivation scheme:
//! Master Password → PBKDF2 → Master Key → HMAC("hmac-key")       → Index Key
//!                                       → HMAC("aes-key")        → Cipher Key
//!                                       → HMAC("password-check") → Password Check

use crate::crypto::{
    kdf::{derive_master_key, KdfParams},
    provider::{CryptoProvider, DIGEST_LEN},
    Result,
};
use crate::encoding::base64_bytes;
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use zeroize::ZeroizeOnDrop;

const INDEX_KEY_LABEL: &[u8] = b"hmac-key";
const CIPHER_KEY_LABEL: &[u8] = b"aes-key";
const PASSWORD_CHECK_LABEL: &[u8] = b"password-check";

/// The master key derived from the master password
///
/// Only lives long enough to derive the sub-keys. It is never persisted.
#[derive(ZeroizeOnDrop)]
pub struct MasterKey {
    key: [u8; 32],
}

impl MasterKey {
    /// Create a master key from raw bytes
    pub fn from_bytes(key: [u8; 32]) -> Self {
        Self { key }
    }

    /// Get a reference to the key bytes (use sparingly)
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.key
    }
}

/// HMAC-SHA256 key used to fingerprint domain names
#[derive(ZeroizeOnDrop)]
pub struct IndexKey {
    key: [u8; 32],
}

impl IndexKey {
    /// Compute the deterministic lookup key for `domain`
    pub fn fingerprint(&self, provider: &dyn CryptoProvider, domain: &str) -> Result<Fingerprint> {
        let tag = provider.hmac_sha256(&self.key, domain.as_bytes())?;
        Ok(Fingerprint(STANDARD.encode(tag.as_slice())))
    }
}

/// AES-256-GCM key used to encrypt records
#[derive(ZeroizeOnDrop)]
pub struct CipherKey {
    key: [u8; 32],
}

impl CipherKey {
    /// Get a reference to the key bytes (use sparingly)
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.key
    }
}

/// Public tag that lets a wrong master password be rejected early
#[derive(Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PasswordCheck(#[serde(with = "base64_bytes")] [u8; DIGEST_LEN]);

impl PasswordCheck {
    /// Constant-time comparison against another check value
    pub fn matches(&self, other: &PasswordCheck) -> bool {
        self.0[..].ct_eq(&other.0[..]).into()
    }
}

impl std::fmt::Debug for PasswordCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PasswordCheck(..)")
    }
}

/// Keyed, deterministic identifier of a domain name
///
/// Base64 of the full HMAC-SHA256 tag, so every fingerprint has the same
/// length and orders consistently inside the store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Everything derived from the master password for one keychain
pub struct DerivedKeys {
    pub index_key: IndexKey,
    pub cipher_key: CipherKey,
    pub password_check: PasswordCheck,
}

impl DerivedKeys {
    /// Derive the master key and the three labelled sub-values from it
    ///
    /// The master key is dropped (and zeroized) before this returns.
    pub fn derive(
        provider: &dyn CryptoProvider,
        password: &[u8],
        params: &KdfParams,
    ) -> Result<Self> {
        let master_key = derive_master_key(provider, password, params)?;
        Self::from_master_key(provider, &master_key)
    }

    /// Sign each label under the master key
    pub fn from_master_key(provider: &dyn CryptoProvider, master_key: &MasterKey) -> Result<Self> {
        let index = provider.hmac_sha256(master_key.as_bytes(), INDEX_KEY_LABEL)?;
        let cipher = provider.hmac_sha256(master_key.as_bytes(), CIPHER_KEY_LABEL)?;
        let check = provider.hmac_sha256(master_key.as_bytes(), PASSWORD_CHECK_LABEL)?;

        Ok(Self {
            index_key: IndexKey { key: *index },
            cipher_key: CipherKey { key: *cipher },
            password_check: PasswordCheck(*check),
        })
    }
}
