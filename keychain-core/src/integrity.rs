//! Serialization of the store and whole-store integrity checking.
//!
//! The representation is canonical JSON: struct fields in declaration order,
//! records ordered by fingerprint, bytes as base64. Encoding an unchanged
//! store always yields the same string, so its SHA-256 checksum is stable.
//!
//! The checksum is handed to the caller to persist out of band. On load it is
//! compared before anything in the representation is parsed.

use crate::crypto::CryptoProvider;
use crate::store::{Store, FORMAT_VERSION};
use crate::{KeychainError, Result};
use base64::{engine::general_purpose::STANDARD, Engine};
use subtle::ConstantTimeEq;
use tracing::warn;

/// Serialize `store` into its canonical textual representation
pub fn encode(store: &Store) -> Result<String> {
    serde_json::to_string(store)
        .map_err(|e| KeychainError::MalformedRepresentation(e.to_string()))
}

/// Parse a representation produced by [`encode`]
///
/// Callers must run [`verify_checksum`] first.
pub fn decode(representation: &str) -> Result<Store> {
    let store: Store = serde_json::from_str(representation)
        .map_err(|e| KeychainError::MalformedRepresentation(e.to_string()))?;

    if store.version != FORMAT_VERSION {
        return Err(KeychainError::UnsupportedVersion(store.version));
    }

    Ok(store)
}

/// Base64 SHA-256 of the representation
pub fn checksum(provider: &dyn CryptoProvider, representation: &str) -> String {
    STANDARD.encode(provider.sha256(representation.as_bytes()))
}

/// Compare the representation's checksum against the trusted value
pub fn verify_checksum(
    provider: &dyn CryptoProvider,
    representation: &str,
    trusted_checksum: &str,
) -> Result<()> {
    let actual = checksum(provider, representation);

    if bool::from(actual.as_bytes().ct_eq(trusted_checksum.as_bytes())) {
        Ok(())
    } else {
        warn!("Checksum mismatch on load; representation rejected");
        Err(KeychainError::RollbackOrTamper)
    }
}
