//! AES-256-GCM encryption and decryption for keychain records.
//!
//! Uses AES-256-GCM with:
//! - 256-bit key (the keychain's cipher key)
//! - 96-bit (12 byte) nonce, fresh for every write
//! - 128-bit authentication tag
//! - The domain name as associated data, binding each record to its slot
//!
//! Passwords are padded to a fixed block before encryption so every record
//! has the same ciphertext length regardless of the password it holds.

use crate::crypto::{
    keyring::CipherKey,
    provider::{CryptoProvider, NONCE_LEN, TAG_LEN},
    zero::SecureBuffer,
    CryptoError, Result,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};

/// Longest password (in UTF-8 bytes) a record can hold
pub const MAX_PASSWORD_LENGTH: usize = 64;

/// Size of the padded plaintext: the password, the terminator, then zeros
pub const PADDED_LENGTH: usize = MAX_PASSWORD_LENGTH + 1;

/// Size of every record ciphertext, tag included
pub const RECORD_CIPHERTEXT_LEN: usize = PADDED_LENGTH + TAG_LEN;

const TERMINATOR: u8 = 0x80;

/// One stored record: nonce plus `ciphertext || tag`, both base64 encoded
///
/// The fields stay encoded until the record is read, so a garbled record
/// fails on its own without taking the rest of the store down.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedRecord {
    pub nonce: String,
    pub ciphertext: String,
}

impl EncryptedRecord {
    /// Create a new encrypted record from raw components
    pub fn new(nonce: &[u8], ciphertext: &[u8]) -> Self {
        Self {
            nonce: STANDARD.encode(nonce),
            ciphertext: STANDARD.encode(ciphertext),
        }
    }

    /// Decode the nonce, which must be exactly [`NONCE_LEN`] bytes
    pub fn nonce_bytes(&self) -> Result<[u8; NONCE_LEN]> {
        let bytes = STANDARD
            .decode(&self.nonce)
            .map_err(|e| CryptoError::InvalidNonce(e.to_string()))?;
        let len = bytes.len();
        bytes.try_into().map_err(|_| {
            CryptoError::InvalidNonce(format!("Expected {} bytes, got {}", NONCE_LEN, len))
        })
    }

    /// Decode `ciphertext || tag`
    pub fn ciphertext_bytes(&self) -> Result<Vec<u8>> {
        STANDARD
            .decode(&self.ciphertext)
            .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))
    }
}

/// Pad a password to [`PADDED_LENGTH`] bytes
///
/// Layout: password bytes, `0x80`, then `0x00` up to the block size.
pub fn pad(password: &str) -> Result<SecureBuffer> {
    let bytes = password.as_bytes();
    if bytes.len() > MAX_PASSWORD_LENGTH {
        return Err(CryptoError::PasswordTooLong(MAX_PASSWORD_LENGTH));
    }

    let mut padded = SecureBuffer::with_capacity(PADDED_LENGTH);
    padded.extend_from_slice(bytes);
    padded.extend_from_slice(&[TERMINATOR]);
    padded.resize(PADDED_LENGTH, 0);
    Ok(padded)
}

/// Reverse [`pad`], locating the terminator after the trailing zeros
pub fn unpad(padded: &[u8]) -> Result<String> {
    if padded.len() != PADDED_LENGTH {
        return Err(CryptoError::InvalidPadding(format!(
            "Expected {} bytes, got {}",
            PADDED_LENGTH,
            padded.len()
        )));
    }

    let end = padded
        .iter()
        .rposition(|&b| b != 0)
        .ok_or_else(|| CryptoError::InvalidPadding("Missing terminator".to_string()))?;

    if padded[end] != TERMINATOR {
        return Err(CryptoError::InvalidPadding("Missing terminator".to_string()));
    }

    String::from_utf8(padded[..end].to_vec())
        .map_err(|_| CryptoError::InvalidPadding("Invalid UTF-8".to_string()))
}

/// Encrypt `password` for `domain`
///
/// # Security Notes
/// - A new random nonce is drawn for every call; nonces are never reused
/// - `domain` is authenticated but not encrypted
pub fn encrypt_record(
    provider: &dyn CryptoProvider,
    key: &CipherKey,
    domain: &str,
    password: &str,
) -> Result<EncryptedRecord> {
    let padded = pad(password)?;

    let mut nonce = [0u8; NONCE_LEN];
    provider.fill_random(&mut nonce)?;

    let ciphertext =
        provider.aead_encrypt(key.as_bytes(), &nonce, domain.as_bytes(), padded.as_bytes())?;

    if ciphertext.len() != RECORD_CIPHERTEXT_LEN {
        return Err(CryptoError::EncryptionFailed(format!(
            "Unexpected ciphertext length: {}",
            ciphertext.len()
        )));
    }

    Ok(EncryptedRecord::new(&nonce, &ciphertext))
}

/// Decrypt a record that was stored under `domain`
///
/// # Security
/// - Fails if the record was written for a different domain
/// - Fails on any corrupted, truncated or resized nonce or ciphertext
pub fn decrypt_record(
    provider: &dyn CryptoProvider,
    key: &CipherKey,
    domain: &str,
    record: &EncryptedRecord,
) -> Result<String> {
    let nonce = record.nonce_bytes()?;
    let ciphertext = record.ciphertext_bytes()?;

    if ciphertext.len() != RECORD_CIPHERTEXT_LEN {
        return Err(CryptoError::DecryptionFailed(format!(
            "Unexpected ciphertext length: {}",
            ciphertext.len()
        )));
    }

    let plaintext = SecureBuffer::new(provider.aead_decrypt(
        key.as_bytes(),
        &nonce,
        domain.as_bytes(),
        &ciphertext,
    )?);

    unpad(plaintext.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{DerivedKeys, KdfParams, RustCryptoProvider, MIN_KDF_ITERATIONS};
    use proptest::prelude::*;

    fn cipher_key(provider: &RustCryptoProvider) -> CipherKey {
        let params = KdfParams {
            salt: [3u8; 16],
            iterations: MIN_KDF_ITERATIONS,
        };
        DerivedKeys::derive(provider, b"master", &params)
            .unwrap()
            .cipher_key
    }

    #[test]
    fn test_pad_layout() {
        let padded = pad("abc").unwrap();

        assert_eq!(padded.len(), PADDED_LENGTH);
        assert_eq!(&padded.as_bytes()[..4], b"abc\x80");
        assert!(padded.as_bytes()[4..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_pad_rejects_long_password() {
        let long = "x".repeat(MAX_PASSWORD_LENGTH + 1);
        assert!(matches!(
            pad(&long),
            Err(CryptoError::PasswordTooLong(MAX_PASSWORD_LENGTH))
        ));
        assert!(pad(&"x".repeat(MAX_PASSWORD_LENGTH)).is_ok());
    }

    #[test]
    fn test_encrypt_rejects_long_password() {
        let provider = RustCryptoProvider::new();
        let key = cipher_key(&provider);
        let long = "x".repeat(MAX_PASSWORD_LENGTH + 1);

        assert!(matches!(
            encrypt_record(&provider, &key, "a.com", &long),
            Err(CryptoError::PasswordTooLong(_))
        ));
    }

    #[test]
    fn test_unpad_rejects_garbage() {
        assert!(unpad(&[0u8; PADDED_LENGTH]).is_err());
        assert!(unpad(&[1u8; PADDED_LENGTH]).is_err());
        assert!(unpad(b"abc\x80").is_err());
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let provider = RustCryptoProvider::new();
        let key = cipher_key(&provider);

        let record = encrypt_record(&provider, &key, "example.com", "p@ss1").unwrap();
        let password = decrypt_record(&provider, &key, "example.com", &record).unwrap();

        assert_eq!(password, "p@ss1");
    }

    #[test]
    fn test_different_nonces() {
        let provider = RustCryptoProvider::new();
        let key = cipher_key(&provider);

        let r1 = encrypt_record(&provider, &key, "a.com", "same").unwrap();
        let r2 = encrypt_record(&provider, &key, "a.com", "same").unwrap();

        assert_ne!(r1.nonce, r2.nonce);
        assert_ne!(r1.ciphertext, r2.ciphertext);
    }

    #[test]
    fn test_ciphertext_length_is_constant() {
        let provider = RustCryptoProvider::new();
        let key = cipher_key(&provider);

        for len in [0, 1, 17, 63, MAX_PASSWORD_LENGTH] {
            let record = encrypt_record(&provider, &key, "a.com", &"z".repeat(len)).unwrap();
            assert_eq!(record.ciphertext_bytes().unwrap().len(), RECORD_CIPHERTEXT_LEN);
            assert_eq!(record.nonce_bytes().unwrap().len(), NONCE_LEN);
        }
    }

    #[test]
    fn test_wrong_domain_fails() {
        let provider = RustCryptoProvider::new();
        let key = cipher_key(&provider);

        let record = encrypt_record(&provider, &key, "a.com", "secret").unwrap();

        assert!(matches!(
            decrypt_record(&provider, &key, "b.com", &record),
            Err(CryptoError::AuthenticationFailed)
        ));
    }

    #[test]
    fn test_tampering_detected() {
        let provider = RustCryptoProvider::new();
        let key = cipher_key(&provider);
        let record = encrypt_record(&provider, &key, "a.com", "secret").unwrap();

        let nonce = record.nonce_bytes().unwrap();
        let mut ciphertext = record.ciphertext_bytes().unwrap();

        ciphertext[0] ^= 0xFF;
        let flipped = EncryptedRecord::new(&nonce, &ciphertext);
        assert!(matches!(
            decrypt_record(&provider, &key, "a.com", &flipped),
            Err(CryptoError::AuthenticationFailed)
        ));

        ciphertext.pop();
        let truncated = EncryptedRecord::new(&nonce, &ciphertext);
        assert!(matches!(
            decrypt_record(&provider, &key, "a.com", &truncated),
            Err(CryptoError::DecryptionFailed(_))
        ));

        let short_nonce = EncryptedRecord::new(&nonce[..8], &record.ciphertext_bytes().unwrap());
        assert!(matches!(
            decrypt_record(&provider, &key, "a.com", &short_nonce),
            Err(CryptoError::InvalidNonce(_))
        ));
    }

    #[test]
    fn test_garbled_base64_fails_on_decrypt() {
        let provider = RustCryptoProvider::new();
        let key = cipher_key(&provider);
        let record = encrypt_record(&provider, &key, "a.com", "secret").unwrap();

        let mut bad_nonce = record.clone();
        bad_nonce.nonce.pop();
        assert!(matches!(
            decrypt_record(&provider, &key, "a.com", &bad_nonce),
            Err(CryptoError::InvalidNonce(_))
        ));

        let mut bad_ciphertext = record;
        bad_ciphertext.ciphertext.insert(0, '*');
        assert!(matches!(
            decrypt_record(&provider, &key, "a.com", &bad_ciphertext),
            Err(CryptoError::DecryptionFailed(_))
        ));
    }

    proptest! {
        #[test]
        fn pad_unpad_roundtrip(password in "\\PC{0,16}") {
            prop_assume!(password.len() <= MAX_PASSWORD_LENGTH);
            let padded = pad(&password).unwrap();
            prop_assert_eq!(padded.len(), PADDED_LENGTH);
            prop_assert_eq!(unpad(padded.as_bytes()).unwrap(), password);
        }

        #[test]
        fn pad_keeps_embedded_nul_bytes(prefix in "[a-z]{0,10}", suffix in "[a-z]{0,10}") {
            let password = format!("{}\0{}\0", prefix, suffix);
            let padded = pad(&password).unwrap();
            prop_assert_eq!(unpad(padded.as_bytes()).unwrap(), password);
        }
    }
}
