//! Crypto capability consumed by the keychain engine.
//!
//! The engine never reaches for an ambient crypto handle. Every primitive it
//! needs goes through a [`CryptoProvider`] passed in at construction, so a
//! different vetted backend (or a test double) can be substituted.

use crate::crypto::{CryptoError, Result};
use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Nonce,
};
use hmac::{Hmac, Mac};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

/// AES-GCM nonce size in bytes (96 bits)
pub const NONCE_LEN: usize = 12;

/// AES-GCM authentication tag size in bytes
pub const TAG_LEN: usize = 16;

/// Output size of every keyed and unkeyed hash used here (SHA-256)
pub const DIGEST_LEN: usize = 32;

type HmacSha256 = Hmac<Sha256>;

/// Primitive operations the keychain is built on.
///
/// Implementations must use a cryptographically secure random source and
/// constant-time primitives. A missing capability is reported as an error;
/// implementations must never degrade to an insecure fallback.
pub trait CryptoProvider: Send + Sync {
    /// Fill `buf` from a cryptographically secure random source.
    fn fill_random(&self, buf: &mut [u8]) -> Result<()>;

    /// PBKDF2-HMAC-SHA256 with a 32 byte output.
    fn pbkdf2_sha256(
        &self,
        password: &[u8],
        salt: &[u8],
        iterations: u32,
    ) -> Result<Zeroizing<[u8; DIGEST_LEN]>>;

    /// HMAC-SHA256 tag of `message` under `key`.
    fn hmac_sha256(&self, key: &[u8], message: &[u8]) -> Result<Zeroizing<[u8; DIGEST_LEN]>>;

    /// Plain SHA-256 digest.
    fn sha256(&self, data: &[u8]) -> [u8; DIGEST_LEN];

    /// AES-256-GCM encryption. The returned buffer is `ciphertext || tag`.
    fn aead_encrypt(
        &self,
        key: &[u8; 32],
        nonce: &[u8; NONCE_LEN],
        aad: &[u8],
        plaintext: &[u8],
    ) -> Result<Vec<u8>>;

    /// AES-256-GCM decryption of `ciphertext || tag`.
    ///
    /// Fails with [`CryptoError::AuthenticationFailed`] if the tag, the key,
    /// the nonce or the associated data do not match.
    fn aead_decrypt(
        &self,
        key: &[u8; 32],
        nonce: &[u8; NONCE_LEN],
        aad: &[u8],
        ciphertext: &[u8],
    ) -> Result<Vec<u8>>;
}

/// Default provider backed by the RustCrypto crates and the OS random source.
#[derive(Debug, Default, Clone, Copy)]
pub struct RustCryptoProvider;

impl RustCryptoProvider {
    pub fn new() -> Self {
        Self
    }
}

impl CryptoProvider for RustCryptoProvider {
    fn fill_random(&self, buf: &mut [u8]) -> Result<()> {
        OsRng
            .try_fill_bytes(buf)
            .map_err(|e| CryptoError::RandomFailed(e.to_string()))
    }

    fn pbkdf2_sha256(
        &self,
        password: &[u8],
        salt: &[u8],
        iterations: u32,
    ) -> Result<Zeroizing<[u8; DIGEST_LEN]>> {
        if iterations == 0 {
            return Err(CryptoError::KdfFailed(
                "Iteration count must be non-zero".to_string(),
            ));
        }

        let mut out = Zeroizing::new([0u8; DIGEST_LEN]);
        pbkdf2::pbkdf2_hmac::<Sha256>(password, salt, iterations, &mut out[..]);
        Ok(out)
    }

    fn hmac_sha256(&self, key: &[u8], message: &[u8]) -> Result<Zeroizing<[u8; DIGEST_LEN]>> {
        let mut mac = <HmacSha256 as Mac>::new_from_slice(key)
            .map_err(|e| CryptoError::KdfFailed(format!("Invalid HMAC key: {}", e)))?;
        mac.update(message);

        let mut out = Zeroizing::new([0u8; DIGEST_LEN]);
        out.copy_from_slice(&mac.finalize().into_bytes());
        Ok(out)
    }

    fn sha256(&self, data: &[u8]) -> [u8; DIGEST_LEN] {
        Sha256::digest(data).into()
    }

    fn aead_encrypt(
        &self,
        key: &[u8; 32],
        nonce: &[u8; NONCE_LEN],
        aad: &[u8],
        plaintext: &[u8],
    ) -> Result<Vec<u8>> {
        let cipher = Aes256Gcm::new(key.into());

        cipher
            .encrypt(
                Nonce::from_slice(nonce),
                Payload {
                    msg: plaintext,
                    aad,
                },
            )
            .map_err(|e| CryptoError::EncryptionFailed(format!("{}", e)))
    }

    fn aead_decrypt(
        &self,
        key: &[u8; 32],
        nonce: &[u8; NONCE_LEN],
        aad: &[u8],
        ciphertext: &[u8],
    ) -> Result<Vec<u8>> {
        if ciphertext.len() < TAG_LEN {
            return Err(CryptoError::DecryptionFailed(
                "Ciphertext too short - missing auth tag".to_string(),
            ));
        }

        let cipher = Aes256Gcm::new(key.into());

        cipher
            .decrypt(
                Nonce::from_slice(nonce),
                Payload {
                    msg: ciphertext,
                    aad,
                },
            )
            .map_err(|_| CryptoError::AuthenticationFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_random_differs() {
        let provider = RustCryptoProvider::new();
        let mut a = [0u8; 16];
        let mut b = [0u8; 16];
        provider.fill_random(&mut a).unwrap();
        provider.fill_random(&mut b).unwrap();

        assert_ne!(a, b);
    }

    #[test]
    fn test_pbkdf2_known_vector() {
        // RFC 7914 section 11, PBKDF2-HMAC-SHA256 with c = 1
        let provider = RustCryptoProvider::new();
        let out = provider.pbkdf2_sha256(b"passwd", b"salt", 1).unwrap();

        assert_eq!(
            out[..8],
            [0x55, 0xac, 0x04, 0x6e, 0x56, 0xe3, 0x08, 0x9f]
        );
    }

    #[test]
    fn test_pbkdf2_zero_iterations_rejected() {
        let provider = RustCryptoProvider::new();
        assert!(provider.pbkdf2_sha256(b"pw", b"salt", 0).is_err());
    }

    #[test]
    fn test_hmac_labels_are_independent() {
        let provider = RustCryptoProvider::new();
        let key = [7u8; 32];

        let a = provider.hmac_sha256(&key, b"hmac-key").unwrap();
        let b = provider.hmac_sha256(&key, b"aes-key").unwrap();
        let c = provider.hmac_sha256(&key, b"hmac-key").unwrap();

        assert_ne!(*a, *b);
        assert_eq!(*a, *c);
    }

    #[test]
    fn test_aead_roundtrip_and_aad_binding() {
        let provider = RustCryptoProvider::new();
        let key = [1u8; 32];
        let nonce = [2u8; NONCE_LEN];

        let ct = provider
            .aead_encrypt(&key, &nonce, b"example.com", b"secret")
            .unwrap();
        assert_eq!(ct.len(), b"secret".len() + TAG_LEN);

        let pt = provider
            .aead_decrypt(&key, &nonce, b"example.com", &ct)
            .unwrap();
        assert_eq!(pt, b"secret");

        assert!(matches!(
            provider.aead_decrypt(&key, &nonce, b"evil.com", &ct),
            Err(CryptoError::AuthenticationFailed)
        ));
    }

    #[test]
    fn test_aead_short_ciphertext_rejected() {
        let provider = RustCryptoProvider::new();
        assert!(provider
            .aead_decrypt(&[0u8; 32], &[0u8; NONCE_LEN], b"", &[0u8; 4])
            .is_err());
    }
}
