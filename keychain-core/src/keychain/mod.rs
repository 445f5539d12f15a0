//! Keychain façade - coordinates key derivation, the record codec and the store


use crate::{
    config::KeychainConfig,
    crypto::{
        decrypt_record, encrypt_record, CryptoProvider, DerivedKeys, KdfParams,
        RustCryptoProvider, MAX_PASSWORD_LENGTH,
    },
    integrity,
    store::Store,
    KeychainError, Result,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Serialized keychain plus the checksum the caller must keep separately
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dump {
    pub representation: String,
    pub checksum: String,
}

/// An unlocked keychain
///
/// Holding an instance is the unlocked state; dropping it locks the keychain
/// and zeroizes the derived keys. Mutating operations take `&mut self`, so
/// callers sharing an instance across threads must wrap it in a `Mutex`.
pub struct Keychain {
    store: Store,
    keys: DerivedKeys,
    provider: Arc<dyn CryptoProvider>,
}

impl Keychain {
    /// Create an empty keychain protected by `password`
    pub fn init(password: &str) -> Result<Self> {
        Self::init_with(
            password,
            &KeychainConfig::default(),
            Arc::new(RustCryptoProvider::new()),
        )
    }

    /// Create an empty keychain with explicit settings and crypto provider
    pub fn init_with(
        password: &str,
        config: &KeychainConfig,
        provider: Arc<dyn CryptoProvider>,
    ) -> Result<Self> {
        config.validate()?;

        let kdf = KdfParams::generate(provider.as_ref(), config.kdf_iterations)?;
        let keys = DerivedKeys::derive(provider.as_ref(), password.as_bytes(), &kdf)?;
        let store = Store::new(kdf, keys.password_check.clone());

        info!(iterations = store.kdf.iterations, "Keychain initialized");

        Ok(Self {
            store,
            keys,
            provider,
        })
    }

    /// Reopen a keychain from a representation produced by [`Keychain::dump`]
    ///
    /// `trusted_checksum` must come from a channel the storage medium cannot
    /// roll back together with the representation.
    pub fn load(password: &str, representation: &str, trusted_checksum: &str) -> Result<Self> {
        Self::load_with(
            password,
            representation,
            trusted_checksum,
            Arc::new(RustCryptoProvider::new()),
        )
    }

    /// Reopen a keychain using an explicit crypto provider
    ///
    /// Order of checks: checksum, parse, version, KDF parameters, then the
    /// password check. No record is decrypted here.
    pub fn load_with(
        password: &str,
        representation: &str,
        trusted_checksum: &str,
        provider: Arc<dyn CryptoProvider>,
    ) -> Result<Self> {
        integrity::verify_checksum(provider.as_ref(), representation, trusted_checksum)?;

        let store = integrity::decode(representation)?;
        store
            .kdf
            .validate()
            .map_err(|e| KeychainError::MalformedRepresentation(e.to_string()))?;

        let keys = DerivedKeys::derive(provider.as_ref(), password.as_bytes(), &store.kdf)?;
        if !keys.password_check.matches(&store.password_check) {
            warn!("Keychain load rejected: wrong master password");
            return Err(KeychainError::InvalidPassword);
        }

        info!(records = store.len(), "Keychain loaded");

        Ok(Self {
            store,
            keys,
            provider,
        })
    }

    /// Serialize the keychain and compute its checksum
    ///
    /// Does not modify the keychain. Dumping an unchanged keychain twice
    /// yields identical output.
    pub fn dump(&self) -> Result<Dump> {
        let representation = integrity::encode(&self.store)?;
        let checksum = integrity::checksum(self.provider.as_ref(), &representation);

        debug!(records = self.store.len(), "Keychain dumped");

        Ok(Dump {
            representation,
            checksum,
        })
    }

    /// Fetch the password stored for `domain`
    ///
    /// Returns `Ok(None)` if nothing is stored for it, and
    /// [`KeychainError::TamperingDetected`] if the stored record does not
    /// authenticate for this domain.
    pub fn get(&self, domain: &str) -> Result<Option<String>> {
        let fingerprint = self.keys.index_key.fingerprint(self.provider.as_ref(), domain)?;

        let Some(record) = self.store.lookup(&fingerprint) else {
            return Ok(None);
        };

        match decrypt_record(self.provider.as_ref(), &self.keys.cipher_key, domain, record) {
            Ok(password) => Ok(Some(password)),
            Err(e) => {
                warn!(error = %e, "Stored record failed authentication");
                Err(KeychainError::TamperingDetected)
            }
        }
    }

    /// Store `password` for `domain`, replacing any existing record
    pub fn set(&mut self, domain: &str, password: &str) -> Result<()> {
        if password.len() > MAX_PASSWORD_LENGTH {
            return Err(KeychainError::InvalidArgument(format!(
                "Password exceeds maximum length of {} bytes",
                MAX_PASSWORD_LENGTH
            )));
        }

        let fingerprint = self.keys.index_key.fingerprint(self.provider.as_ref(), domain)?;
        let record =
            encrypt_record(self.provider.as_ref(), &self.keys.cipher_key, domain, password)?;

        let replaced = self.store.insert(fingerprint, record).is_some();
        debug!(replaced, records = self.store.len(), "Record stored");

        Ok(())
    }

    /// Remove the record for `domain`; `false` if there was none
    pub fn remove(&mut self, domain: &str) -> Result<bool> {
        let fingerprint = self.keys.index_key.fingerprint(self.provider.as_ref(), domain)?;
        let removed = self.store.delete(&fingerprint);

        debug!(removed, records = self.store.len(), "Record removal");

        Ok(removed)
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

impl std::fmt::Debug for Keychain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keychain")
            .field("records", &self.store.len())
            .field("kdf_iterations", &self.store.kdf.iterations)
            .finish_non_exhaustive()
    }
}
