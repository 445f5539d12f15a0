//! Public keychain state: KDF parameters, password check and records.
//!
//! The store is keyed by [`Fingerprint`] only and never sees a domain name.
//! It is the one piece of state that gets serialized.

use crate::crypto::{EncryptedRecord, Fingerprint, KdfParams, PasswordCheck};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Current representation version
pub const FORMAT_VERSION: u32 = 1;

/// Serializable keychain contents
///
/// Records live in a `BTreeMap` so that serialization order is stable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Store {
    pub version: u32,
    pub kdf: KdfParams,
    pub password_check: PasswordCheck,
    pub records: BTreeMap<Fingerprint, EncryptedRecord>,
}

impl Store {
    /// Create an empty store at the current format version
    pub fn new(kdf: KdfParams, password_check: PasswordCheck) -> Self {
        Self {
            version: FORMAT_VERSION,
            kdf,
            password_check,
            records: BTreeMap::new(),
        }
    }

    /// Insert or replace the record at `fingerprint`, returning the old one
    pub fn insert(
        &mut self,
        fingerprint: Fingerprint,
        record: EncryptedRecord,
    ) -> Option<EncryptedRecord> {
        self.records.insert(fingerprint, record)
    }

    pub fn lookup(&self, fingerprint: &Fingerprint) -> Option<&EncryptedRecord> {
        self.records.get(fingerprint)
    }

    /// Remove the record at `fingerprint`; true if one existed
    pub fn delete(&mut self, fingerprint: &Fingerprint) -> bool {
        self.records.remove(fingerprint).is_some()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{DerivedKeys, RustCryptoProvider, MIN_KDF_ITERATIONS};

    fn empty_store() -> (Store, DerivedKeys) {
        let provider = RustCryptoProvider::new();
        let kdf = KdfParams::generate(&provider, MIN_KDF_ITERATIONS).unwrap();
        let keys = DerivedKeys::derive(&provider, b"master", &kdf).unwrap();
        (Store::new(kdf, keys.password_check.clone()), keys)
    }

    #[test]
    fn test_insert_lookup_delete() {
        let provider = RustCryptoProvider::new();
        let (mut store, keys) = empty_store();
        let fp = keys.index_key.fingerprint(&provider, "example.com").unwrap();
        let record = EncryptedRecord::new(&[1; 12], &[2; 81]);

        assert!(store.lookup(&fp).is_none());
        assert!(store.insert(fp.clone(), record.clone()).is_none());
        assert_eq!(store.lookup(&fp), Some(&record));
        assert_eq!(store.len(), 1);

        assert!(store.delete(&fp));
        assert!(!store.delete(&fp));
        assert!(store.is_empty());
    }

    #[test]
    fn test_insert_same_domain_overwrites_slot() {
        let provider = RustCryptoProvider::new();
        let (mut store, keys) = empty_store();
        let first = EncryptedRecord::new(&[1; 12], &[1; 81]);
        let second = EncryptedRecord::new(&[2; 12], &[2; 81]);

        let fp = keys.index_key.fingerprint(&provider, "example.com").unwrap();
        store.insert(fp, first.clone());
        let fp = keys.index_key.fingerprint(&provider, "example.com").unwrap();
        let previous = store.insert(fp.clone(), second.clone());

        assert_eq!(previous, Some(first));
        assert_eq!(store.len(), 1);
        assert_eq!(store.lookup(&fp), Some(&second));
    }
}
