//! File persistence for the keychain representation and its checksum.
//!
//! The two values go to separate files so the checksum can live somewhere
//! the store's storage cannot roll back along with it. Each write keeps the
//! previous pair as `.prev` files until both replacements land, so a crash
//! between the two renames can be recovered from.

use anyhow::{bail, Context, Result};
use keychain_core::{integrity, Dump, RustCryptoProvider};
use std::path::{Path, PathBuf};
use tracing::warn;

pub struct FileStorage {
    store_path: PathBuf,
    checksum_path: PathBuf,
}

impl FileStorage {
    pub fn new(store_path: impl Into<PathBuf>, checksum_path: impl Into<PathBuf>) -> Self {
        Self {
            store_path: store_path.into(),
            checksum_path: checksum_path.into(),
        }
    }

    pub fn store_path(&self) -> &Path {
        &self.store_path
    }

    /// True if a representation has been written before
    pub fn exists(&self) -> bool {
        self.store_path.exists()
    }

    /// Read the current pair, falling back to the previous generation when a
    /// write was interrupted halfway
    pub fn read(&self) -> Result<Dump> {
        let current = read_pair(&self.store_path, &self.checksum_path)?;
        if is_consistent(&current) {
            return Ok(current);
        }

        let prev_store = backup_path(&self.store_path);
        let prev_checksum = backup_path(&self.checksum_path);
        if prev_store.exists() && prev_checksum.exists() {
            let previous = read_pair(&prev_store, &prev_checksum)?;
            if is_consistent(&previous) {
                warn!("Interrupted write detected; using the previous keychain generation");
                return Ok(previous);
            }
        }

        // Mismatched pair with nothing to recover; load reports it
        Ok(current)
    }

    /// Write both files, each through a temporary file and a rename
    pub fn write(&self, dump: &Dump) -> Result<()> {
        let prev_store = backup_path(&self.store_path);
        let prev_checksum = backup_path(&self.checksum_path);

        if self.store_path.exists() && self.checksum_path.exists() {
            let current = read_pair(&self.store_path, &self.checksum_path)?;
            write_replace(&prev_checksum, &current.checksum)?;
            write_replace(&prev_store, &current.representation)?;
        }

        write_replace(&self.store_path, &dump.representation)?;
        write_replace(&self.checksum_path, &dump.checksum)?;

        remove_if_present(&prev_store)?;
        remove_if_present(&prev_checksum)?;
        Ok(())
    }
}

fn read_pair(store_path: &Path, checksum_path: &Path) -> Result<Dump> {
    let representation = std::fs::read_to_string(store_path)
        .with_context(|| format!("Failed to read keychain {}", store_path.display()))?;

    if !checksum_path.exists() {
        bail!(
            "Checksum file {} is missing; refusing to load an unverifiable keychain",
            checksum_path.display()
        );
    }
    let checksum = std::fs::read_to_string(checksum_path)
        .with_context(|| format!("Failed to read checksum {}", checksum_path.display()))?;

    Ok(Dump {
        representation,
        checksum: checksum.trim().to_string(),
    })
}

fn is_consistent(dump: &Dump) -> bool {
    integrity::checksum(&RustCryptoProvider::new(), &dump.representation) == dump.checksum
}

fn backup_path(path: &Path) -> PathBuf {
    let mut backup = path.as_os_str().to_owned();
    backup.push(".prev");
    PathBuf::from(backup)
}

fn remove_if_present(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Failed to remove {}", path.display())),
    }
}

fn write_replace(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    std::fs::write(&tmp, contents)
        .with_context(|| format!("Failed to write {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}
