//! Atomic, encrypted persistence for one logical file.
//!
//! The logical path (e.g. `keylog.db`) names where a plaintext file would
//! live; the encrypted artifact lives at a sibling path with an extra
//! `.enc` suffix. Writes go to a temp sibling and are renamed over the
//! target, and a single async mutex serializes every read and write, so a
//! concurrent reader can never observe a half-committed state.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{ChronicleError, Result};
use crate::fs;
use crate::storage::blob::EncryptedBlobStore;

/// Suffix distinguishing the encrypted artifact from the plaintext path.
pub const ENCRYPTED_SUFFIX: &str = "enc";

/// Return the encrypted sibling for a logical plaintext path.
pub fn encrypted_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(OsString::new);
    name.push(".");
    name.push(ENCRYPTED_SUFFIX);
    path.with_file_name(name)
}

/// Encrypted contents of a logical file, replaced atomically.
pub struct EncryptedFile {
    plain_path: PathBuf,
    encrypted_path: PathBuf,
    blobs: EncryptedBlobStore,
    lock: Mutex<()>,
}

impl EncryptedFile {
    pub fn new(path: impl Into<PathBuf>, blobs: EncryptedBlobStore) -> Self {
        let plain_path = path.into();
        let encrypted_path = encrypted_sibling(&plain_path);
        Self {
            plain_path,
            encrypted_path,
            blobs,
            lock: Mutex::new(()),
        }
    }

    pub fn encrypted_path(&self) -> &Path {
        &self.encrypted_path
    }

    /// Read the file's current contents.
    ///
    /// A plaintext file at the logical path wins (legacy, pre-encryption
    /// installs); otherwise the encrypted sibling is decrypted. `None`
    /// means the file has never been written, which is not an error.
    pub async fn read(&self) -> Result<Option<Vec<u8>>> {
        let _guard = self.lock.lock().await;

        match tokio::fs::read(&self.plain_path).await {
            Ok(bytes) => {
                debug!(path = %self.plain_path.display(), "read legacy plaintext file");
                return Ok(Some(bytes));
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }

        match tokio::fs::read(&self.encrypted_path).await {
            Ok(sealed) => self.blobs.open(&sealed).map(Some),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Encrypt `bytes` and atomically replace the encrypted artifact,
    /// then remove any stale plaintext file at the logical path.
    pub async fn write(&self, bytes: &[u8]) -> Result<()> {
        let _guard = self.lock.lock().await;

        let sealed = self.blobs.seal(bytes)?;
        let destination = self.encrypted_path.clone();
        tokio::task::spawn_blocking(move || fs::write_atomic(&destination, &sealed))
            .await
            .map_err(|e| ChronicleError::Storage(format!("File write task failed: {}", e)))??;

        match tokio::fs::remove_file(&self.plain_path).await {
            Ok(()) => {
                debug!(path = %self.plain_path.display(), "removed stale plaintext file");
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }
        Ok(())
    }
}
