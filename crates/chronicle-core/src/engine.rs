//! The capture engine: one explicit context object.
//!
//! `CaptureEngine` owns the vault (and its master-key cache), the
//! hydrated logitem store, and the supervisor with its subprocess handle.
//! It is constructed once at startup and passed by reference wherever
//! capture state is needed; there are no process-wide singletons.

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::capture::CaptureSupervisor;
use crate::config::CaptureConfig;
use crate::crypto::vault::MasterKeyVault;
use crate::error::Result;
use crate::storage::{EncryptedBlobStore, EncryptedFile, Logitem, LogitemStore};

/// File holding the password-wrapped master key, inside the data dir.
pub const MASTER_KEY_FILE: &str = "master.key";

/// Logical path of the logitem store blob, inside the data dir.
pub const STORE_FILE: &str = "keylog.db";

pub struct CaptureEngine {
    vault: Arc<MasterKeyVault>,
    store: Arc<LogitemStore>,
    supervisor: Arc<CaptureSupervisor>,
}

impl CaptureEngine {
    /// Unlock the vault, hydrate the store from disk, and wire up the
    /// supervisor. Does not start capture.
    ///
    /// # Errors
    ///
    /// `NotInitialized` if the vault was never bootstrapped,
    /// `AuthenticationFailed` on a wrong password.
    pub async fn open(data_dir: &Path, config: CaptureConfig, password: &str) -> Result<Self> {
        let vault = Arc::new(MasterKeyVault::new(data_dir.join(MASTER_KEY_FILE)));
        let master = vault.unlock(password).await?;

        let blobs = EncryptedBlobStore::new(master);
        let file = Arc::new(EncryptedFile::new(data_dir.join(STORE_FILE), blobs));

        let store = match file.read().await? {
            Some(bytes) => {
                LogitemStore::import_with_rotation_gap(&bytes, config.rotation_gap_ms)?
            }
            None => LogitemStore::with_rotation_gap(config.rotation_gap_ms)?,
        };
        let store = Arc::new(store);
        info!(records = store.len().unwrap_or(0), "logitem store hydrated");

        let supervisor = Arc::new(CaptureSupervisor::new(config, Arc::clone(&store), file));

        Ok(Self {
            vault,
            store,
            supervisor,
        })
    }

    /// Start supervising the capture process. No-op if already running.
    pub fn start_capture(&self) {
        self.supervisor.start();
    }

    /// Stop capture, kill the helper, and flush the store. Idempotent.
    pub async fn shutdown(&self) {
        self.supervisor.shutdown().await;
    }

    /// All records with `timestamp >= threshold_ms`, newest first.
    pub fn logitems_since(&self, threshold_ms: i64) -> Result<Vec<Logitem>> {
        self.store.get_since(threshold_ms)
    }

    /// All records, newest first.
    pub fn all_logitems(&self) -> Result<Vec<Logitem>> {
        self.store.get_all()
    }

    pub fn record_count(&self) -> Result<usize> {
        self.store.len()
    }

    pub fn vault(&self) -> &MasterKeyVault {
        &self.vault
    }
}
