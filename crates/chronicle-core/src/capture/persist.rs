//! Debounced persistence of the logitem store.
//!
//! A keystroke marks the store dirty and wakes the persist loop; the loop
//! waits out a quiet period, then runs export → encrypt → atomic write
//! while the dirty flag keeps getting re-set. The loop is the only code
//! path that persists during capture, so at most one cycle is ever in
//! flight, and a keystroke landing mid-cycle re-marks the flag and forces
//! a follow-up rather than a concurrent write.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Notify};
use tracing::{debug, warn};

use crate::error::Result;
use crate::storage::{EncryptedFile, LogitemStore};

pub struct Persister {
    store: Arc<LogitemStore>,
    file: Arc<EncryptedFile>,
    debounce: Duration,
    dirty: AtomicBool,
    wakeup: Notify,
}

impl Persister {
    pub fn new(store: Arc<LogitemStore>, file: Arc<EncryptedFile>, debounce: Duration) -> Self {
        Self {
            store,
            file,
            debounce,
            dirty: AtomicBool::new(false),
            wakeup: Notify::new(),
        }
    }

    /// Record that the store has unpersisted mutations and schedule a
    /// debounced persist.
    pub fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::SeqCst);
        self.wakeup.notify_one();
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::SeqCst)
    }

    /// Persist loop. Runs until `shutdown` flips; the caller performs the
    /// final flush after this returns, so nothing pending is dropped.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        loop {
            tokio::select! {
                _ = self.wakeup.notified() => {}
                _ = shutdown.changed() => break,
            }
            tokio::select! {
                _ = tokio::time::sleep(self.debounce) => {}
                _ = shutdown.changed() => break,
            }
            self.drain().await;
        }
        debug!("persist loop stopped");
    }

    /// Persist while the dirty flag is set. A keystroke that lands
    /// mid-write re-sets the flag, and the loop runs again, so no
    /// mutation is lost to an in-flight cycle.
    pub async fn drain(&self) {
        while self.dirty.swap(false, Ordering::SeqCst) {
            if let Err(err) = self.flush().await {
                // Leave the work queued; the next keystroke retries.
                warn!(error = %err, "persist failed; store left dirty for retry");
                self.dirty.store(true, Ordering::SeqCst);
                break;
            }
        }
    }

    /// One export → encrypt → atomic write cycle.
    pub async fn flush(&self) -> Result<()> {
        let bytes = self.store.export_bytes()?;
        self.file.write(&bytes).await
    }
}
