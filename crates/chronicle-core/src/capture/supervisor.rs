//! Lifecycle management of the native capture process.
//!
//! The supervisor spawns the helper with piped stdio, decodes its stdout
//! line stream, filters and ingests events, and keeps the helper alive:
//! any exit or spawn failure schedules a restart with capped exponential
//! backoff, indefinitely, until shutdown. Shutdown cancels pending
//! restart and debounce waits, kills the child, and runs one final
//! persist.

use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::capture::backoff::restart_delay;
use crate::capture::event::{decode_line, KeyState};
use crate::capture::persist::Persister;
use crate::config::CaptureConfig;
use crate::error::{ChronicleError, Result};
use crate::storage::{EncryptedFile, LogitemStore};

pub struct CaptureSupervisor {
    config: CaptureConfig,
    store: Arc<LogitemStore>,
    persister: Arc<Persister>,
    shutdown: watch::Sender<bool>,
    running: AtomicBool,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl CaptureSupervisor {
    pub fn new(
        config: CaptureConfig,
        store: Arc<LogitemStore>,
        file: Arc<EncryptedFile>,
    ) -> Self {
        let persister = Arc::new(Persister::new(store.clone(), file, config.debounce()));
        let (shutdown, _) = watch::channel(false);
        Self {
            config,
            store,
            persister,
            shutdown,
            running: AtomicBool::new(false),
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Start the supervise and persist loops.
    ///
    /// No-op if capture is already running or shutdown has begun.
    pub fn start(self: &Arc<Self>) {
        if *self.shutdown.borrow() {
            return;
        }
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }

        let persist_task = tokio::spawn(self.persister.clone().run(self.shutdown.subscribe()));
        let supervisor = Arc::clone(self);
        let supervise_task = tokio::spawn(async move { supervisor.supervise().await });

        if let Ok(mut tasks) = self.tasks.lock() {
            tasks.push(persist_task);
            tasks.push(supervise_task);
        }
    }

    /// Stop capture: cancel pending waits, kill the helper, and run one
    /// final persist. Idempotent.
    pub async fn shutdown(&self) {
        if self.shutdown.send_replace(true) {
            return;
        }
        info!("capture shutting down");

        let handles: Vec<JoinHandle<()>> = match self.tasks.lock() {
            Ok(mut tasks) => tasks.drain(..).collect(),
            Err(_) => Vec::new(),
        };
        for handle in handles {
            let _ = handle.await;
        }

        if let Err(err) = self.persister.flush().await {
            error!(error = %err, "final persist failed");
        }
        self.running.store(false, Ordering::SeqCst);
    }

    async fn supervise(self: Arc<Self>) {
        let mut shutdown = self.shutdown.subscribe();
        let mut attempts: u32 = 0;

        loop {
            if *shutdown.borrow() {
                break;
            }

            match self.spawn_capture() {
                Ok(child) => {
                    // Clean spawn resets the backoff ladder.
                    attempts = 0;
                    info!(pid = ?child.id(), "capture process started");
                    let killed = self.pump_events(child, &mut shutdown).await;
                    if killed {
                        break;
                    }
                }
                Err(err) => {
                    warn!(error = %err, "failed to spawn capture process");
                }
            }

            if *shutdown.borrow() {
                break;
            }

            let delay = restart_delay(attempts);
            attempts = attempts.saturating_add(1);
            debug!(
                delay_ms = delay.as_millis() as u64,
                attempts, "scheduling capture restart"
            );
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = shutdown.changed() => break,
            }
        }
        debug!("supervise loop stopped");
    }

    fn spawn_capture(&self) -> Result<Child> {
        Command::new(&self.config.binary_path)
            .args(&self.config.binary_args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| {
                ChronicleError::Process(format!(
                    "Failed to spawn {}: {}",
                    self.config.binary_path.display(),
                    err
                ))
            })
    }

    /// Read the child's stdout until it exits or shutdown begins.
    ///
    /// Returns `true` if the child was killed because of shutdown.
    async fn pump_events(&self, mut child: Child, shutdown: &mut watch::Receiver<bool>) -> bool {
        let Some(stdout) = child.stdout.take() else {
            warn!("capture process has no stdout handle");
            let _ = child.kill().await;
            return false;
        };

        if let Some(stderr) = child.stderr.take() {
            // Diagnostics only; the stream dies with the process.
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!(target: "chronicle::capture_stderr", "{}", line);
                }
            });
        }

        let mut lines = BufReader::new(stdout).lines();
        loop {
            tokio::select! {
                next = lines.next_line() => match next {
                    Ok(Some(line)) => self.ingest_line(&line),
                    Ok(None) => break,
                    Err(err) => {
                        warn!(error = %err, "capture stdout read failed");
                        break;
                    }
                },
                _ = shutdown.changed() => {
                    if let Err(err) = child.kill().await {
                        warn!(error = %err, "failed to kill capture process");
                    }
                    return true;
                }
            }
        }

        match child.wait().await {
            Ok(status) => warn!(%status, "capture process exited"),
            Err(err) => warn!(error = %err, "failed to reap capture process"),
        }
        false
    }

    /// Decode, filter, and ingest one stdout line.
    ///
    /// Key-up events and blocked-application events are dropped before
    /// they can touch the store. Decode and store errors drop the single
    /// event and keep the loop alive.
    fn ingest_line(&self, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }

        let event = match decode_line(line) {
            Ok(event) => event,
            Err(err) => {
                warn!(error = %err, "dropping malformed capture event");
                return;
            }
        };

        if event.state != KeyState::Down {
            return;
        }
        if event.matches_blocked_app(&self.config.blocked_apps) {
            return;
        }

        if let Err(err) = self.store.append_keystroke(
            event.timestamp,
            &event.application_name,
            &event.window_title,
            &event.raw_key,
        ) {
            warn!(error = %err, "failed to record keystroke");
            return;
        }
        self.persister.mark_dirty();
    }
}
