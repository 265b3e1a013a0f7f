//! Runtime configuration for the capture engine.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::storage::logitems::DEFAULT_ROTATION_GAP_MS;

/// Configuration consumed by the capture supervisor and logitem store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Path to the native capture helper binary (platform/packaging
    /// resolved by the caller).
    pub binary_path: PathBuf,

    /// Extra arguments passed to the helper.
    #[serde(default)]
    pub binary_args: Vec<String>,

    /// Case-insensitive substrings of application names whose keystrokes
    /// must never be persisted.
    #[serde(default)]
    pub blocked_apps: Vec<String>,

    /// Quiet period before persisting buffered keystrokes.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Maximum gap between keystrokes merged into one logitem.
    #[serde(default = "default_rotation_gap_ms")]
    pub rotation_gap_ms: i64,
}

const fn default_debounce_ms() -> u64 {
    500
}

const fn default_rotation_gap_ms() -> i64 {
    DEFAULT_ROTATION_GAP_MS
}

impl CaptureConfig {
    /// Config with defaults for everything but the helper path.
    pub fn new(binary_path: impl Into<PathBuf>) -> Self {
        Self {
            binary_path: binary_path.into(),
            binary_args: Vec::new(),
            blocked_apps: Vec::new(),
            debounce_ms: default_debounce_ms(),
            rotation_gap_ms: default_rotation_gap_ms(),
        }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}
