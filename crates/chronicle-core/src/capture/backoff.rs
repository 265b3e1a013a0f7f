//! Restart backoff policy for the capture process.
//!
//! Exponential with a hard cap: `min(30s, 1s * 2^min(attempts, 5))`.
//! Only the delay is capped; restarts continue indefinitely while capture
//! is enabled.

use std::time::Duration;

/// Delay before the first restart after a clean spawn.
pub const BASE_DELAY_MS: u64 = 1_000;

/// Upper bound on any restart delay.
pub const MAX_DELAY_MS: u64 = 30_000;

const MAX_EXPONENT: u32 = 5;

/// Delay before restart attempt number `attempts` (0-based: the first
/// failure after a clean spawn passes 0 and waits the base delay).
pub fn restart_delay(attempts: u32) -> Duration {
    let exponent = attempts.min(MAX_EXPONENT);
    let delay_ms = BASE_DELAY_MS
        .saturating_mul(1u64 << exponent)
        .min(MAX_DELAY_MS);
    Duration::from_millis(delay_ms)
}
