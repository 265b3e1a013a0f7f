//! Capture-process supervision.
//!
//! The native capture helper is a separate, crash-prone process that
//! reports keystrokes as newline-delimited JSON on stdout. This module
//! owns its lifecycle: spawning, decoding and filtering the event stream,
//! feeding the logitem store, debounced persistence, and restart with
//! capped exponential backoff.

pub mod backoff;
pub mod event;
pub mod persist;
pub mod supervisor;

pub use event::{CapturedEvent, KeyState};
pub use supervisor::CaptureSupervisor;
