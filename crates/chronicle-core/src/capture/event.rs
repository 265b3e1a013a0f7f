//! Wire protocol of the native capture helper.
//!
//! One JSON object per stdout line. Events are ephemeral: decoded, folded
//! into a logitem or discarded, never stored.

use serde::Deserialize;

use crate::error::{ChronicleError, Result};

/// Key transition reported by the helper. Only `Down` is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum KeyState {
    Down,
    Up,
}

/// One decoded keystroke event.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapturedEvent {
    /// Epoch milliseconds at capture time.
    pub timestamp: i64,
    pub application_name: String,
    pub window_title: String,
    pub raw_key: String,
    pub state: KeyState,
}

impl CapturedEvent {
    /// Whether this event belongs to a protected application.
    ///
    /// Matching is a case-insensitive substring test against each
    /// configured entry; empty entries are ignored so a stray blank line
    /// in the config cannot block everything.
    pub fn matches_blocked_app(&self, blocked: &[String]) -> bool {
        if blocked.is_empty() {
            return false;
        }
        let app = self.application_name.to_lowercase();
        blocked
            .iter()
            .filter(|entry| !entry.trim().is_empty())
            .any(|entry| app.contains(&entry.trim().to_lowercase()))
    }
}

/// Decode one stdout line into an event.
pub fn decode_line(line: &str) -> Result<CapturedEvent> {
    serde_json::from_str(line).map_err(|err| ChronicleError::Decode(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_valid_line() {
        let line = r#"{"timestamp":1700000000000,"applicationName":"Chrome","windowTitle":"Inbox","rawKey":"a","state":"DOWN"}"#;
        let event = decode_line(line).unwrap();
        assert_eq!(event.timestamp, 1_700_000_000_000);
        assert_eq!(event.application_name, "Chrome");
        assert_eq!(event.window_title, "Inbox");
        assert_eq!(event.raw_key, "a");
        assert_eq!(event.state, KeyState::Down);
    }

    #[test]
    fn test_decode_key_up() {
        let line = r#"{"timestamp":1,"applicationName":"Chrome","windowTitle":"Inbox","rawKey":"a","state":"UP"}"#;
        assert_eq!(decode_line(line).unwrap().state, KeyState::Up);
    }

    #[test]
    fn test_decode_malformed_line() {
        let result = decode_line("not json at all");
        assert!(matches!(result, Err(ChronicleError::Decode(_))));

        let missing_field = r#"{"timestamp":1,"applicationName":"Chrome"}"#;
        assert!(matches!(
            decode_line(missing_field),
            Err(ChronicleError::Decode(_))
        ));
    }

    #[test]
    fn test_blocked_app_matching_is_case_insensitive_substring() {
        let event = decode_line(
            r#"{"timestamp":1,"applicationName":"Signal Desktop","windowTitle":"x","rawKey":"a","state":"DOWN"}"#,
        )
        .unwrap();

        assert!(event.matches_blocked_app(&["signal".to_string()]));
        assert!(event.matches_blocked_app(&["SIGNAL".to_string()]));
        assert!(event.matches_blocked_app(&["desktop".to_string()]));
        assert!(!event.matches_blocked_app(&["telegram".to_string()]));
        assert!(!event.matches_blocked_app(&[]));
    }

    #[test]
    fn test_blank_blocklist_entries_ignored() {
        let event = decode_line(
            r#"{"timestamp":1,"applicationName":"Chrome","windowTitle":"x","rawKey":"a","state":"DOWN"}"#,
        )
        .unwrap();
        assert!(!event.matches_blocked_app(&[String::new(), "  ".to_string()]));
    }
}
