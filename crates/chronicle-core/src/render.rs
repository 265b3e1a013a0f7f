//! Human-readable transcript rendering.
//!
//! Consumers (the read API, the CLI) turn logitems into a transcript:
//! one header line per record followed by the cleaned keystroke text.

use chrono::{Local, TimeZone};

use crate::storage::Logitem;

/// Render a batch of logitems, one block per record, in the given order.
pub fn render_transcript(items: &[Logitem]) -> String {
    let mut out = String::new();
    for item in items {
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(&render_logitem(item));
        out.push('\n');
    }
    out
}

/// `"<local-date local-time>: <app>: <window>"` followed by the cleaned
/// keystroke text.
pub fn render_logitem(item: &Logitem) -> String {
    format!(
        "{}: {}: {}\n{}",
        format_local(item.timestamp),
        item.app_name,
        item.window_title,
        clean_keylogs(&item.keylogs)
    )
}

fn format_local(timestamp_ms: i64) -> String {
    match Local.timestamp_millis_opt(timestamp_ms).single() {
        Some(ts) => ts.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => timestamp_ms.to_string(),
    }
}

/// Clean raw keylog text for display.
///
/// The capture helper reports control keys as bracketed tokens. Tokens
/// with a textual meaning are substituted, modifier and unknown tokens
/// are stripped, and printable keys pass through unchanged. An unclosed
/// bracket is kept verbatim.
pub fn clean_keylogs(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(start) = rest.find('[') {
        out.push_str(&rest[..start]);
        match rest[start + 1..].find(']') {
            Some(offset) => {
                let token = &rest[start + 1..start + 1 + offset];
                match token {
                    "Enter" | "Return" => out.push('\n'),
                    "Tab" => out.push('\t'),
                    "Space" => out.push(' '),
                    _ => {}
                }
                rest = &rest[start + offset + 2..];
            }
            None => {
                out.push_str(&rest[start..]);
                return out;
            }
        }
    }
    out.push_str(rest);
    out
}
