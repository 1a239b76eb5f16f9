//! Field helpers for structured logging

/// Maximum characters of message text included in a preview.
pub const PREVIEW_CHARS: usize = 100;

/// Truncated, privacy-gated preview of a message for debug logs.
///
/// Returns `None` unless content logging is enabled or when the message is
/// blank.
///
/// # Examples
///
/// ```
/// use nexus_gate::logging::message_preview;
///
/// assert_eq!(message_preview("Hi!", false), None);
/// assert_eq!(message_preview("Hi!", true).as_deref(), Some("Hi!"));
/// ```
pub fn message_preview(text: &str, enable_content_logging: bool) -> Option<String> {
    if !enable_content_logging {
        return None;
    }
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    Some(truncate_chars(text, PREVIEW_CHARS))
}

/// Truncate to at most `max_chars` characters, appending `...` when cut.
///
/// Counts characters rather than bytes so multi-byte text never splits.
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_disabled_returns_none() {
        assert_eq!(message_preview("Send an email to j@example.com", false), None);
    }

    #[test]
    fn test_preview_blank_returns_none() {
        assert_eq!(message_preview("   ", true), None);
    }

    #[test]
    fn test_preview_truncates_long_message() {
        let long = "a".repeat(250);
        let preview = message_preview(&long, true).unwrap();
        assert_eq!(preview.len(), PREVIEW_CHARS + 3);
        assert!(preview.ends_with("..."));
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let text = "héllo wörld";
        assert_eq!(truncate_chars(text, 2), "hé...");
        assert_eq!(truncate_chars(text, 50), text);
    }
}
