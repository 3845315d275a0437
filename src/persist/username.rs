//! Username sanitization applied before storage.

use regex::Regex;
use std::sync::LazyLock;

static HEX_ESCAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\\(x[0-9a-fA-F]{2}|u[0-9a-fA-F]{4})")
        .expect("hardcoded hex escape regex is valid")
});

const MAX_STORED_LEN: usize = 100;
const FALLBACK: &str = "unknown";

/// Make a username safe for the datastore.
///
/// Strips control characters (0x00–0x1F, 0x7F) and replacement characters
/// left behind by unpaired surrogates in source payloads, rejects strings
/// carrying hex-escape-like backslash sequences, truncates to 100 chars, and
/// falls back to `"unknown"` when nothing survives.
#[must_use]
pub fn sanitize_for_storage(raw: &str) -> String {
    if HEX_ESCAPE.is_match(raw) {
        return FALLBACK.to_string();
    }

    let cleaned: String = raw
        .chars()
        .filter(|c| {
            let code = *c as u32;
            !(code <= 0x1F || code == 0x7F || *c == '\u{FFFD}')
        })
        .collect();

    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        return FALLBACK.to_string();
    }

    trimmed.chars().take(MAX_STORED_LEN).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_chars_stripped() {
        assert_eq!(sanitize_for_storage("Al\u{0007}ice\u{001F}"), "Alice");
        assert_eq!(sanitize_for_storage("tab\tname"), "tabname");
    }

    #[test]
    fn replacement_chars_from_bad_surrogates_dropped() {
        assert_eq!(sanitize_for_storage("Bo\u{FFFD}b"), "Bob");
    }

    #[test]
    fn hex_escapes_rejected() {
        assert_eq!(sanitize_for_storage(r"evil\x41name"), "unknown");
        assert_eq!(sanitize_for_storage("evil\\u0041name"), "unknown");
    }

    #[test]
    fn truncation_and_fallback() {
        let long = "x".repeat(250);
        assert_eq!(sanitize_for_storage(&long).chars().count(), 100);
        assert_eq!(sanitize_for_storage("\u{0001}\u{0002}"), "unknown");
        assert_eq!(sanitize_for_storage("   "), "unknown");
    }

    #[test]
    fn ordinary_names_untouched() {
        assert_eq!(sanitize_for_storage("Z****o"), "Z****o");
        assert_eq!(sanitize_for_storage("日本語ユーザー"), "日本語ユーザー");
    }
}
