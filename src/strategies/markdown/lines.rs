//! Line-level classification shared by the markdown sub-parsers.

use regex::Regex;
use std::sync::LazyLock;

use crate::amount::{parse_amount, scan_amounts};

pub static WAGERED_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bwagered?\b\s*:?\s*(.*)$").expect("hardcoded wagered label regex is valid")
});

pub static PRIZE_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:prize|reward|bonus|payout|winnings)\b\s*:?\s*(.*)$")
        .expect("hardcoded prize label regex is valid")
});

static IMAGE_ONLY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(!\[[^\]]*\]\([^)]*\)\s*)+$").expect("hardcoded image-only regex is valid")
});

static SEPARATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\s\-=_*|#>·•]*$").expect("hardcoded separator regex is valid")
});

/// Icons some sites put next to the prize column.
pub const PRIZE_ICONS: &[&str] = &["🎁", "🏆", "💰", "💎", "🪙"];

/// Horizontal rules, empty lines, pipe scaffolding.
#[must_use]
pub fn is_separator_line(line: &str) -> bool {
    SEPARATOR.is_match(line)
}

/// Lines that are nothing but image markdown (avatars, badges).
#[must_use]
pub fn is_image_only(line: &str) -> bool {
    IMAGE_ONLY.is_match(line)
}

/// A line that is essentially a single amount (after unescaping `\$`).
#[must_use]
pub fn line_amount(line: &str) -> Option<f64> {
    let cleaned = unescape_dollars(line);
    let t = cleaned.trim();
    if t.is_empty() || t.chars().filter(|c| c.is_alphabetic()).count() > 2 {
        return None;
    }
    parse_amount(t)
}

/// All amounts present anywhere in the line.
#[must_use]
pub fn amounts_in_line(line: &str) -> Vec<f64> {
    scan_amounts(&unescape_dollars(line))
}

/// Markdown projection escapes dollars as `\$`; undo that before amount
/// scanning.
#[must_use]
pub fn unescape_dollars(line: &str) -> String {
    line.replace(r"\$", "$")
}

/// Whether a line carries a prize icon or names the prize explicitly.
#[must_use]
pub fn has_prize_marker(line: &str) -> bool {
    PRIZE_ICONS.iter().any(|icon| line.contains(icon))
        || PRIZE_LABEL.is_match(line)
        || line.to_lowercase().contains("prize")
}

/// A bare value that is probably a rank number rather than a prize: a small
/// whole number with no currency shape.
#[must_use]
pub fn looks_like_rank_number(line: &str, value: f64) -> bool {
    value.fract() == 0.0
        && value <= 100.0
        && !crate::amount::looks_like_money(line.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separators_and_images() {
        assert!(is_separator_line("---"));
        assert!(is_separator_line("  "));
        assert!(is_separator_line("| --- | --- |"));
        assert!(is_image_only("![avatar](x.png)"));
        assert!(!is_image_only("![avatar](x.png) Bob"));
    }

    #[test]
    fn escaped_dollar_amounts() {
        assert_eq!(line_amount(r"\$285,750"), Some(285750.0));
        assert_eq!(line_amount("$2,000"), Some(2000.0));
        assert_eq!(line_amount("Wagered everything"), None);
    }

    #[test]
    fn rank_number_shapes() {
        assert!(looks_like_rank_number("2", 2.0));
        assert!(!looks_like_rank_number("$2", 2.0));
        assert!(!looks_like_rank_number("2.50", 2.5));
        assert!(!looks_like_rank_number("1250", 1250.0));
    }
}
