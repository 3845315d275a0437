//! Money and rank token parsing.
//!
//! Leaderboard pages render amounts in wildly different shapes: `$1,234.56`,
//! `1.234,56 €`, `2.5m`, `10k`, emoji-prefixed coin counts. This module turns
//! any of those into a plain non-negative `f64`, and rank markers (`#04.`,
//! `1st`, Roman numerals) into integers.

use regex::Regex;
use std::sync::LazyLock;

static MONEY_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[$€£¥]?\s*\d[\d.,\s\u{202f}\u{00a0}]*\s*[kKmMbB]?\b")
        .expect("hardcoded money token regex is valid")
});

static RANK_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*#?\s*0*(\d{1,4})\s*(?:st|nd|rd|th)?\s*[.)]?\s*$")
        .expect("hardcoded rank marker regex is valid")
});

/// Characters stripped before numeric parsing: currency symbols, spacing and
/// the coin/money emoji some sites use as a prize marker.
const SYMBOL_CHARS: &[char] = &[
    '$', '€', '£', '¥', '💰', '🪙', '🏆', '💵', '💎', '+', '~',
];

/// Parse a money-shaped token into a non-negative amount.
///
/// Handles U.S. (`1,234.56`) and European (`1.234,56`) separator conventions,
/// space/nbsp thousands grouping, and `k`/`m`/`b` magnitude suffixes. Returns
/// `None` for anything that does not contain a digit or parses negative.
#[must_use]
pub fn parse_amount(raw: &str) -> Option<f64> {
    let mut s = raw.trim().to_string();
    for c in SYMBOL_CHARS {
        s = s.replace(*c, "");
    }
    // nbsp / narrow nbsp show up as thousands separators on some locales
    s = s.replace(['\u{00a0}', '\u{202f}', ' '], "");

    if s.is_empty() || !s.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let multiplier = match s.chars().last() {
        Some('k' | 'K') => {
            s.pop();
            1_000.0
        }
        Some('m' | 'M') => {
            s.pop();
            1_000_000.0
        }
        Some('b' | 'B') => {
            s.pop();
            1_000_000_000.0
        }
        _ => 1.0,
    };

    let normalized = normalize_separators(&s, multiplier != 1.0)?;
    let value: f64 = normalized.parse().ok()?;
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    Some(value * multiplier)
}

/// Resolve `.` vs `,` into a single canonical decimal point.
///
/// When both appear, the rightmost one is the decimal separator. With one
/// separator kind only, a group of exactly three trailing digits is read as
/// thousands grouping unless a magnitude suffix was present (`1.2k` is always
/// a decimal).
fn normalize_separators(s: &str, has_suffix: bool) -> Option<String> {
    let last_dot = s.rfind('.');
    let last_comma = s.rfind(',');

    let cleaned = match (last_dot, last_comma) {
        (Some(d), Some(c)) => {
            let (decimal, thousands) = if d > c { ('.', ',') } else { (',', '.') };
            let no_thousands = s.replace(thousands, "");
            no_thousands.replace(decimal, ".")
        }
        (Some(idx), None) | (None, Some(idx)) => {
            let sep = s.as_bytes()[idx] as char;
            let tail_len = s.len() - idx - 1;
            let grouped = s.matches(sep).count() > 1
                || (tail_len == 3 && !has_suffix && s.len() > 4 && !s.starts_with('0'));
            if grouped {
                s.replace(sep, "")
            } else {
                s.replace(sep, ".")
            }
        }
        (None, None) => s.to_string(),
    };

    if cleaned.chars().all(|c| c.is_ascii_digit() || c == '.') {
        Some(cleaned)
    } else {
        None
    }
}

/// Whether a token looks like a money amount rather than a bare count.
///
/// A currency symbol, decimal part, thousands grouping or magnitude suffix
/// all qualify.
#[must_use]
pub fn looks_like_money(token: &str) -> bool {
    let t = token.trim();
    if t.chars().any(|c| SYMBOL_CHARS.contains(&c)) {
        return true;
    }
    if !t.chars().any(|c| c.is_ascii_digit()) {
        return false;
    }
    t.contains('.')
        || t.contains(',')
        || t.to_ascii_lowercase()
            .trim_end_matches(|c: char| !c.is_alphanumeric())
            .ends_with(['k', 'm', 'b'])
}

/// Find every money-shaped token in a line of text, in order.
#[must_use]
pub fn scan_amounts(text: &str) -> Vec<f64> {
    MONEY_TOKEN
        .find_iter(text)
        .filter_map(|m| parse_amount(m.as_str()))
        .collect()
}

/// Parse an explicit rank marker: `#04.`, `04`, `4.`, `4)`, `1st`, `IV`.
///
/// Returns `None` for zero and for anything over 9999 (those are amounts,
/// not positions).
#[must_use]
pub fn parse_rank(raw: &str) -> Option<u32> {
    let s = raw.trim();
    if let Some(caps) = RANK_MARKER.captures(s) {
        let n: u32 = caps[1].parse().ok()?;
        return (n > 0).then_some(n);
    }
    parse_roman(s)
}

/// Parse a Roman numeral rank (I through XX, upper case only — lowercase
/// romans collide with ordinary words).
#[must_use]
pub fn parse_roman(s: &str) -> Option<u32> {
    let s = s.trim();
    if s.is_empty() || s.len() > 5 || !s.chars().all(|c| matches!(c, 'I' | 'V' | 'X')) {
        return None;
    }
    let value_of = |c: char| match c {
        'I' => 1,
        'V' => 5,
        'X' => 10,
        _ => 0,
    };
    let chars: Vec<u32> = s.chars().map(value_of).collect();
    let mut total: i64 = 0;
    for (i, &v) in chars.iter().enumerate() {
        if chars.get(i + 1).is_some_and(|&next| next > v) {
            total -= i64::from(v);
        } else {
            total += i64::from(v);
        }
    }
    (total > 0 && total <= 20).then(|| total as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn us_and_european_separators_agree() {
        assert_eq!(parse_amount("1,234.56"), Some(1234.56));
        assert_eq!(parse_amount("1234.56"), Some(1234.56));
        assert_eq!(parse_amount("1.234,56"), Some(1234.56));
        assert_eq!(parse_amount("1 234,56"), Some(1234.56));
    }

    #[test]
    fn magnitude_suffixes() {
        assert_eq!(parse_amount("10k"), Some(10_000.0));
        assert_eq!(parse_amount("2.5m"), Some(2_500_000.0));
        assert_eq!(parse_amount("$1.2K"), Some(1_200.0));
        assert_eq!(parse_amount("1b"), Some(1_000_000_000.0));
    }

    #[test]
    fn currency_symbols_and_emoji_stripped() {
        assert_eq!(parse_amount("$2,732.62"), Some(2732.62));
        assert_eq!(parse_amount("€ 500"), Some(500.0));
        assert_eq!(parse_amount("💰 1,500"), Some(1500.0));
    }

    #[test]
    fn single_separator_grouping_heuristic() {
        // Three trailing digits read as thousands grouping
        assert_eq!(parse_amount("1,234"), Some(1234.0));
        assert_eq!(parse_amount("12.345"), Some(12345.0));
        // One or two trailing digits read as a decimal part
        assert_eq!(parse_amount("1,5"), Some(1.5));
        assert_eq!(parse_amount("7.25"), Some(7.25));
        // A magnitude suffix forces decimal interpretation
        assert_eq!(parse_amount("1.250k"), Some(1250.0));
    }

    #[test]
    fn rejects_non_numeric_garbage() {
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("n/a"), None);
        assert_eq!(parse_amount("$"), None);
        assert_eq!(parse_amount("12-34"), None);
    }

    #[test]
    fn rank_markers_normalize() {
        for raw in ["#04.", "04", "4.", "4", "4)", "4th"] {
            assert_eq!(parse_rank(raw), Some(4), "failed on {raw:?}");
        }
        assert_eq!(parse_rank("1st"), Some(1));
        assert_eq!(parse_rank("0"), None);
        assert_eq!(parse_rank("12345"), None, "five digits is not a rank");
    }

    #[test]
    fn roman_numeral_ranks() {
        assert_eq!(parse_roman("I"), Some(1));
        assert_eq!(parse_roman("IV"), Some(4));
        assert_eq!(parse_roman("IX"), Some(9));
        assert_eq!(parse_roman("XIII"), Some(13));
        assert_eq!(parse_roman("ivy"), None);
        assert_eq!(parse_roman(""), None);
    }

    #[test]
    fn money_shaped_tokens() {
        assert!(looks_like_money("$120"));
        assert!(looks_like_money("1,234"));
        assert!(looks_like_money("2.5m"));
        assert!(!looks_like_money("42"));
        assert!(!looks_like_money("mmm"));
    }

    #[test]
    fn scan_finds_amounts_in_order() {
        let amounts = scan_amounts("Wagered: $12,345.50 Prize: $600");
        assert_eq!(amounts, vec![12345.50, 600.0]);
    }
}
