//! Username cleaning for markdown-projected pages.
//!
//! Markdown projection wraps usernames in emphasis markers, link syntax and
//! escape backslashes; censored names carry literal asterisks that must
//! survive cleaning. [`clean_markdown_username`] is idempotent:
//! `clean(clean(s)) == clean(s)` for any input it accepts.

use regex::Regex;
use std::sync::LazyLock;

use crate::amount::{looks_like_money, parse_roman};
use crate::model::HIDDEN_USERNAME;

static IMAGE_WRAPPER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"!\[([^\]]*)\]\([^)]*\)").expect("hardcoded image regex is valid")
});

static LINK_WRAPPER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[([^\]]*)\]\([^)]*\)").expect("hardcoded link regex is valid")
});

static LEADING_RANK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:#\s*\d{1,4}[.)]?|\d{1,4}(?:st|nd|rd|th)[.)]?|\d{1,4}\s*[.)])\s*")
        .expect("hardcoded leading rank regex is valid")
});

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("hardcoded whitespace regex is valid"));

static EMAIL_SHAPED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("hardcoded email regex is valid")
});

/// Interface labels that are never usernames. Compared after lowercasing.
const UI_TEXT: &[&str] = &[
    "show more",
    "show all",
    "load more",
    "view all",
    "see all",
    "see more",
    "next",
    "previous",
    "prev",
    "page",
    "total",
    "totals",
    "total wagered",
    "total wager",
    "wagered",
    "wager",
    "prize",
    "prizes",
    "prize pool",
    "reward",
    "rewards",
    "bonus",
    "rank",
    "place",
    "position",
    "player",
    "players",
    "user",
    "users",
    "username",
    "name",
    "entries",
    "participants",
    "leaderboard",
    "leaderboards",
    "ranking",
    "rankings",
    "standings",
    "wager race",
    "ends in",
    "ending in",
    "time left",
    "time remaining",
    "days",
    "day",
    "hours",
    "hour",
    "minutes",
    "min",
    "seconds",
    "sec",
    "1st",
    "2nd",
    "3rd",
    "n/a",
    "tbd",
    "anonymous",
    "loading",
    "login",
    "log in",
    "sign up",
    "register",
    "claim",
    "claim now",
    "join",
    "join now",
    "play now",
    "how it works",
    "terms",
    "current",
    "ended",
    "live",
    "weekly",
    "monthly",
    "daily",
    "challenger",
    "challengers",
    "winners",
    "top 3",
    "runner up",
    "runners up",
];

/// Whether a candidate is a censored username: ≥ 2 asterisks anywhere, or a
/// short name (≤ 4 chars) containing any asterisk.
#[must_use]
pub fn is_censored(s: &str) -> bool {
    let stars = s.matches('*').count();
    stars >= 2 || (s.chars().count() <= 4 && stars >= 1)
}

/// Whether a string is interface text rather than a username.
///
/// Pure numbers, currency amounts, ordinals, Roman numerals and timer units
/// all count as UI text. Candidates containing asterisks are exempt — the
/// site censored them, so they are names.
#[must_use]
pub fn is_ui_text(s: &str) -> bool {
    let trimmed = s.trim();
    if trimmed.contains('*') {
        return false;
    }
    let lower = trimmed.to_lowercase();
    if UI_TEXT.contains(&lower.as_str()) {
        return true;
    }
    if trimmed.chars().all(|c| !c.is_alphabetic()) {
        // pure numbers, currency, punctuation
        return true;
    }
    if looks_like_money(trimmed) && trimmed.chars().filter(|c| c.is_alphabetic()).count() <= 1 {
        return true;
    }
    if parse_roman(trimmed).is_some() {
        return true;
    }
    // Timer fragments: "2d 14h", "03:59:12". Each word must carry a digit so
    // ordinary all-letter names stay out of this branch.
    if lower.split_whitespace().all(|w| {
        w.chars().any(|c| c.is_ascii_digit())
            && w.chars()
                .all(|c| c.is_ascii_digit() || matches!(c, 'd' | 'h' | 'm' | 's' | ':'))
    }) {
        return true;
    }
    false
}

/// Strip one layer of wrapping emphasis markers when they form a balanced
/// pair. Unbalanced markers (including trailing censorship asterisks) are
/// preserved verbatim.
fn strip_balanced_markers(s: &str) -> String {
    const MARKERS: &[&str] = &["**", "__", "~~", "*", "_", "`"];
    let mut current = s.trim().to_string();
    loop {
        let mut stripped = false;
        for marker in MARKERS {
            if current.len() > marker.len() * 2
                && current.starts_with(marker)
                && current.ends_with(marker)
            {
                let core = &current[marker.len()..current.len() - marker.len()];
                // Never strip into a fully-censored core or across an odd
                // marker boundary ("**A*" keeps its asterisks)
                if !core.is_empty() && !core.starts_with(*marker) && !core.ends_with(*marker) {
                    current = core.trim().to_string();
                    stripped = true;
                    break;
                }
            }
        }
        if !stripped {
            return current;
        }
    }
}

/// Clean a raw markdown line into a username candidate.
///
/// Returns `None` when the text is interface noise or email-shaped;
/// `Some("[hidden]")` when the row clearly exists but has no visible name.
#[must_use]
pub fn clean_markdown_username(raw: &str) -> Option<String> {
    let mut s = raw.trim().to_string();

    // Heading markers are structure, not content
    while let Some(stripped) = s.strip_prefix('#') {
        s = stripped.trim_start().to_string();
    }

    // Links keep their text; images (avatars, flags) are dropped whole
    s = IMAGE_WRAPPER.replace_all(&s, "").to_string();
    s = LINK_WRAPPER.replace_all(&s, "$1").to_string();

    // Markdown escapes: "\$" -> "$", "\_" -> "_". Only punctuation is ever
    // escaped, and restricting to it keeps cleaning idempotent.
    let mut unescaped = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' && chars.peek().is_some_and(char::is_ascii_punctuation) {
            if let Some(next) = chars.next() {
                unescaped.push(next);
            }
        } else {
            unescaped.push(c);
        }
    }
    s = unescaped;

    // Fully-asterisk strings are fully-censored names; stop before the
    // marker stripper eats them
    let trimmed = s.trim();
    if !trimmed.is_empty() && trimmed.chars().all(|c| c == '*') {
        return Some(trimmed.to_string());
    }

    s = strip_balanced_markers(&s);
    loop {
        let stripped = LEADING_RANK.replace(&s, "").to_string();
        if stripped == s {
            break;
        }
        s = stripped;
    }
    s = WHITESPACE_RUN.replace_all(s.trim(), " ").to_string();

    if s.is_empty() || s.chars().all(|c| matches!(c, '"' | '\'' | '“' | '”' | '‘' | '’')) {
        return Some(HIDDEN_USERNAME.to_string());
    }
    if s == HIDDEN_USERNAME {
        return Some(s);
    }
    if EMAIL_SHAPED.is_match(&s) {
        return None;
    }
    if s.chars().count() == 1 {
        let c = s.chars().next()?;
        return c.is_alphanumeric().then_some(s);
    }
    if is_ui_text(&s) {
        return None;
    }
    Some(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_balanced_emphasis() {
        assert_eq!(clean_markdown_username("**Alice**").as_deref(), Some("Alice"));
        assert_eq!(clean_markdown_username("_bob_").as_deref(), Some("bob"));
        assert_eq!(clean_markdown_username("`carol`").as_deref(), Some("carol"));
        assert_eq!(clean_markdown_username("### Dave").as_deref(), Some("Dave"));
    }

    #[test]
    fn preserves_censorship_asterisks() {
        assert_eq!(clean_markdown_username("Z****o").as_deref(), Some("Z****o"));
        assert_eq!(clean_markdown_username("A*").as_deref(), Some("A*"));
        assert_eq!(clean_markdown_username("***").as_deref(), Some("***"));
        // Unbalanced wrapper stays put
        assert_eq!(clean_markdown_username("Player**").as_deref(), Some("Player**"));
    }

    #[test]
    fn drops_leading_rank_markers() {
        assert_eq!(clean_markdown_username("#1 Alice").as_deref(), Some("Alice"));
        assert_eq!(clean_markdown_username("2. Bob").as_deref(), Some("Bob"));
        assert_eq!(clean_markdown_username("3) Carol").as_deref(), Some("Carol"));
        assert_eq!(clean_markdown_username("4th Dave").as_deref(), Some("Dave"));
    }

    #[test]
    fn unwraps_links_and_images() {
        assert_eq!(
            clean_markdown_username("[Alice](https://x.example/u/alice)").as_deref(),
            Some("Alice")
        );
        assert_eq!(
            clean_markdown_username("![avatar](a.png) Bob").as_deref(),
            Some("Bob")
        );
    }

    #[test]
    fn unescapes_backslashes() {
        assert_eq!(clean_markdown_username(r"mr\_underscore").as_deref(), Some("mr_underscore"));
    }

    #[test]
    fn empty_and_quote_only_become_hidden() {
        assert_eq!(clean_markdown_username("").as_deref(), Some(HIDDEN_USERNAME));
        assert_eq!(clean_markdown_username("\"\"").as_deref(), Some(HIDDEN_USERNAME));
    }

    #[test]
    fn rejects_emails_and_ui_text() {
        assert_eq!(clean_markdown_username("a@b.com"), None);
        assert_eq!(clean_markdown_username("Show More"), None);
        assert_eq!(clean_markdown_username("Total Wagered"), None);
        assert_eq!(clean_markdown_username("1st"), None);
        assert_eq!(clean_markdown_username("$1,234"), None);
        assert_eq!(clean_markdown_username("VII"), None);
    }

    #[test]
    fn single_characters() {
        assert_eq!(clean_markdown_username("X").as_deref(), Some("X"));
        assert_eq!(clean_markdown_username("7").as_deref(), Some("7"));
        assert_eq!(clean_markdown_username("-"), None);
    }

    #[test]
    fn cleaning_is_idempotent() {
        for raw in [
            "**Alice**",
            "Z****o",
            "#1 Alice",
            "[Bob](http://x)",
            r"mr\_underscore",
            "  spaced   out  ",
            "A*",
        ] {
            let once = clean_markdown_username(raw);
            if let Some(cleaned) = &once {
                assert_eq!(
                    clean_markdown_username(cleaned).as_deref(),
                    Some(cleaned.as_str()),
                    "not idempotent for {raw:?}"
                );
            }
        }
    }
}
