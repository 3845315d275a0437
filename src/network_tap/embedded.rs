//! Embedded-JSON extraction from JS bundles and HTML documents.
//!
//! SPA sites frequently ship the leaderboard dataset inside a script: a
//! `window.__DATA__ = [...]` global, a `const rows = [...]` literal, a
//! `JSON.parse('...')` call, or a JSON-LD block. These helpers dig those out
//! without executing any JS.

use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;
use std::sync::LazyLock;

static ASSIGNMENT_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:window\.\w+|(?:let|var|const)\s+\w+)\s*=\s*([\[{])"#)
        .expect("hardcoded assignment regex is valid")
});

static JSON_PARSE_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"JSON\.parse\(\s*(['"])"#).expect("hardcoded JSON.parse regex is valid")
});

/// Cap on how many candidate literals a single body yields. Bundles can be
/// megabytes of minified code; past this point more candidates add noise,
/// not data.
const MAX_CANDIDATES: usize = 32;

/// Extract JSON values embedded in a JavaScript body.
///
/// Finds global/local assignments of array or object literals, then
/// `JSON.parse` string arguments, then bare inline array literals. Anything
/// that fails to parse is skipped silently.
#[must_use]
pub fn extract_arrays_from_js(body: &str) -> Vec<Value> {
    let mut values = Vec::new();

    for caps in ASSIGNMENT_START.captures_iter(body) {
        if values.len() >= MAX_CANDIDATES {
            break;
        }
        let open = caps.get(1).map_or(0, |m| m.start());
        if let Some(literal) = scan_balanced(body, open)
            && let Ok(value) = serde_json::from_str::<Value>(literal)
        {
            values.push(value);
        }
    }

    for caps in JSON_PARSE_CALL.captures_iter(body) {
        if values.len() >= MAX_CANDIDATES {
            break;
        }
        let quote = caps
            .get(1)
            .and_then(|m| m.as_str().chars().next())
            .unwrap_or('\'');
        let arg_start = caps.get(1).map_or(0, |m| m.end());
        if let Some(raw) = scan_quoted(body, arg_start, quote) {
            let unescaped = unescape_js_string(raw);
            if let Ok(value) = serde_json::from_str::<Value>(&unescaped) {
                values.push(value);
            }
        }
    }

    // Inline array-of-objects literals not behind an assignment
    if values.is_empty() {
        let mut offset = 0;
        while let Some(pos) = body[offset..].find("[{") {
            let start = offset + pos;
            if let Some(literal) = scan_balanced(body, start)
                && let Ok(value) = serde_json::from_str::<Value>(literal)
            {
                values.push(value);
                if values.len() >= MAX_CANDIDATES {
                    break;
                }
            }
            offset = start + 2;
        }
    }

    values
}

/// Extract JSON values embedded in an HTML document's `<script>` blocks.
///
/// JSON-typed scripts (including JSON-LD) are parsed whole; ordinary scripts
/// go through [`extract_arrays_from_js`].
#[must_use]
pub fn extract_json_from_html(html: &str) -> Vec<Value> {
    static SCRIPT: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("script").expect("script selector is valid"));

    let document = Html::parse_document(html);
    let mut values = Vec::new();
    for script in document.select(&SCRIPT) {
        if values.len() >= MAX_CANDIDATES {
            break;
        }
        let body: String = script.text().collect();
        if body.trim().is_empty() {
            continue;
        }
        let is_json_type = script
            .value()
            .attr("type")
            .is_some_and(|t| t.to_ascii_lowercase().contains("json"));
        if is_json_type {
            if let Ok(value) = serde_json::from_str::<Value>(body.trim()) {
                values.push(value);
            } else {
                // Some renderers entity-encode quotes inside JSON scripts
                let decoded = html_escape::decode_html_entities(body.trim());
                if let Ok(value) = serde_json::from_str::<Value>(decoded.as_ref()) {
                    values.push(value);
                }
            }
        } else {
            values.extend(extract_arrays_from_js(&body));
        }
    }
    values
}

/// Scan a balanced `[...]` or `{...}` literal starting at `open`, respecting
/// string literals and escapes. Returns the literal including delimiters.
fn scan_balanced(body: &str, open: usize) -> Option<&str> {
    let bytes = body.as_bytes();
    let open_char = *bytes.get(open)? as char;
    let close_char = match open_char {
        '[' => ']',
        '{' => '}',
        _ => return None,
    };

    let mut depth = 0usize;
    let mut in_string: Option<char> = None;
    let mut escaped = false;
    for (i, c) in body[open..].char_indices() {
        if let Some(quote) = in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == quote {
                in_string = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => in_string = Some(c),
            c if c == open_char => depth += 1,
            c if c == close_char => {
                depth -= 1;
                if depth == 0 {
                    return Some(&body[open..=open + i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Scan a quoted JS string starting right after the opening quote.
fn scan_quoted(body: &str, start: usize, quote: char) -> Option<&str> {
    let mut escaped = false;
    for (i, c) in body[start..].char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == quote {
            return Some(&body[start..start + i]);
        }
    }
    None
}

/// Undo JS string escapes so the payload parses as JSON.
fn unescape_js_string(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                if let Ok(code) = u32::from_str_radix(&hex, 16)
                    && let Some(ch) = char::from_u32(code)
                {
                    out.push(ch);
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}
