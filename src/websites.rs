//! Website list loader for batch runs.

use anyhow::{Context, Result};
use std::path::Path;

/// Parse `websites.txt` content: one `http(s)://` URL per line, `#`
/// comments and blank lines skipped. Anything else is ignored.
#[must_use]
pub fn parse(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .filter(|l| l.starts_with("http://") || l.starts_with("https://"))
        .map(ToOwned::to_owned)
        .collect()
}

/// Load site URLs from a file.
pub fn load(path: &Path) -> Result<Vec<String>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read website list from {}", path.display()))?;
    Ok(parse(&raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_comments_blanks_and_junk() {
        let urls = parse(
            "# production sites\nhttps://a.example\n\nftp://nope.example\nhttp://b.example/lb\n  # indented comment\n",
        );
        assert_eq!(
            urls,
            vec!["https://a.example".to_string(), "http://b.example/lb".to_string()]
        );
    }
}
