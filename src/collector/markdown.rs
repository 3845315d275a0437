//! Noise-stripped HTML→Markdown projection.
//!
//! The projection feeds the markdown strategy, so fidelity matters more
//! than prettiness: tables become pipe rows, dollars are escaped the way
//! markdown renderers do (`\$`), hidden nodes and chrome (nav, cookie
//! banners, modals) disappear, and output is capped at 1 MB.

use anyhow::Result;
use ego_tree::NodeRef;
use regex::Regex;
use scraper::{Html, Node, Selector};
use std::sync::LazyLock;

use crate::utils::constants::MAX_MARKDOWN_BYTES;

static NOISE_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)cookie|popup|modal|sidebar|overlay|consent|toast|drawer|tooltip")
        .expect("hardcoded noise class regex is valid")
});

/// Tags whose subtrees never contribute content.
const NOISE_TAGS: &[&str] = &[
    "script", "style", "noscript", "iframe", "nav", "footer", "header", "svg", "template",
];

const NOISE_ROLES: &[&str] = &["navigation", "banner", "contentinfo"];

/// Project an HTML document to Markdown.
pub fn project(html: &str) -> Result<String> {
    let document = Html::parse_document(html);
    let body_selector = Selector::parse("body").expect("body selector is valid");

    let mut out = String::new();
    if let Some(body) = document.select(&body_selector).next() {
        let mut writer = Writer::new(&mut out);
        writer.walk_children(*body);
    }

    let mut cleaned = collapse_blank_lines(&out);
    if cleaned.len() > MAX_MARKDOWN_BYTES {
        let mut cut = MAX_MARKDOWN_BYTES;
        while !cleaned.is_char_boundary(cut) {
            cut -= 1;
        }
        cleaned.truncate(cut);
    }
    Ok(cleaned)
}

fn collapse_blank_lines(text: &str) -> String {
    static BLANKS: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\n{3,}").expect("hardcoded blank lines regex is valid"));
    BLANKS.replace_all(text.trim(), "\n\n").to_string()
}

struct Writer<'a> {
    out: &'a mut String,
}

impl<'a> Writer<'a> {
    fn new(out: &'a mut String) -> Self {
        Self { out }
    }

    fn walk_children(&mut self, node: NodeRef<'_, Node>) {
        for child in node.children() {
            self.walk(child);
        }
    }

    fn walk(&mut self, node: NodeRef<'_, Node>) {
        match node.value() {
            Node::Text(text) => self.push_text(text),
            Node::Element(element) => {
                let tag = element.name();
                if is_noise(element) {
                    return;
                }
                match tag {
                    "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                        let level = tag[1..].parse::<usize>().unwrap_or(3);
                        self.newline();
                        self.out.push_str(&"#".repeat(level));
                        self.out.push(' ');
                        self.walk_children(node);
                        self.newline();
                    }
                    "table" => {
                        self.write_table(node);
                    }
                    "li" => {
                        self.newline();
                        self.out.push_str("- ");
                        self.walk_children(node);
                    }
                    "br" => self.newline(),
                    "img" => {
                        let alt = element.attr("alt").unwrap_or_default();
                        let src = element
                            .attr("src")
                            .and_then(|s| s.rsplit('/').next())
                            .unwrap_or_default();
                        if !alt.is_empty() || !src.is_empty() {
                            self.out.push_str(&format!("![{alt}]({src})"));
                        }
                    }
                    "a" => {
                        let href = element.attr("href").unwrap_or_default();
                        let mut inner = String::new();
                        {
                            let mut writer = Writer::new(&mut inner);
                            writer.walk_children(node);
                        }
                        let inner = inner.trim();
                        if !inner.is_empty() {
                            if href.is_empty() {
                                self.out.push_str(inner);
                            } else {
                                self.out.push_str(&format!("[{inner}]({href})"));
                            }
                        }
                    }
                    "b" | "strong" => {
                        let mut inner = String::new();
                        {
                            let mut writer = Writer::new(&mut inner);
                            writer.walk_children(node);
                        }
                        let inner = inner.trim().to_string();
                        if !inner.is_empty() {
                            self.out.push_str(&format!("**{inner}**"));
                        }
                    }
                    // Block-level elements separate their content with
                    // newlines; inline elements flow through
                    "div" | "p" | "section" | "article" | "tr" | "ul" | "ol" | "main"
                    | "aside" | "figure" | "form" => {
                        self.newline();
                        self.walk_children(node);
                        self.newline();
                    }
                    _ => self.walk_children(node),
                }
            }
            _ => {}
        }
    }

    /// Tables project as pipe-delimited rows; the markdown table parser
    /// depends on this exact shape.
    fn write_table(&mut self, table: NodeRef<'_, Node>) {
        self.newline();
        let mut first_row = true;
        for row in descend_elements(table, "tr") {
            let mut cells: Vec<String> = Vec::new();
            for cell in row.children() {
                if let Node::Element(el) = cell.value() {
                    if el.name() == "td" || el.name() == "th" {
                        let mut inner = String::new();
                        {
                            let mut writer = Writer::new(&mut inner);
                            writer.walk_children(cell);
                        }
                        cells.push(inner.split_whitespace().collect::<Vec<_>>().join(" "));
                    }
                }
            }
            if cells.is_empty() {
                continue;
            }
            self.out.push_str(&format!("| {} |\n", cells.join(" | ")));
            if first_row {
                self.out
                    .push_str(&format!("|{}\n", " --- |".repeat(cells.len())));
                first_row = false;
            }
        }
        self.newline();
    }

    fn push_text(&mut self, text: &str) {
        let collapsed: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if collapsed.is_empty() {
            return;
        }
        if !self.out.is_empty() && !self.out.ends_with(['\n', ' ', '(', '[']) {
            self.out.push(' ');
        }
        // Escape the characters markdown renderers escape; the sub-parsers
        // unescape them symmetrically
        let escaped = collapsed.replace('$', r"\$");
        self.out.push_str(&escaped);
    }

    fn newline(&mut self) {
        if !self.out.is_empty() && !self.out.ends_with('\n') {
            self.out.push('\n');
        }
    }
}

/// Depth-first descendants with a given tag name.
fn descend_elements<'a>(
    node: NodeRef<'a, Node>,
    tag: &'static str,
) -> Vec<NodeRef<'a, Node>> {
    let mut out = Vec::new();
    let mut stack: Vec<NodeRef<'a, Node>> = node.children().collect();
    stack.reverse();
    while let Some(current) = stack.pop() {
        if let Node::Element(el) = current.value()
            && el.name() == tag
        {
            out.push(current);
        }
        let mut children: Vec<NodeRef<'a, Node>> = current.children().collect();
        children.reverse();
        stack.extend(children);
    }
    out
}

fn is_noise(element: &scraper::node::Element) -> bool {
    let tag = element.name();
    if NOISE_TAGS.contains(&tag) {
        return true;
    }
    if let Some(role) = element.attr("role")
        && NOISE_ROLES.contains(&role)
    {
        return true;
    }
    if let Some(class) = element.attr("class")
        && NOISE_CLASS.is_match(class)
    {
        return true;
    }
    if element.attr("hidden").is_some() || element.attr("aria-hidden") == Some("true") {
        return true;
    }
    if let Some(style) = element.attr("style") {
        let style = style.replace(' ', "").to_lowercase();
        if style.contains("display:none") || style.contains("visibility:hidden") {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_become_pipe_rows() {
        let html = r"<html><body><table>
            <tr><th>Rank</th><th>Player</th><th>Wagered</th></tr>
            <tr><td>1</td><td>Alice</td><td>$5,000</td></tr>
        </table></body></html>";
        let md = project(html).expect("projection succeeds");
        assert!(md.contains("| Rank | Player | Wagered |"), "got: {md}");
        assert!(md.contains(r"| 1 | Alice | \$5,000 |"), "dollars escaped: {md}");
    }

    #[test]
    fn noise_is_stripped() {
        let html = r#"<html><body>
            <nav>Home About</nav>
            <div class="cookie-banner">Accept cookies</div>
            <div style="display: none">invisible</div>
            <div aria-hidden="true">also invisible</div>
            <p>Real content</p>
            <footer>legal</footer>
        </body></html>"#;
        let md = project(html).expect("projection succeeds");
        assert!(md.contains("Real content"));
        for gone in ["Home About", "Accept cookies", "invisible", "legal"] {
            assert!(!md.contains(gone), "{gone:?} should be stripped; got: {md}");
        }
    }

    #[test]
    fn headings_lists_and_links() {
        let html = r#"<html><body>
            <h3>LuckyOne</h3>
            <ul><li>Wagered: $100</li></ul>
            <a href="/u/bob">Bob</a>
            <img alt="avatar" src="https://cdn.example/a/b/face.png">
        </body></html>"#;
        let md = project(html).expect("projection succeeds");
        assert!(md.contains("### LuckyOne"), "got: {md}");
        assert!(md.contains(r"- Wagered: \$100"), "got: {md}");
        assert!(md.contains("[Bob](/u/bob)"), "got: {md}");
        assert!(md.contains("![avatar](face.png)"), "got: {md}");
    }

    #[test]
    fn output_is_capped() {
        let big = format!(
            "<html><body><p>{}</p></body></html>",
            "x".repeat(MAX_MARKDOWN_BYTES * 2)
        );
        let md = project(&big).expect("projection succeeds");
        assert!(md.len() <= MAX_MARKDOWN_BYTES);
    }
}
