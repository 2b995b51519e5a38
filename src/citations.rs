//! Citation parsing and inline linking for generated reports
//!
//! A report arrives as markdown with a trailing reference section:
//!
//! ```text
//! Findings [1] are notable [2].
//!
//! ## References
//! [1] [Title A](http://a.example)
//! *snippet a*
//! ```
//!
//! `parse_citations` builds an index from the reference entries and
//! `link_citations` rewrites bare `[n]` markers in the body into anchors.
//! Numbering is taken verbatim from the source; missing or malformed
//! entries are simply absent from the index, never an error.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;

// Compiled regex patterns
static HEADING_PATTERN: OnceLock<Regex> = OnceLock::new();
static ENTRY_PATTERN: OnceLock<Regex> = OnceLock::new();
static WHITESPACE_PATTERN: OnceLock<Regex> = OnceLock::new();
static MARKER_PATTERN: OnceLock<Regex> = OnceLock::new();

fn get_heading_pattern() -> &'static Regex {
    HEADING_PATTERN.get_or_init(|| Regex::new(r"(?m)^#{0,3}\s*References\s*$").unwrap())
}

fn get_entry_pattern() -> &'static Regex {
    ENTRY_PATTERN.get_or_init(|| {
        Regex::new(r"(?s)\[(\d+)\] \[(.*?)\]\((https?://\S+)\)\s*\n\*(.*?)\*").unwrap()
    })
}

fn get_whitespace_pattern() -> &'static Regex {
    WHITESPACE_PATTERN.get_or_init(|| Regex::new(r"\s+").unwrap())
}

fn get_marker_pattern() -> &'static Regex {
    MARKER_PATTERN.get_or_init(|| {
        Regex::new(r#"(?s)<sup><a href="[^"]*"[^>]*>\[\d+\]</a></sup>|\[(\d+)\]"#).unwrap()
    })
}

/// One resolved reference entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// Citation number -> entry, rebuilt on demand from report text
pub type CitationIndex = BTreeMap<u32, Citation>;

/// Split a report at the first recognized reference-section heading.
/// Returns (body, reference section). Reports without a reference section
/// keep everything in the body.
pub fn split_report(content: &str) -> (&str, &str) {
    match get_heading_pattern().find(content) {
        Some(m) => (&content[..m.start()], &content[m.start()..]),
        None => (content, ""),
    }
}

/// Parse reference entries of the form `[n] [title](url)` followed by an
/// italic snippet line.
pub fn parse_citations(refs: &str) -> CitationIndex {
    let mut index = CitationIndex::new();
    for cap in get_entry_pattern().captures_iter(refs) {
        let number: u32 = match cap[1].parse() {
            Ok(n) => n,
            Err(_) => continue, // out-of-range numbers are not entries
        };
        index.insert(
            number,
            Citation {
                title: clean_title(&cap[2]),
                url: cap[3].trim().to_string(),
                snippet: cap[4].replace('\n', " ").trim().to_string(),
            },
        );
    }
    index
}

/// Collapse multi-line titles to a single line and strip known
/// document-type noise prefixes.
fn clean_title(raw: &str) -> String {
    let collapsed = get_whitespace_pattern()
        .replace_all(raw.trim(), " ")
        .to_string();
    collapsed.replace("[PDF] ", "")
}

/// Rewrite bare `[n]` markers into superscript anchors using the index.
///
/// Markers without an index entry stay untouched. Already-linked markers
/// are matched as a whole unit and passed through unchanged, which makes
/// repeated application a no-op.
pub fn link_citations(body: &str, index: &CitationIndex) -> String {
    get_marker_pattern()
        .replace_all(body, |cap: &regex::Captures| {
            let bare = match cap.get(1) {
                Some(m) => m,
                None => return cap[0].to_string(), // already linked
            };
            let number: u32 = match bare.as_str().parse() {
                Ok(n) => n,
                Err(_) => return cap[0].to_string(),
            };
            match index.get(&number) {
                Some(citation) => format!(
                    r#"<sup><a href="{}" target="_blank">[{}]</a></sup>"#,
                    citation.url, number
                ),
                None => cap[0].to_string(),
            }
        })
        .to_string()
}

/// Full pipeline: split, parse, link, and reattach the reference section.
pub fn render_report(content: &str) -> String {
    let (body, refs) = split_report(content);
    let index = parse_citations(refs);
    let linked = link_citations(body, &index);
    if refs.is_empty() {
        linked
    } else {
        format!("{}{}", linked, refs)
    }
}
