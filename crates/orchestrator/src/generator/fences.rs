//! Extraction of fenced code blocks from model output.

use std::sync::OnceLock;

use regex::Regex;

/// A fenced block: the language tag after the opening backticks and the
/// trimmed body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FencedBlock {
    pub tag: String,
    pub content: String,
}

fn fence_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // An unterminated final block runs to the end of the text.
    PATTERN.get_or_init(|| {
        Regex::new(r"(?s)```[ \t]*([A-Za-z0-9_+.\-]*)[^\n]*\n(.*?)(?:```|\z)")
            .expect("Invalid fence regex pattern")
    })
}

/// Returns every fenced block in `text`, in order of appearance.
pub fn parse_fenced_blocks(text: &str) -> Vec<FencedBlock> {
    fence_pattern()
        .captures_iter(text)
        .map(|caps| FencedBlock {
            tag: caps
                .get(1)
                .map(|m| m.as_str().to_ascii_lowercase())
                .unwrap_or_default(),
            content: caps
                .get(2)
                .map(|m| m.as_str().trim().to_string())
                .unwrap_or_default(),
        })
        .collect()
}

/// First block carrying one of `tags`. Earlier tags win over later ones, so
/// `["markdown", "md"]` prefers a `markdown` block even if an `md` block
/// comes first.
pub fn first_block_tagged<'a>(blocks: &'a [FencedBlock], tags: &[&str]) -> Option<&'a str> {
    tags.iter().find_map(|tag| {
        blocks
            .iter()
            .find(|block| block.tag == *tag)
            .map(|block| block.content.as_str())
    })
}
