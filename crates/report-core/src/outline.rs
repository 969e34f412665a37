//! Heading outline of a report.
//!
//! Recomputed on demand from text block content; never stored.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::block::Block;
use crate::text::plain_text;
use crate::types::BlockId;

static HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<h([12])\b[^>]*>(.*?)</h[12]\s*>").expect("valid regex")
});

/// One H1 or H2 heading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Heading {
    pub level: u8,
    pub text: String,
    pub block_id: BlockId,
    pub block_index: usize,
}

/// Collects headings in block order, then document order within a block.
/// Headings with no text are skipped.
#[must_use]
pub fn outline(blocks: &[Block]) -> Vec<Heading> {
    let mut headings = Vec::new();
    for (block_index, block) in blocks.iter().enumerate() {
        let Block::Text(text) = block else {
            continue;
        };
        for caps in HEADING.captures_iter(&text.content) {
            let level = if &caps[1] == "1" { 1 } else { 2 };
            let label = plain_text(&caps[2]).trim().to_string();
            if label.is_empty() {
                continue;
            }
            headings.push(Heading {
                level,
                text: label,
                block_id: text.id.clone(),
                block_index,
            });
        }
    }
    headings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headings_follow_block_then_document_order() {
        let blocks = vec![
            Block::text(
                "a",
                "<h2>Second level</h2><p>x</p><h1 class=\"big\">Top <em>one</em></h1>",
            ),
            Block::separator(),
            Block::text("b", "<h3>ignored</h3><H1>Later</H1>"),
        ];
        let headings = outline(&blocks);
        let labels: Vec<(&str, u8, usize)> = headings
            .iter()
            .map(|h| (h.text.as_str(), h.level, h.block_index))
            .collect();
        assert_eq!(
            labels,
            vec![("Second level", 2, 0), ("Top one", 1, 0), ("Later", 1, 2)]
        );
        assert_eq!(headings[2].block_id.as_str(), "b");
    }

    #[test]
    fn empty_headings_are_skipped() {
        assert!(outline(&[Block::text("a", "<h1> </h1><h2><br></h2>")]).is_empty());
    }
}
