//! Line-prefix block parser.
//!
//! `# ` → H1, `## ` → H2, `### ` → H3, any other non-blank line → paragraph.
//! Blank lines are dropped and ids are a 1-based counter over the kept lines.
//! Blocks following an H2 are tagged with its text; question H3s inside an
//! FAQ section become FAQ blocks.

use crate::document::{Block, BlockId, BlockKind, H2_LABEL_TAG};

/// Parse raw text into an ordered block sequence.
pub fn parse_blocks(raw_text: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut next_id = 0usize;
    let mut section: Option<String> = None;

    for line in raw_text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        next_id += 1;

        let (kind, text) = classify(trimmed);
        let mut block = Block::new(BlockId::from(next_id), kind, text);

        match kind {
            BlockKind::H1 => section = None,
            BlockKind::H2 => section = Some(block.text.clone()),
            _ => {
                if let Some(label) = &section {
                    if kind == BlockKind::H3 && is_faq_heading(label) && block.text.ends_with('?') {
                        block.kind = BlockKind::Faq;
                    }
                    block.tags.insert(H2_LABEL_TAG.into(), label.clone());
                }
            }
        }

        blocks.push(block);
    }

    blocks
}

/// Whether a section heading introduces an FAQ section.
pub fn is_faq_heading(text: &str) -> bool {
    let normalized = text.trim().trim_end_matches('?').trim().to_lowercase();
    normalized == "faq" || normalized == "faqs" || normalized.starts_with("frequently asked")
}

fn classify(line: &str) -> (BlockKind, &str) {
    if let Some(rest) = line.strip_prefix("### ") {
        (BlockKind::H3, rest.trim())
    } else if let Some(rest) = line.strip_prefix("## ") {
        (BlockKind::H2, rest.trim())
    } else if let Some(rest) = line.strip_prefix("# ") {
        (BlockKind::H1, rest.trim())
    } else {
        (BlockKind::Paragraph, line)
    }
}
