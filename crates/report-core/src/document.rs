//! Document model operations.
//!
//! These mutate the in-memory block list of one [`Document`]. Mutations on a
//! read-only document are silent no-ops; they return `None`/`false` so the
//! caller can tell nothing happened, but they are not errors. Shadow edits
//! on read-only documents go through [`crate::shadow`] and [`update`].

use rand::Rng;

use crate::block::{Block, BlockKind};
use crate::catalog::{self, PlaceholderShape};
use crate::convert::{self, ViewType};
use crate::error::{CoreError, CoreResult};
use crate::text;
use crate::types::{BlockId, Document};

/// Builds a new block of `kind` with a fresh id and placeholder content.
///
/// Tables and charts sample their data with `shape`, or with a random
/// shape (1-5 metrics, 5-10 dimension values) when `shape` is `None`.
pub fn new_block<R: Rng + ?Sized>(
    kind: BlockKind,
    shape: Option<PlaceholderShape>,
    rng: &mut R,
) -> Block {
    match kind {
        BlockKind::Text => Block::empty_text(),
        BlockKind::Separator => Block::separator(),
        BlockKind::Table => {
            let shape = shape.unwrap_or_else(|| PlaceholderShape::random(rng));
            Block::Table(catalog::placeholder_table(rng, BlockId::generate(), shape))
        }
        BlockKind::Chart => {
            let shape = shape.unwrap_or_else(|| PlaceholderShape::random(rng));
            Block::Chart(catalog::placeholder_chart(rng, BlockId::generate(), shape))
        }
    }
}

/// Inserts a new placeholder block at `index` (clamped to the end).
pub fn insert<R: Rng + ?Sized>(
    doc: &mut Document,
    kind: BlockKind,
    index: usize,
    rng: &mut R,
) -> Option<BlockId> {
    insert_with_shape(doc, kind, index, None, rng)
}

/// Like [`insert`], with a fixed placeholder shape for tables and charts.
pub fn insert_with_shape<R: Rng + ?Sized>(
    doc: &mut Document,
    kind: BlockKind,
    index: usize,
    shape: Option<PlaceholderShape>,
    rng: &mut R,
) -> Option<BlockId> {
    if doc.is_read_only() {
        return None;
    }
    let block = new_block(kind, shape, rng);
    let id = block.id().clone();
    let index = index.min(doc.blocks.len());
    doc.blocks.insert(index, block);
    tracing::debug!(report_id = %doc.id, block_id = %id, %kind, index, "Inserted block");
    Some(id)
}

/// Returns the index of the block with `id`.
#[must_use]
pub fn position(doc: &Document, id: &BlockId) -> Option<usize> {
    doc.blocks.iter().position(|b| b.id() == id)
}

/// Returns the block with `id`.
#[must_use]
pub fn find<'a>(doc: &'a Document, id: &BlockId) -> Option<&'a Block> {
    doc.blocks.iter().find(|b| b.id() == id)
}

/// Replaces the block with the same id by full value.
///
/// Applies to read-only documents too: the in-memory view of a read-only
/// document is where shadow edits land.
pub fn update(doc: &mut Document, block: Block) -> bool {
    match doc.blocks.iter_mut().find(|b| b.id() == block.id()) {
        Some(slot) => {
            *slot = block;
            true
        }
        None => false,
    }
}

/// Removes the block with `id`.
pub fn delete(doc: &mut Document, id: &BlockId) -> bool {
    if doc.is_read_only() {
        return false;
    }
    match position(doc, id) {
        Some(index) => {
            doc.blocks.remove(index);
            true
        }
        None => false,
    }
}

/// Moves the block at `from` to `to`, keeping every other block's relative
/// order. A missing destination means the drag was cancelled.
pub fn reorder(doc: &mut Document, from: usize, to: Option<usize>) -> bool {
    let Some(to) = to else {
        return false;
    };
    if doc.is_read_only() || from >= doc.blocks.len() {
        return false;
    }
    let to = to.min(doc.blocks.len() - 1);
    if from == to {
        return true;
    }
    let block = doc.blocks.remove(from);
    doc.blocks.insert(to, block);
    true
}

/// Inserts a separator right after the block with `id`, then a fresh empty
/// text block after the separator. Returns the ids of both new blocks.
pub fn insert_separator_and_split(
    doc: &mut Document,
    id: &BlockId,
) -> Option<(BlockId, BlockId)> {
    if doc.is_read_only() {
        return None;
    }
    let index = position(doc, id)?;
    let separator = Block::separator();
    let text = Block::empty_text();
    let ids = (separator.id().clone(), text.id().clone());
    doc.blocks.insert(index + 1, separator);
    doc.blocks.insert(index + 2, text);
    Some(ids)
}

/// Handles the `---` marker in a text block.
///
/// If a line of the block's content is exactly `---`, that line is removed
/// and the block is split with [`insert_separator_and_split`].
pub fn apply_separator_marker(doc: &mut Document, id: &BlockId) -> Option<(BlockId, BlockId)> {
    if doc.is_read_only() {
        return None;
    }
    let index = position(doc, id)?;
    let Block::Text(block) = &mut doc.blocks[index] else {
        return None;
    };
    block.content = text::strip_separator_marker(&block.content)?;
    insert_separator_and_split(doc, id)
}

/// Switches a chart or table block to another view type.
///
/// Returns `Ok(false)` for read-only documents.
pub fn convert(doc: &mut Document, id: &BlockId, to: ViewType) -> CoreResult<bool> {
    if doc.is_read_only() {
        return Ok(false);
    }
    let index = position(doc, id).ok_or_else(|| CoreError::BlockNotFound(id.clone()))?;
    let block = doc.blocks[index].clone();
    doc.blocks[index] = convert::convert_block(block, to)?;
    Ok(true)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::arb;
    use crate::migrate::migrate;
    use crate::types::AccessLevel;
    use proptest::{prop_assert, prop_assert_eq, proptest};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn doc() -> Document {
        Document::new("r1", "Report").with_blocks(vec![
            Block::text("a", "A"),
            Block::text("b", "B"),
            Block::text("c", "C"),
        ])
    }

    fn ids(doc: &Document) -> Vec<&str> {
        doc.blocks.iter().map(|b| b.id().as_str()).collect()
    }

    #[test]
    fn insert_table_with_shape() {
        let mut doc = doc();
        let mut rng = StdRng::seed_from_u64(5);
        let shape = PlaceholderShape {
            metrics: 3,
            dimensions: 7,
        };
        let id = insert_with_shape(&mut doc, BlockKind::Table, 1, Some(shape), &mut rng).unwrap();
        assert_eq!(doc.blocks[1].id(), &id);
        let Block::Table(table) = &doc.blocks[1] else {
            panic!("Expected table");
        };
        assert_eq!(table.data.headers.len(), 4);
        assert_eq!(table.data.rows.len(), 7);
        assert!(table.data.rows.iter().all(|r| r.len() == 4));
    }

    #[test]
    fn insert_generates_unique_ids() {
        let mut doc = doc();
        let mut rng = StdRng::seed_from_u64(1);
        let a = insert(&mut doc, BlockKind::Text, 0, &mut rng).unwrap();
        let b = insert(&mut doc, BlockKind::Chart, 100, &mut rng).unwrap();
        assert_ne!(a, b);
        assert_eq!(doc.blocks.first().map(Block::id), Some(&a));
        assert_eq!(doc.blocks.last().map(Block::id), Some(&b));
    }

    #[test]
    fn read_only_mutations_are_no_ops() {
        let mut doc = doc().with_access_level(AccessLevel::Read);
        let mut rng = StdRng::seed_from_u64(1);
        let before = doc.clone();
        assert!(insert(&mut doc, BlockKind::Text, 0, &mut rng).is_none());
        assert!(!delete(&mut doc, &BlockId::from("a")));
        assert!(!reorder(&mut doc, 0, Some(2)));
        assert!(insert_separator_and_split(&mut doc, &BlockId::from("a")).is_none());
        assert_eq!(doc, before);
    }

    #[test]
    fn update_replaces_by_id() {
        let mut doc = doc();
        assert!(update(&mut doc, Block::text("b", "changed")));
        assert_eq!(doc.blocks[1], Block::text("b", "changed"));
        assert!(!update(&mut doc, Block::text("zz", "nope")));
        assert_eq!(doc.blocks.len(), 3);
    }

    #[test]
    fn delete_missing_is_no_op() {
        let mut doc = doc();
        assert!(!delete(&mut doc, &BlockId::from("zz")));
        assert!(delete(&mut doc, &BlockId::from("b")));
        assert_eq!(ids(&doc), vec!["a", "c"]);
    }

    #[test]
    fn reorder_preserves_relative_order() {
        let mut doc = doc();
        assert!(reorder(&mut doc, 0, Some(2)));
        assert_eq!(ids(&doc), vec!["b", "c", "a"]);
        assert!(reorder(&mut doc, 2, Some(0)));
        assert_eq!(ids(&doc), vec!["a", "b", "c"]);
        assert!(!reorder(&mut doc, 1, None));
        assert_eq!(ids(&doc), vec!["a", "b", "c"]);
    }

    #[test]
    fn marker_splits_text_block() {
        let mut doc = doc();
        update(&mut doc, Block::text("b", "---"));
        let (sep, txt) = apply_separator_marker(&mut doc, &BlockId::from("b")).unwrap();
        assert_eq!(doc.blocks.len(), 5);
        assert_eq!(doc.blocks[1], Block::text("b", ""));
        assert_eq!(doc.blocks[2].id(), &sep);
        assert_eq!(doc.blocks[2].kind(), BlockKind::Separator);
        let expected = Block::Text(crate::block::TextBlock {
            id: txt,
            content: String::new(),
        });
        assert_eq!(doc.blocks[3], expected);
        assert_eq!(doc.blocks[4].id().as_str(), "c");
    }

    #[test]
    fn no_marker_no_split() {
        let mut doc = doc();
        assert!(apply_separator_marker(&mut doc, &BlockId::from("a")).is_none());
        assert_eq!(doc.blocks.len(), 3);
    }

    #[test]
    fn convert_missing_block_errors() {
        let mut doc = doc();
        let err = convert(&mut doc, &BlockId::from("zz"), ViewType::Table).unwrap_err();
        assert_eq!(err, CoreError::BlockNotFound(BlockId::from("zz")));
    }

    proptest! {
        #[test]
        fn edit_sequences_keep_every_block_in_shape(
            blocks in arb::blocks(),
            edits in arb::edits(),
        ) {
            let mut doc = Document::new("r1", "Report").with_blocks(migrate(blocks));
            let mut rng = arb::rng();
            for edit in &edits {
                arb::apply(&mut doc, edit, &mut rng);
                for block in &doc.blocks {
                    prop_assert_eq!(arb::shape_violation(block), None, "after {:?}", edit);
                }
                let ids: HashSet<_> = doc.blocks.iter().map(Block::id).collect();
                prop_assert!(ids.len() == doc.blocks.len(), "duplicate id after {:?}", edit);
            }
        }
    }
}
