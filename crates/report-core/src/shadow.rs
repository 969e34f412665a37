//! Local edits on read-only reports.
//!
//! A reader may still play with a shared report. Their edits land in the
//! in-memory document only; [`ShadowEdits`] remembers which blocks differ
//! and what each looked like before its first edit, so any block can be
//! reverted. Nothing here is ever persisted.

use std::collections::{HashMap, HashSet};

use crate::block::Block;
use crate::document;
use crate::types::{BlockId, Document};

/// Modified block ids and their pre-edit originals for one viewing session.
#[derive(Debug, Clone, Default)]
pub struct ShadowEdits {
    modified: HashSet<BlockId>,
    originals: HashMap<BlockId, Block>,
}

impl ShadowEdits {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies `edited` to the in-memory document.
    ///
    /// On the first difference for a block its current value is kept as the
    /// original. Returns false if the block is unknown or unchanged.
    pub fn apply_edit(&mut self, doc: &mut Document, edited: Block) -> bool {
        let Some(current) = document::find(doc, edited.id()) else {
            return false;
        };
        if *current == edited {
            return false;
        }

        let id = edited.id().clone();
        self.originals
            .entry(id.clone())
            .or_insert_with(|| current.clone());
        self.modified.insert(id);
        document::update(doc, edited)
    }

    /// Restores the original of block `id`. No-op if it was never edited.
    pub fn revert(&mut self, doc: &mut Document, id: &BlockId) -> bool {
        let Some(original) = self.originals.remove(id) else {
            return false;
        };
        self.modified.remove(id);
        document::update(doc, original)
    }

    /// Forgets every shadow edit. Called whenever a document is (re)loaded.
    pub fn reset(&mut self) {
        self.modified.clear();
        self.originals.clear();
    }

    #[must_use]
    pub fn is_modified(&self, id: &BlockId) -> bool {
        self.modified.contains(id)
    }

    /// Ids of blocks that differ from what was loaded.
    pub fn modified_ids(&self) -> impl Iterator<Item = &BlockId> {
        self.modified.iter()
    }

    #[must_use]
    pub fn original(&self, id: &BlockId) -> Option<&Block> {
        self.originals.get(id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modified.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AccessLevel;

    fn doc() -> Document {
        Document::new("shared-1", "Shared")
            .with_access_level(AccessLevel::Read)
            .with_blocks(vec![Block::text("a", "one"), Block::text("b", "two")])
    }

    #[test]
    fn edit_then_revert_restores_original() {
        let mut doc = doc();
        let mut shadow = ShadowEdits::new();
        let id = BlockId::from("a");

        assert!(shadow.apply_edit(&mut doc, Block::text("a", "first")));
        assert!(shadow.apply_edit(&mut doc, Block::text("a", "second")));
        assert!(shadow.is_modified(&id));
        assert_eq!(shadow.original(&id), Some(&Block::text("a", "one")));
        assert_eq!(doc.blocks[0], Block::text("a", "second"));

        assert!(shadow.revert(&mut doc, &id));
        assert_eq!(doc.blocks[0], Block::text("a", "one"));
        assert!(!shadow.is_modified(&id));
        assert!(shadow.original(&id).is_none());
    }

    #[test]
    fn identical_edit_is_ignored() {
        let mut doc = doc();
        let mut shadow = ShadowEdits::new();
        assert!(!shadow.apply_edit(&mut doc, Block::text("b", "two")));
        assert!(shadow.is_empty());
    }

    #[test]
    fn revert_unknown_is_no_op() {
        let mut doc = doc();
        let before = doc.clone();
        let mut shadow = ShadowEdits::new();
        assert!(!shadow.revert(&mut doc, &BlockId::from("a")));
        assert_eq!(doc, before);
    }

    #[test]
    fn reset_clears_everything() {
        let mut doc = doc();
        let mut shadow = ShadowEdits::new();
        shadow.apply_edit(&mut doc, Block::text("b", "changed"));
        shadow.reset();
        assert!(shadow.is_empty());
        assert_eq!(shadow.modified_ids().count(), 0);
    }
}
