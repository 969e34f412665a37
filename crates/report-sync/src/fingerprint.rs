//! Change fingerprints.
//!
//! A fingerprint covers exactly what autosave persists: blocks, title,
//! time period, selected dimensions and the favorite flag. Two documents
//! with equal fingerprints need no save between them.

use std::fmt;

use serde::Serialize;

use report_core::{Block, Document};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Snapshot<'a> {
    blocks: &'a [Block],
    title: &'a str,
    time_period: &'a str,
    selected_dimensions: &'a [String],
    favorite: bool,
}

/// Digest of the persisted parts of a document.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Fingerprints `doc`.
    #[must_use]
    pub fn of(doc: &Document) -> Self {
        let snapshot = Snapshot {
            blocks: &doc.blocks,
            title: &doc.title,
            time_period: &doc.filters.time_period,
            selected_dimensions: &doc.filters.selected_dimensions,
            favorite: doc.favorite,
        };
        let mut hasher = blake3::Hasher::new();
        if let Err(e) = serde_json::to_writer(&mut hasher, &snapshot) {
            tracing::warn!(report_id = %doc.id, error = %e, "Failed to serialize report for fingerprinting");
        }
        Self(*hasher.finalize().as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", blake3::Hash::from(self.0).to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use report_core::AccessLevel;

    #[test]
    fn covers_persisted_fields() {
        let doc = Document::new("r1", "Weekly").with_blocks(vec![Block::text("a", "hi")]);
        let base = Fingerprint::of(&doc);

        let mut titled = doc.clone();
        titled.title = "Monthly".to_string();
        assert_ne!(Fingerprint::of(&titled), base);

        let mut filtered = doc.clone();
        filtered.filters.selected_dimensions = vec!["Jan".to_string()];
        assert_ne!(Fingerprint::of(&filtered), base);

        let mut favorite = doc.clone();
        favorite.favorite = true;
        assert_ne!(Fingerprint::of(&favorite), base);
    }

    #[test]
    fn ignores_metadata_outside_the_snapshot() {
        let doc = Document::new("r1", "Weekly");
        let shared = doc
            .clone()
            .with_access_level(AccessLevel::Read)
            .with_category("shared-with-me");
        assert_eq!(Fingerprint::of(&doc), Fingerprint::of(&shared));
    }
}
