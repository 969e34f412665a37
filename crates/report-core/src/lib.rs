//! report-core: Block document model for the report editor
//!
//! This crate provides:
//! - Block variants (text, table, chart, separator) with lenient decoding
//! - Legacy shape migration
//! - Document model operations (insert, update, delete, reorder, split, convert)
//! - Metric and dimension edit helpers for a single data block
//! - Heading outline extraction
//! - Filter projection for display
//! - Read-only shadow edits with revert
//! - Sample metric/dimension catalogs and placeholder generators
//! - The intent extraction contract
//!
//! Everything here is synchronous and free of I/O. Persistence lives in
//! `report-store`, sessions and autosave in `report-sync`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use report_core::{BlockKind, Document, document};
//!
//! let mut doc = Document::new("r1", "Weekly");
//! let id = document::insert(&mut doc, BlockKind::Table, 0, &mut rand::thread_rng());
//! ```

pub mod block;
pub mod catalog;
pub mod convert;
pub mod document;
pub mod error;
pub mod intent;
pub mod metrics;
pub mod migrate;
pub mod outline;
pub mod projection;
pub mod shadow;
pub mod text;
pub mod title;
pub mod types;

#[cfg(test)]
pub(crate) mod arb;

pub use block::{
    Block, BlockKind, ChartBlock, ChartType, DataPoint, SeparatorBlock, TableBlock, TableData,
    TextBlock, decode_blocks,
};
pub use error::{CoreError, CoreResult};
pub use intent::{Intent, IntentSource, keyword_intent};
pub use migrate::{BLOCK_SCHEMA_VERSION, LegacySignal, migrate};
pub use outline::{Heading, outline};
pub use projection::project;
pub use shadow::ShadowEdits;
pub use title::synthesize_title;
pub use types::*;
