//! Database models for the storage layer.
//!
//! These types map directly to rows of the `reports` table. They are
//! separate from [`Document`] so that column naming (snake_case) and JSONB
//! decoding stay here.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use report_core::{AccessLevel, Document, Filters, ReportId, decode_blocks};

use crate::primary::RemoteChange;

/// Database row for the `reports` table.
#[derive(Debug, Clone, FromRow)]
pub struct ReportRow {
    pub id: String,
    pub title: String,
    pub blocks: Value,
    pub access_level: String,
    pub category: String,
    pub filters: Value,
    pub favorite: bool,
    pub last_writer: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReportRow {
    /// Converts the row into a document, tolerating malformed columns.
    ///
    /// Blocks are decoded but not migrated; migration is the caller's job.
    #[must_use]
    pub fn into_document(self) -> Document {
        let access_level = self.access_level.parse().unwrap_or_else(|_| {
            tracing::warn!(report_id = %self.id, access_level = %self.access_level, "Unknown access level; treating as edit");
            AccessLevel::Edit
        });
        let filters = match self.filters {
            Value::Null => Filters::default(),
            value => Filters::deserialize(value).unwrap_or_else(|e| {
                tracing::warn!(report_id = %self.id, error = %e, "Malformed filters; using defaults");
                Filters::default()
            }),
        };

        Document {
            id: ReportId(self.id),
            title: self.title,
            blocks: decode_blocks(self.blocks),
            access_level,
            category: self.category,
            filters,
            favorite: self.favorite,
            created_at: Some(self.created_at),
            updated_at: Some(self.updated_at),
        }
    }
}

impl ReportRow {
    /// The change this row announces, attributed to the row's own
    /// `last_writer` so content and writer always belong to the same write.
    #[must_use]
    pub fn into_change(self) -> RemoteChange {
        let writer = self.last_writer;
        RemoteChange {
            document: self.into_document(),
            writer,
        }
    }
}

/// Column values for an upsert.
#[derive(Debug, Clone)]
pub struct NewReportRow {
    pub id: String,
    pub title: String,
    pub blocks: Value,
    pub access_level: String,
    pub category: String,
    pub filters: Value,
    pub favorite: bool,
}

impl NewReportRow {
    /// Builds the row for `doc`.
    pub fn from_document(doc: &Document) -> serde_json::Result<Self> {
        Ok(Self {
            id: doc.id.0.clone(),
            title: doc.title.clone(),
            blocks: serde_json::to_value(&doc.blocks)?,
            access_level: doc.access_level.as_str().to_string(),
            category: doc.category.clone(),
            filters: serde_json::to_value(&doc.filters)?,
            favorite: doc.favorite,
        })
    }
}

/// Payload of a `report_changes` notification.
///
/// `writer` is the writer at notification time. The row may have been
/// written again before it is fetched.
#[derive(Debug, Clone, Deserialize)]
pub struct ChangeNotice {
    pub id: String,
    pub writer: Option<Uuid>,
}
