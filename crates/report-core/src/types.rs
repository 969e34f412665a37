//! Core data types for the report editor.
//!
//! A report is an ordered list of heterogeneous blocks plus metadata:
//!
//! - Identity (an opaque string id, stable for the report's lifetime)
//! - Presentation metadata (title, category, favorite flag)
//! - Access level (`edit` persists mutations, `read` shadows them locally)
//! - View filters (time period and selected dimension values)
//!
//! All types derive `Debug`, `Clone`, `Serialize`, and `Deserialize`. The JSON
//! shape uses camelCase keys, matching what the local snapshot store holds.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::block::Block;

/// Default time period for a report's filters.
pub const DEFAULT_TIME_PERIOD: &str = "Last 4 weeks";

/// Time periods offered by the filter bar.
pub const TIME_PERIODS: &[&str] = &[
    "Last 7 days",
    "Last 2 weeks",
    "Last 4 weeks",
    "Last 8 weeks",
    "Last 12 weeks",
    "Last 6 months",
    "Last year",
    "Custom range",
];

/// Category for reports owned by the current user.
pub const CATEGORY_MY_REPORTS: &str = "my-reports";

/// Category for reports shared with the current user.
pub const CATEGORY_SHARED: &str = "shared-with-me";

// ============================================================================
// ID Types
// ============================================================================

/// Identifier of a block within a report.
///
/// Opaque string, unique within its report and never reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(pub String);

impl BlockId {
    /// Generates a fresh block id.
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("block-{}", Uuid::new_v4().simple()))
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BlockId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for BlockId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Identifier of a report.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportId(pub String);

impl ReportId {
    /// Generates a fresh report id.
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("report-{}", Uuid::new_v4().simple()))
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ReportId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ReportId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// ============================================================================
// Access Level
// ============================================================================

/// Whether mutations on a report persist.
///
/// This is a stored flag, not a security boundary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    /// Mutations persist through the report store.
    #[default]
    Edit,
    /// Mutations stay local and can be reverted.
    Read,
}

impl AccessLevel {
    /// Returns the wire name (`edit` or `read`).
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Edit => "edit",
            Self::Read => "read",
        }
    }

    /// Returns true for read-only access.
    #[must_use]
    pub const fn is_read_only(&self) -> bool {
        matches!(self, Self::Read)
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccessLevel {
    type Err = crate::error::CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "edit" => Ok(Self::Edit),
            "read" => Ok(Self::Read),
            other => Err(crate::error::CoreError::UnknownAccessLevel(other.to_string())),
        }
    }
}

// ============================================================================
// Filters
// ============================================================================

/// User-selected view filters stored with a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filters {
    /// Selected time period. Stored but inert for projection.
    #[serde(default = "default_time_period")]
    pub time_period: String,
    /// Dimension values to keep. Empty means no filtering.
    #[serde(default)]
    pub selected_dimensions: Vec<String>,
}

fn default_time_period() -> String {
    DEFAULT_TIME_PERIOD.to_string()
}

impl Default for Filters {
    fn default() -> Self {
        Self {
            time_period: default_time_period(),
            selected_dimensions: Vec::new(),
        }
    }
}

impl Filters {
    /// Returns true when these filters would not change any block.
    #[must_use]
    pub fn is_pass_through(&self) -> bool {
        self.selected_dimensions.is_empty()
    }
}

// ============================================================================
// Document
// ============================================================================

/// A report: ordered blocks plus metadata.
///
/// Block order is render order. Block ids are unique within a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: ReportId,
    #[serde(default)]
    pub title: String,
    #[serde(default, deserialize_with = "crate::block::decode_block_list")]
    pub blocks: Vec<Block>,
    #[serde(default)]
    pub access_level: AccessLevel,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub filters: Filters,
    #[serde(default)]
    pub favorite: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_category() -> String {
    CATEGORY_MY_REPORTS.to_string()
}

impl Document {
    /// Creates an empty editable report in the `my-reports` category.
    #[must_use]
    pub fn new(id: impl Into<ReportId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            blocks: Vec::new(),
            access_level: AccessLevel::Edit,
            category: default_category(),
            filters: Filters::default(),
            favorite: false,
            created_at: None,
            updated_at: None,
        }
    }

    /// Builder-style setter for the blocks.
    #[must_use]
    pub fn with_blocks(mut self, blocks: Vec<Block>) -> Self {
        self.blocks = blocks;
        self
    }

    /// Builder-style setter for the access level.
    #[must_use]
    pub fn with_access_level(mut self, access_level: AccessLevel) -> Self {
        self.access_level = access_level;
        self
    }

    /// Builder-style setter for the category.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Returns true if mutations on this report must not persist.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.access_level.is_read_only()
    }

    /// Title for display, falling back to "New report".
    #[must_use]
    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            "New report"
        } else {
            &self.title
        }
    }

    /// Runs block migration over this document's blocks.
    #[must_use]
    pub fn migrated(mut self) -> Self {
        self.blocks = crate::migrate::migrate(self.blocks);
        self
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_ids_are_unique() {
        let a = BlockId::generate();
        let b = BlockId::generate();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("block-"));
    }

    #[test]
    fn access_level_parses_wire_names() {
        assert_eq!("edit".parse::<AccessLevel>().unwrap(), AccessLevel::Edit);
        assert_eq!("read".parse::<AccessLevel>().unwrap(), AccessLevel::Read);
        assert!("admin".parse::<AccessLevel>().is_err());
    }

    #[test]
    fn document_defaults_fill_missing_fields() {
        let doc: Document = serde_json::from_str(r#"{"id":"r1"}"#).unwrap();
        assert_eq!(doc.title, "");
        assert!(doc.blocks.is_empty());
        assert_eq!(doc.access_level, AccessLevel::Edit);
        assert_eq!(doc.category, CATEGORY_MY_REPORTS);
        assert_eq!(doc.filters.time_period, DEFAULT_TIME_PERIOD);
        assert!(!doc.favorite);
    }

    #[test]
    fn document_uses_camel_case_keys() {
        let doc = Document::new("r1", "X").with_access_level(AccessLevel::Read);
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["accessLevel"], "read");
        assert_eq!(json["filters"]["timePeriod"], DEFAULT_TIME_PERIOD);
        assert!(json["filters"]["selectedDimensions"].is_array());
        assert!(json.get("createdAt").is_none());
    }

    #[test]
    fn display_title_falls_back() {
        assert_eq!(Document::new("r1", "").display_title(), "New report");
        assert_eq!(Document::new("r1", "Q4").display_title(), "Q4");
    }
}
