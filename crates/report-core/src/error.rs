//! Error types for the document model.

use thiserror::Error;

use crate::types::BlockId;

/// Result type alias for document model operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised while parsing or addressing report content.
///
/// Mutations on read-only documents are not errors; they are no-ops.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Block kind tag is not one of text, table, chart, separator.
    #[error("unknown block kind: {0}")]
    UnknownBlockKind(String),

    /// Chart type is not one of line, bar, pie, advanced.
    #[error("unknown chart type: {0}")]
    UnknownChartType(String),

    /// Access level is not `edit` or `read`.
    #[error("unknown access level: {0}")]
    UnknownAccessLevel(String),

    /// No block with this id in the document.
    #[error("block not found: {0}")]
    BlockNotFound(BlockId),

    /// The operation only applies to chart and table blocks.
    #[error("block {0} is not a chart or table")]
    NotDataBlock(BlockId),
}
