//! Error types for editing sessions.

use thiserror::Error;

use report_core::{CoreError, ReportId};

/// Result type alias for session operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors raised by an editing session.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Neither store tier has the report.
    #[error("report not found: {0}")]
    NotFound(ReportId),

    /// The session has no open report.
    #[error("no report is open")]
    NoDocument,

    /// A document model operation was rejected.
    #[error(transparent)]
    Core(#[from] CoreError),
}
