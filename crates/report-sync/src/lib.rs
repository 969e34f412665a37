//! report-sync: Editing sessions for the report editor
//!
//! This crate provides:
//! - [`EditorSession`]: one open report with debounced autosave, read-only
//!   shadow routing and realtime reconciliation
//! - Change fingerprints that keep remote updates from echoing as saves
//! - Report resolution for `"default"` and unknown ids
//! - Sample report initialization
//! - Sidebar grouping of the report library
//!
//! # Usage
//!
//! ```rust,ignore
//! use report_sync::{EditorSession, SessionEvent};
//!
//! let mut session = EditorSession::new(store);
//! session.open(&"my-reports-1".into()).await?;
//! session.set_title("Weekly numbers")?;
//!
//! loop {
//!     match session.next_event().await {
//!         SessionEvent::RemoteApplied => redraw(session.document()),
//!         SessionEvent::Saved { persisted } => show_saved(persisted),
//!         SessionEvent::SubscriptionClosed => break,
//!     }
//! }
//! ```

pub mod error;
pub mod fingerprint;
pub mod library;
pub mod resolve;
pub mod seed;
pub mod session;

pub use error::{SyncError, SyncResult};
pub use fingerprint::Fingerprint;
pub use library::{ReportEntry, ReportGroups, group_reports};
pub use resolve::{DEFAULT_REPORT, Resolution, resolve_report};
pub use seed::{FIRST_SAMPLE_REPORT, initialize_reports, sample_blocks};
pub use session::{AUTOSAVE_DELAY, EditorSession, SessionEvent, SessionState};
