//! report-store: Storage layer for the report editor
//!
//! This crate provides:
//! - PostgreSQL storage for reports, with JSONB block and filter columns
//! - Realtime update notifications via LISTEN/NOTIFY
//! - A local key-value snapshot used whenever the primary store is
//!   unconfigured or failing
//! - The tiered [`ReportStore`] whose load/save/list never fail
//!
//! # Usage
//!
//! ```rust,ignore
//! use report_store::{ReportStore, StoreConfig};
//!
//! let config = StoreConfig::from_env()?;
//! let store = ReportStore::from_config(&config).await?;
//!
//! if let Some(doc) = store.load(&"my-reports-1".into()).await {
//!     store.save(&doc).await;
//! }
//! ```

pub mod error;
pub mod local;
pub mod models;
pub mod postgres;
pub mod primary;
pub mod schema;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use local::{FileKeyValueStore, KeyValueStore, LocalReports, MemoryKeyValueStore};
pub use models::{ChangeNotice, NewReportRow, ReportRow};
pub use postgres::PgReportStore;
pub use primary::{MemoryPrimary, PrimaryStore, RemoteChange};
pub use store::{ReportStore, ReportSubscription, StoreConfig};

// Re-export report-core for downstream crates
pub use report_core;
