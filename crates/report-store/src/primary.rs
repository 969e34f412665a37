//! The primary backing store contract.
//!
//! A primary store supports upsert-by-id, fetch-by-id, list ordered by most
//! recent update, and a feed of update notifications. [`crate::PgReportStore`]
//! is the production implementation; [`MemoryPrimary`] keeps everything in
//! process and can be switched offline, which is what the tiered store tests
//! and single-process setups use.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use chrono::Utc;
use tokio::sync::{RwLock, broadcast};
use uuid::Uuid;

use report_core::{Document, ReportId};

use crate::error::{StoreError, StoreResult};

/// Capacity of change notification channels.
pub const CHANGE_CHANNEL_CAPACITY: usize = 256;

/// An update announced by the primary store.
#[derive(Debug, Clone)]
pub struct RemoteChange {
    /// The document as stored after the update (blocks not yet migrated).
    pub document: Document,
    /// Origin tag of the writer, if it supplied one.
    pub writer: Option<Uuid>,
}

/// Operations the tiered store needs from its primary.
pub trait PrimaryStore: Clone + Send + Sync + 'static {
    /// Fetches a report. `Ok(None)` when absent.
    fn fetch(&self, id: &ReportId)
    -> impl Future<Output = StoreResult<Option<Document>>> + Send;

    /// Creates or fully replaces a report, tagging the write with `writer`.
    fn upsert(&self, doc: &Document, writer: Uuid) -> impl Future<Output = StoreResult<()>> + Send;

    /// Lists every report, most recently updated first.
    fn list(&self) -> impl Future<Output = StoreResult<Vec<Document>>> + Send;

    /// Receives a [`RemoteChange`] for every update of an existing report.
    fn changes(&self) -> broadcast::Receiver<RemoteChange>;
}

// ============================================================================
// In-process primary
// ============================================================================

#[derive(Debug)]
struct StoredReport {
    document: Document,
    sequence: u64,
}

#[derive(Debug)]
struct MemoryInner {
    reports: RwLock<HashMap<ReportId, StoredReport>>,
    sequence: AtomicU64,
    offline: AtomicBool,
    changes: broadcast::Sender<RemoteChange>,
}

/// In-process primary store.
///
/// Mirrors the database semantics: upserts replace whole documents, inserts
/// are silent, updates are announced on the change feed.
#[derive(Debug, Clone)]
pub struct MemoryPrimary {
    inner: Arc<MemoryInner>,
}

impl Default for MemoryPrimary {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryPrimary {
    #[must_use]
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(MemoryInner {
                reports: RwLock::new(HashMap::new()),
                sequence: AtomicU64::new(0),
                offline: AtomicBool::new(false),
                changes,
            }),
        }
    }

    /// While offline every operation fails with [`StoreError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.inner.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> StoreResult<()> {
        if self.inner.offline.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("in-memory primary is offline".to_string()))
        } else {
            Ok(())
        }
    }
}

impl PrimaryStore for MemoryPrimary {
    async fn fetch(&self, id: &ReportId) -> StoreResult<Option<Document>> {
        self.check_online()?;
        let reports = self.inner.reports.read().await;
        Ok(reports.get(id).map(|stored| stored.document.clone()))
    }

    async fn upsert(&self, doc: &Document, writer: Uuid) -> StoreResult<()> {
        self.check_online()?;
        let now = Utc::now();
        let sequence = self.inner.sequence.fetch_add(1, Ordering::SeqCst);

        let mut document = doc.clone();
        document.updated_at = Some(now);

        let mut reports = self.inner.reports.write().await;
        let existed = match reports.get(&doc.id) {
            Some(previous) => {
                document.created_at = previous.document.created_at;
                true
            }
            None => {
                document.created_at = Some(now);
                false
            }
        };
        reports.insert(
            doc.id.clone(),
            StoredReport {
                document: document.clone(),
                sequence,
            },
        );
        drop(reports);

        if existed {
            let _ = self.inner.changes.send(RemoteChange {
                document,
                writer: Some(writer),
            });
        }
        Ok(())
    }

    async fn list(&self) -> StoreResult<Vec<Document>> {
        self.check_online()?;
        let reports = self.inner.reports.read().await;
        let mut stored: Vec<&StoredReport> = reports.values().collect();
        stored.sort_by(|a, b| b.sequence.cmp(&a.sequence));
        Ok(stored.into_iter().map(|s| s.document.clone()).collect())
    }

    fn changes(&self) -> broadcast::Receiver<RemoteChange> {
        self.inner.changes.subscribe()
    }
}
