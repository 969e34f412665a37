//! The tiered report store.
//!
//! [`ReportStore`] tries the primary store first and falls back to the local
//! snapshot. Its `load`, `save` and `list_all` never fail: tier errors are
//! logged and turn into fallback behaviour, so callers always get a value.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::broadcast;
use uuid::Uuid;

use report_core::{Block, Document, ReportId};

use crate::error::{StoreError, StoreResult};
use crate::local::{FileKeyValueStore, LocalReports};
use crate::postgres::PgReportStore;
use crate::primary::{PrimaryStore, RemoteChange};

/// Default directory of the local snapshot.
pub const DEFAULT_LOCAL_DIR: &str = "./.report-data";

/// Default namespace of local snapshot keys.
pub const DEFAULT_NAMESPACE: &str = "cl-blocks";

/// Configuration for the report store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Database connection URL. `None` runs without a primary store.
    pub database_url: Option<String>,
    /// Maximum number of connections in the pool.
    pub max_connections: u32,
    /// Minimum number of connections to maintain.
    pub min_connections: u32,
    /// Run migrations on connect.
    pub run_migrations: bool,
    /// Directory of the local snapshot files.
    pub local_dir: PathBuf,
    /// Prefix of local snapshot keys.
    pub namespace: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            max_connections: 10,
            min_connections: 1,
            run_migrations: true,
            local_dir: PathBuf::from(DEFAULT_LOCAL_DIR),
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }
}

impl StoreConfig {
    /// Create configuration from environment variables.
    ///
    /// Reads:
    /// - `DATABASE_URL` - Optional; without it only the local snapshot is used
    /// - `DATABASE_MAX_CONNECTIONS` - Optional, defaults to 10
    /// - `DATABASE_MIN_CONNECTIONS` - Optional, defaults to 1
    /// - `DATABASE_RUN_MIGRATIONS` - Optional, defaults to true
    /// - `REPORT_LOCAL_DIR` - Optional, defaults to `./.report-data`
    /// - `REPORT_NAMESPACE` - Optional, defaults to `cl-blocks`
    pub fn from_env() -> StoreResult<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        let max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10);

        let min_connections = std::env::var("DATABASE_MIN_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(1);

        let run_migrations = std::env::var("DATABASE_RUN_MIGRATIONS")
            .ok()
            .map(|s| s.to_lowercase() != "false" && s != "0")
            .unwrap_or(true);

        let local_dir = std::env::var("REPORT_LOCAL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_LOCAL_DIR));

        let namespace =
            std::env::var("REPORT_NAMESPACE").unwrap_or_else(|_| DEFAULT_NAMESPACE.to_string());
        if namespace.trim().is_empty() {
            return Err(StoreError::ConfigError(
                "REPORT_NAMESPACE must not be empty".to_string(),
            ));
        }

        Ok(Self {
            database_url,
            max_connections,
            min_connections,
            run_migrations,
            local_dir,
            namespace,
        })
    }
}

// ============================================================================
// Subscription
// ============================================================================

/// Push updates for one report.
///
/// Yields each externally sourced update of the report, migrated. Updates
/// written through a store with the same origin are skipped.
#[derive(Debug)]
pub struct ReportSubscription {
    report_id: ReportId,
    origin: Uuid,
    receiver: broadcast::Receiver<RemoteChange>,
}

impl ReportSubscription {
    pub fn report_id(&self) -> &ReportId {
        &self.report_id
    }

    /// Waits for the next update. `None` once the feed has closed.
    pub async fn recv(&mut self) -> Option<Document> {
        loop {
            match self.receiver.recv().await {
                Ok(change) => {
                    if change.document.id != self.report_id || change.writer == Some(self.origin) {
                        continue;
                    }
                    return Some(change.document.migrated());
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::warn!(report_id = %self.report_id, missed, "Report subscription fell behind");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

// ============================================================================
// Tiered store
// ============================================================================

/// Report persistence over an optional primary store and a local snapshot.
///
/// Every instance carries an origin tag that is attached to its primary
/// writes. Subscriptions opened through the same origin do not see those
/// writes come back.
#[derive(Debug, Clone)]
pub struct ReportStore<P = PgReportStore> {
    primary: Option<P>,
    local: LocalReports,
    origin: Uuid,
}

impl ReportStore<PgReportStore> {
    /// Builds the store described by `config`: PostgreSQL when a database
    /// URL is configured, and a file-backed local snapshot.
    pub async fn from_config(config: &StoreConfig) -> StoreResult<Self> {
        let local = LocalReports::new(
            Arc::new(FileKeyValueStore::new(&config.local_dir)),
            config.namespace.clone(),
        );
        let primary = match config.database_url {
            Some(_) => Some(PgReportStore::connect(config).await?),
            None => {
                tracing::warn!("DATABASE_URL not set; reports are kept in the local snapshot only");
                None
            }
        };
        Ok(Self::new(primary, local))
    }
}

impl<P: PrimaryStore> ReportStore<P> {
    pub fn new(primary: Option<P>, local: LocalReports) -> Self {
        Self {
            primary,
            local,
            origin: Uuid::new_v4(),
        }
    }

    /// Store without a primary: local snapshot only, no realtime.
    pub fn local_only(local: LocalReports) -> Self {
        Self::new(None, local)
    }

    /// Same tiers, writing and subscribing as `origin`.
    #[must_use]
    pub fn for_origin(&self, origin: Uuid) -> Self {
        Self {
            origin,
            ..self.clone()
        }
    }

    pub fn origin(&self) -> Uuid {
        self.origin
    }

    pub fn is_primary_configured(&self) -> bool {
        self.primary.is_some()
    }

    pub fn local(&self) -> &LocalReports {
        &self.local
    }

    /// Loads a report, migrated. `None` if neither tier has it.
    pub async fn load(&self, id: &ReportId) -> Option<Document> {
        if let Some(primary) = &self.primary {
            match primary.fetch(id).await {
                Ok(Some(doc)) => {
                    tracing::debug!(report_id = %id, "Loaded report from primary store");
                    return Some(doc.migrated());
                }
                Ok(None) => tracing::debug!(report_id = %id, "Report not in primary store"),
                Err(e) => {
                    tracing::warn!(report_id = %id, error = %e, "Primary load failed; trying local snapshot");
                }
            }
        }

        let key = id.clone();
        match self.on_local(move |local| local.get(&key)).await {
            Ok(Some(doc)) => {
                tracing::debug!(report_id = %id, "Loaded report from local snapshot");
                Some(doc.migrated())
            }
            Ok(None) => {
                tracing::debug!(report_id = %id, "Report not found");
                None
            }
            Err(e) => {
                tracing::warn!(report_id = %id, error = %e, "Local snapshot load failed");
                None
            }
        }
    }

    /// Upserts a report. True if it was persisted to either tier.
    pub async fn save(&self, doc: &Document) -> bool {
        if let Some(primary) = &self.primary {
            match primary.upsert(doc, self.origin).await {
                Ok(()) => {
                    tracing::debug!(report_id = %doc.id, "Saved report to primary store");
                    return true;
                }
                Err(e) => {
                    tracing::warn!(report_id = %doc.id, error = %e, "Primary save failed; writing local snapshot");
                }
            }
        }

        let snapshot = doc.clone();
        match self.on_local(move |local| local.upsert(&snapshot)).await {
            Ok(()) => {
                tracing::debug!(report_id = %doc.id, "Saved report to local snapshot");
                true
            }
            Err(e) => {
                tracing::error!(report_id = %doc.id, error = %e, "Report could not be saved anywhere");
                false
            }
        }
    }

    /// Lists every report, migrated. Most recently updated first when the
    /// primary store answers.
    pub async fn list_all(&self) -> Vec<Document> {
        if let Some(primary) = &self.primary {
            match primary.list().await {
                Ok(docs) => return docs.into_iter().map(Document::migrated).collect(),
                Err(e) => {
                    tracing::warn!(error = %e, "Primary list failed; reading local snapshot");
                }
            }
        }

        match self.on_local(|local| local.all()).await {
            Ok(docs) => docs.into_iter().map(Document::migrated).collect(),
            Err(e) => {
                tracing::warn!(error = %e, "Local snapshot list failed");
                Vec::new()
            }
        }
    }

    /// Blocks of the legacy single-document snapshot, if one exists.
    pub async fn legacy_blocks(&self) -> StoreResult<Option<Vec<Block>>> {
        self.on_local(|local| local.legacy_blocks()).await
    }

    /// Runs a local snapshot operation off the async runtime; the file
    /// store does blocking I/O.
    async fn on_local<T, F>(&self, op: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&LocalReports) -> StoreResult<T> + Send + 'static,
    {
        let local = self.local.clone();
        tokio::task::spawn_blocking(move || op(&local)).await?
    }

    /// Subscribes to external updates of one report.
    ///
    /// `None` without a primary store: the local snapshot has no realtime.
    pub fn subscribe(&self, id: &ReportId) -> Option<ReportSubscription> {
        let primary = self.primary.as_ref()?;
        tracing::debug!(report_id = %id, origin = %self.origin, "Subscribed to report changes");
        Some(ReportSubscription {
            report_id: id.clone(),
            origin: self.origin,
            receiver: primary.changes(),
        })
    }

    /// Ends a subscription. Accepts `None`, and is harmless to repeat.
    pub fn unsubscribe(&self, subscription: Option<ReportSubscription>) {
        if let Some(subscription) = subscription {
            tracing::debug!(report_id = %subscription.report_id, "Unsubscribed from report changes");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primary::MemoryPrimary;
    use std::time::Duration;

    fn tiered() -> (ReportStore<MemoryPrimary>, MemoryPrimary) {
        let primary = MemoryPrimary::new();
        let store = ReportStore::new(Some(primary.clone()), LocalReports::in_memory("cl-blocks"));
        (store, primary)
    }

    #[tokio::test]
    async fn load_missing_everywhere_is_none() {
        let (store, _) = tiered();
        assert!(store.load(&ReportId::from("nope")).await.is_none());
    }

    #[tokio::test]
    async fn save_falls_back_to_local_when_primary_fails() {
        let (store, primary) = tiered();
        primary.set_offline(true);

        let doc = Document::new("r1", "X").with_blocks(vec![Block::text("a", "hello")]);
        assert!(store.save(&doc).await);

        let local = store.local().get(&ReportId::from("r1")).unwrap().unwrap();
        assert_eq!(local.title, "X");

        let loaded = store.load(&ReportId::from("r1")).await.unwrap();
        assert_eq!(loaded.blocks, doc.blocks);
    }

    #[tokio::test]
    async fn primary_not_found_falls_back_to_local() {
        let (store, _) = tiered();
        store.local().upsert(&Document::new("old", "Local copy")).unwrap();
        let loaded = store.load(&ReportId::from("old")).await.unwrap();
        assert_eq!(loaded.title, "Local copy");
    }

    #[tokio::test]
    async fn list_prefers_primary() {
        let (store, primary) = tiered();
        store.local().upsert(&Document::new("local", "L")).unwrap();
        store.save(&Document::new("p1", "P1")).await;
        store.save(&Document::new("p2", "P2")).await;

        let ids: Vec<String> = store.list_all().await.into_iter().map(|d| d.id.0).collect();
        assert_eq!(ids, vec!["p2", "p1"]);

        primary.set_offline(true);
        let ids: Vec<String> = store.list_all().await.into_iter().map(|d| d.id.0).collect();
        assert_eq!(ids, vec!["local"]);
    }

    #[tokio::test]
    async fn loads_are_migrated() {
        let (store, _) = tiered();
        let legacy: Document = serde_json::from_value(serde_json::json!({
            "id": "r1",
            "blocks": [{"id": "t", "type": "table", "data": {"headers": ["Column 1"], "rows": []}}]
        }))
        .unwrap();
        store.save(&legacy).await;
        let loaded = store.load(&ReportId::from("r1")).await.unwrap();
        let Block::Table(table) = &loaded.blocks[0] else {
            panic!("Expected table");
        };
        assert!(table.data.headers.len() >= 2);
        assert!(table.has_title());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_saves_to_file_snapshot_all_persist() {
        let dir = tempfile::tempdir().unwrap();
        let local = LocalReports::new(Arc::new(FileKeyValueStore::new(dir.path())), "cl-blocks");
        let store: ReportStore<MemoryPrimary> = ReportStore::local_only(local);

        let saves: Vec<_> = (0..16)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move { store.save(&Document::new(format!("r{i}"), "T")).await })
            })
            .collect();
        for save in saves {
            assert!(save.await.unwrap());
        }

        assert_eq!(store.list_all().await.len(), 16);
        assert_eq!(store.load(&ReportId::from("r7")).await.unwrap().title, "T");
    }

    #[tokio::test]
    async fn local_only_has_no_subscriptions() {
        let store: ReportStore<MemoryPrimary> =
            ReportStore::local_only(LocalReports::in_memory("cl-blocks"));
        assert!(!store.is_primary_configured());
        assert!(store.subscribe(&ReportId::from("r1")).is_none());
        store.unsubscribe(None);
        assert!(store.save(&Document::new("r1", "X")).await);
    }

    #[tokio::test]
    async fn subscription_skips_own_writes_and_other_reports() {
        let (editor, _) = tiered();
        let other = editor.for_origin(Uuid::new_v4());
        let id = ReportId::from("r1");

        editor.save(&Document::new("r1", "v1")).await;
        editor.save(&Document::new("r2", "v1")).await;
        let mut sub = editor.subscribe(&id).unwrap();

        editor.save(&Document::new("r1", "own write")).await;
        other.save(&Document::new("r2", "other report")).await;
        other.save(&Document::new("r1", "from elsewhere")).await;

        let doc = tokio::time::timeout(Duration::from_secs(1), sub.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc.title, "from elsewhere");
        editor.unsubscribe(Some(sub));
    }
}
