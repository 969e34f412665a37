//! Application state shared across handlers.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use report_core::ReportId;
use report_store::ReportStore;

use crate::config::ServerConfig;
use crate::events::EventBroadcaster;

/// Application state shared across all handlers.
///
/// This is cloneable and can be extracted in handlers using `State<AppState>`.
#[derive(Clone)]
pub struct AppState {
    store: Arc<ReportStore>,
    config: Arc<ServerConfig>,
    broadcaster: Arc<EventBroadcaster>,
    edit_locks: Arc<ReportLocks>,
}

/// One async mutex per report, so load-modify-save sequences on the same
/// report run one at a time.
#[derive(Debug, Default)]
pub struct ReportLocks {
    locks: Mutex<HashMap<ReportId, Arc<Mutex<()>>>>,
}

impl ReportLocks {
    /// Waits until no other handler holds `id`.
    pub async fn lock(&self, id: &ReportId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            // Entries only referenced by the map have no holder or waiter.
            locks.retain(|key, lock| key == id || Arc::strong_count(lock) > 1);
            Arc::clone(locks.entry(id.clone()).or_default())
        };
        lock.lock_owned().await
    }

    /// Number of reports with a lock entry.
    pub async fn tracked_reports(&self) -> usize {
        self.locks.lock().await.len()
    }
}

impl AppState {
    pub fn new(store: ReportStore, config: ServerConfig) -> Self {
        Self {
            store: Arc::new(store),
            config: Arc::new(config),
            broadcaster: Arc::new(EventBroadcaster::new()),
            edit_locks: Arc::new(ReportLocks::default()),
        }
    }

    /// The report store, writing as the server itself.
    pub fn store(&self) -> &ReportStore {
        &self.store
    }

    /// The report store, writing as `client` when it identified itself.
    ///
    /// Writes tagged this way are skipped by that client's own subscription.
    pub fn store_for(&self, client: Option<Uuid>) -> ReportStore {
        match client {
            Some(origin) => self.store.for_origin(origin),
            None => self.store.as_ref().clone(),
        }
    }

    /// Serializes read-modify-write of report `id` until the guard drops.
    pub async fn lock_report(&self, id: &ReportId) -> OwnedMutexGuard<()> {
        self.edit_locks.lock(id).await
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn broadcaster(&self) -> &Arc<EventBroadcaster> {
        &self.broadcaster
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("primary", &self.store.is_primary_configured())
            .finish_non_exhaustive()
    }
}
