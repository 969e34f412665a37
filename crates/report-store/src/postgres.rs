//! PostgreSQL primary store.
//!
//! Reports live in one table with JSONB `blocks` and `filters`. A trigger
//! announces every update on the `report_changes` channel; a background
//! listener task turns those notices into [`RemoteChange`]s.

use std::time::Duration;

use sqlx::postgres::{PgListener, PgPool, PgPoolOptions};
use tokio::sync::broadcast;
use uuid::Uuid;

use report_core::{Document, ReportId};

use crate::error::{StoreError, StoreResult};
use crate::models::{ChangeNotice, NewReportRow, ReportRow};
use crate::primary::{CHANGE_CHANNEL_CAPACITY, PrimaryStore, RemoteChange};
use crate::schema::{self, CHANGE_CHANNEL};
use crate::store::StoreConfig;

/// Delay before the change listener reconnects.
const LISTENER_RETRY: Duration = Duration::from_secs(5);

const SELECT_COLUMNS: &str = "id, title, blocks, access_level, category, filters, favorite, \
                              last_writer, created_at, updated_at";

/// Report storage in PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgReportStore {
    pool: PgPool,
    changes: broadcast::Sender<RemoteChange>,
}

impl PgReportStore {
    /// Connect to the database with the given configuration.
    ///
    /// Runs migrations if `config.run_migrations` is true. If the database
    /// cannot be reached, a lazy pool is used instead so that every call
    /// fails over to the local tier until the database comes back.
    ///
    /// Must be called within a Tokio runtime: the change listener is
    /// spawned here.
    pub async fn connect(config: &StoreConfig) -> StoreResult<Self> {
        let url = config
            .database_url
            .as_deref()
            .ok_or_else(|| StoreError::ConfigError("DATABASE_URL is not set".to_string()))?;

        tracing::info!("Connecting to database...");

        let options = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections);

        let pool = match options.clone().connect(url).await {
            Ok(pool) => {
                tracing::info!("Connected to database");
                if config.run_migrations {
                    schema::run_migrations(&pool).await?;
                }
                pool
            }
            Err(e) => {
                tracing::warn!(error = %e, "Database unreachable; reports fall back to the local store until it returns");
                options.connect_lazy(url)?
            }
        };

        Ok(Self::from_pool(pool))
    }

    /// Create a store from an existing connection pool.
    ///
    /// Must be called within a Tokio runtime.
    pub fn from_pool(pool: PgPool) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        let store = Self { pool, changes };
        tokio::spawn(listen(store.pool.clone(), store.changes.clone()));
        store
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn fetch_row(&self, id: &str) -> StoreResult<Option<ReportRow>> {
        let query = format!("SELECT {SELECT_COLUMNS} FROM reports WHERE id = $1");
        Ok(sqlx::query_as::<_, ReportRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }
}

impl PrimaryStore for PgReportStore {
    async fn fetch(&self, id: &ReportId) -> StoreResult<Option<Document>> {
        Ok(self.fetch_row(id.as_str()).await?.map(ReportRow::into_document))
    }

    async fn upsert(&self, doc: &Document, writer: Uuid) -> StoreResult<()> {
        let row = NewReportRow::from_document(doc)?;
        sqlx::query(
            r#"
            INSERT INTO reports (id, title, blocks, access_level, category, filters, favorite, last_writer)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO UPDATE SET
                title = EXCLUDED.title,
                blocks = EXCLUDED.blocks,
                access_level = EXCLUDED.access_level,
                category = EXCLUDED.category,
                filters = EXCLUDED.filters,
                favorite = EXCLUDED.favorite,
                last_writer = EXCLUDED.last_writer
            "#,
        )
        .bind(&row.id)
        .bind(&row.title)
        .bind(&row.blocks)
        .bind(&row.access_level)
        .bind(&row.category)
        .bind(&row.filters)
        .bind(row.favorite)
        .bind(writer)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list(&self) -> StoreResult<Vec<Document>> {
        let query = format!("SELECT {SELECT_COLUMNS} FROM reports ORDER BY updated_at DESC");
        let rows = sqlx::query_as::<_, ReportRow>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(ReportRow::into_document).collect())
    }

    fn changes(&self) -> broadcast::Receiver<RemoteChange> {
        self.changes.subscribe()
    }
}

/// Forwards `report_changes` notifications, reconnecting on failure.
async fn listen(pool: PgPool, changes: broadcast::Sender<RemoteChange>) {
    loop {
        match PgListener::connect_with(&pool).await {
            Ok(mut listener) => {
                if let Err(e) = listener.listen(CHANGE_CHANNEL).await {
                    tracing::warn!(error = %e, "Failed to LISTEN for report changes");
                } else {
                    tracing::debug!(channel = CHANGE_CHANNEL, "Listening for report changes");
                    loop {
                        match listener.recv().await {
                            Ok(notification) => {
                                forward(&pool, &changes, notification.payload()).await;
                            }
                            Err(e) => {
                                tracing::warn!(error = %e, "Report change listener lost its connection");
                                break;
                            }
                        }
                    }
                }
            }
            Err(e) => {
                tracing::debug!(error = %e, "Report change listener cannot connect");
            }
        }
        tokio::time::sleep(LISTENER_RETRY).await;
    }
}

async fn forward(pool: &PgPool, changes: &broadcast::Sender<RemoteChange>, payload: &str) {
    let notice: ChangeNotice = match serde_json::from_str(payload) {
        Ok(notice) => notice,
        Err(e) => {
            tracing::warn!(error = %e, payload, "Malformed report change notice");
            return;
        }
    };

    let query = format!("SELECT {SELECT_COLUMNS} FROM reports WHERE id = $1");
    match sqlx::query_as::<_, ReportRow>(&query)
        .bind(&notice.id)
        .fetch_optional(pool)
        .await
    {
        Ok(Some(row)) => {
            if row.last_writer != notice.writer {
                tracing::debug!(report_id = %notice.id, "Report rewritten before its change was fetched");
            }
            let _ = changes.send(row.into_change());
        }
        Ok(None) => tracing::debug!(report_id = %notice.id, "Changed report vanished before fetch"),
        Err(e) => tracing::warn!(report_id = %notice.id, error = %e, "Failed to fetch changed report"),
    }
}
