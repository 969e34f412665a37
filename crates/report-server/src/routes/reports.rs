//! Report routes.
//!
//! - GET /reports - List reports, grouped for the sidebar
//! - POST /reports/init - Create the sample reports if none exist
//! - GET /reports/{id} - Fetch one report, optionally with filters applied
//! - PUT /reports/{id} - Create or replace a report
//! - GET /reports/{id}/outline - Heading outline of a report

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use report_core::{Document, Heading, ReportId, outline, projection};
use report_sync::{ReportGroups, group_reports, initialize_reports};

use crate::error::{ApiError, ApiResult};
use crate::extract::ClientId;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Response for GET /reports.
#[derive(Debug, Serialize)]
pub struct ListReportsResponse {
    pub groups: ReportGroups,
    pub reports: Vec<Document>,
}

/// Response for POST /reports/init.
#[derive(Debug, Serialize)]
pub struct InitResponse {
    /// Ids of the reports created; empty when reports already existed.
    pub created: Vec<ReportId>,
}

/// Query parameters for GET /reports/{id}.
#[derive(Debug, Default, Deserialize)]
pub struct ReadQuery {
    /// Apply the stored filters to chart and table blocks.
    #[serde(default)]
    pub projected: bool,
}

/// Response for PUT /reports/{id}.
#[derive(Debug, Serialize)]
pub struct SaveResponse {
    pub id: ReportId,
    pub saved: bool,
}

// ============================================================================
// Helpers
// ============================================================================

/// Loads a report or answers 404.
pub(crate) async fn load_report(state: &AppState, id: &ReportId) -> ApiResult<Document> {
    state
        .store()
        .load(id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Report {id} not found")))
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /reports - List every report.
async fn list_reports(State(state): State<AppState>) -> Json<ListReportsResponse> {
    let reports = state.store().list_all().await;
    Json(ListReportsResponse {
        groups: group_reports(&reports),
        reports,
    })
}

/// POST /reports/init - Create the sample reports when the store is empty.
async fn init_reports(State(state): State<AppState>) -> Json<InitResponse> {
    let mut rng = StdRng::from_entropy();
    let created = initialize_reports(state.store(), &mut rng).await;
    tracing::info!(created = created.len(), "Report initialization requested");
    Json(InitResponse { created })
}

/// GET /reports/{id} - Fetch a report.
///
/// With `?projected=true` the report's selected dimensions are applied to
/// its chart and table blocks. The stored report is never changed.
async fn get_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ReadQuery>,
) -> ApiResult<Json<Document>> {
    let doc = load_report(&state, &ReportId::from(id)).await?;
    if query.projected {
        Ok(Json(projection::project_document(&doc)))
    } else {
        Ok(Json(doc))
    }
}

/// PUT /reports/{id} - Create or replace a report.
///
/// The body is a full document whose id must match the path.
async fn put_report(
    State(state): State<AppState>,
    ClientId(client): ClientId,
    Path(id): Path<String>,
    Json(doc): Json<Document>,
) -> ApiResult<Json<SaveResponse>> {
    if doc.id.as_str() != id {
        return Err(ApiError::BadRequest(format!(
            "Body id {} does not match path id {id}",
            doc.id
        )));
    }

    let doc = doc.migrated();
    let _edit = state.lock_report(&doc.id).await;
    if !state.store_for(client).save(&doc).await {
        return Err(ApiError::Internal(format!("Report {id} could not be saved")));
    }
    state.broadcaster().publish_report(&doc, client).await;

    Ok(Json(SaveResponse {
        id: doc.id,
        saved: true,
    }))
}

/// GET /reports/{id}/outline - Headings of a report, in block order.
async fn get_outline(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<Heading>>> {
    let doc = load_report(&state, &ReportId::from(id)).await?;
    Ok(Json(outline(&doc.blocks)))
}

/// Build report routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/reports", get(list_reports))
        .route("/reports/init", post(init_reports))
        .route("/reports/{id}", get(get_report).put(put_report))
        .route("/reports/{id}/outline", get(get_outline))
}
