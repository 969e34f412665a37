//! Block routes: the document model operations over HTTP.
//!
//! - POST /reports/{id}/blocks - Insert a placeholder block
//! - POST /reports/{id}/blocks/move - Reorder blocks
//! - PUT /reports/{id}/blocks/{block_id} - Replace a block by full value
//! - DELETE /reports/{id}/blocks/{block_id} - Delete a block
//! - POST /reports/{id}/blocks/{block_id}/convert - Switch view type
//! - POST /reports/{id}/blocks/{block_id}/split - Insert a separator after a block
//! - POST /reports/{id}/blocks/{block_id}/metrics - Add a metric
//! - DELETE /reports/{id}/blocks/{block_id}/metrics/{index} - Remove a metric
//! - POST /reports/{id}/blocks/{block_id}/dimensions - Add a dimension value
//! - DELETE /reports/{id}/blocks/{block_id}/dimensions/{index} - Remove a dimension value
//!
//! Every mutation loads the report, applies one operation and saves the
//! result tagged with the caller's client id. Mutations of one report are
//! serialized. Read-only reports are left untouched and the response says
//! `"applied": false`.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{post, put},
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use report_core::convert::ViewType;
use report_core::{Block, BlockId, BlockKind, CoreError, Document, ReportId, document, metrics};

use crate::error::{ApiError, ApiResult};
use crate::extract::ClientId;
use crate::routes::reports::load_report;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for POST /reports/{id}/blocks.
#[derive(Debug, Deserialize)]
pub struct InsertBlockRequest {
    pub kind: BlockKind,
    /// Position of the new block. Defaults to the end.
    #[serde(default)]
    pub index: Option<usize>,
}

/// Request body for POST /reports/{id}/blocks/move.
#[derive(Debug, Deserialize)]
pub struct MoveBlockRequest {
    pub from: usize,
    /// Destination index. Absent means the drag was cancelled.
    #[serde(default)]
    pub to: Option<usize>,
}

/// Request body for POST /reports/{id}/blocks/{block_id}/convert.
#[derive(Debug, Deserialize)]
pub struct ConvertBlockRequest {
    /// `table`, `line`, `bar`, `pie` or `advanced`.
    pub to: String,
}

/// Response for every block mutation.
#[derive(Debug, Default, Serialize)]
pub struct MutationResponse {
    /// False when the operation was a no-op, e.g. on a read-only report.
    pub applied: bool,
    /// Ids of blocks the operation created.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub created: Vec<BlockId>,
}

/// What an operation did to the document.
enum Outcome {
    Unchanged,
    Changed(Vec<BlockId>),
}

impl From<bool> for Outcome {
    fn from(changed: bool) -> Self {
        if changed {
            Self::Changed(Vec::new())
        } else {
            Self::Unchanged
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Loads report `id`, applies `op` and saves the result if it changed.
///
/// Holds the report's edit lock from load through publish.
async fn mutate<F>(
    state: &AppState,
    client: Option<uuid::Uuid>,
    id: String,
    op: F,
) -> ApiResult<Json<MutationResponse>>
where
    F: FnOnce(&mut Document) -> ApiResult<Outcome>,
{
    let id = ReportId::from(id);
    let _edit = state.lock_report(&id).await;
    let mut doc = load_report(state, &id).await?;
    if doc.is_read_only() {
        tracing::debug!(report_id = %id, "Ignoring mutation of read-only report");
        return Ok(Json(MutationResponse::default()));
    }

    let created = match op(&mut doc)? {
        Outcome::Unchanged => return Ok(Json(MutationResponse::default())),
        Outcome::Changed(created) => created,
    };

    if !state.store_for(client).save(&doc).await {
        return Err(ApiError::Internal(format!("Report {id} could not be saved")));
    }
    state.broadcaster().publish_report(&doc, client).await;

    Ok(Json(MutationResponse {
        applied: true,
        created,
    }))
}

fn find_block<'a>(doc: &'a Document, id: &BlockId) -> ApiResult<&'a Block> {
    document::find(doc, id).ok_or_else(|| CoreError::BlockNotFound(id.clone()).into())
}

/// Replaces a data block with the result of a metric/dimension helper.
fn edit_data_block(
    doc: &mut Document,
    id: &BlockId,
    edit: impl FnOnce(&Block) -> Option<Block>,
) -> ApiResult<Outcome> {
    let block = find_block(doc, id)?;
    if !matches!(block, Block::Table(_) | Block::Chart(_)) {
        return Err(CoreError::NotDataBlock(id.clone()).into());
    }
    Ok(match edit(block) {
        Some(edited) => document::update(doc, edited).into(),
        None => Outcome::Unchanged,
    })
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /reports/{id}/blocks - Insert a placeholder block.
async fn insert_block(
    State(state): State<AppState>,
    ClientId(client): ClientId,
    Path(id): Path<String>,
    Json(request): Json<InsertBlockRequest>,
) -> ApiResult<Json<MutationResponse>> {
    let mut rng = StdRng::from_entropy();
    mutate(&state, client, id, |doc| {
        let index = request.index.unwrap_or(doc.blocks.len());
        Ok(match document::insert(doc, request.kind, index, &mut rng) {
            Some(block_id) => Outcome::Changed(vec![block_id]),
            None => Outcome::Unchanged,
        })
    })
    .await
}

/// POST /reports/{id}/blocks/move - Move a block to another index.
async fn move_block(
    State(state): State<AppState>,
    ClientId(client): ClientId,
    Path(id): Path<String>,
    Json(request): Json<MoveBlockRequest>,
) -> ApiResult<Json<MutationResponse>> {
    mutate(&state, client, id, |doc| {
        Ok(document::reorder(doc, request.from, request.to).into())
    })
    .await
}

/// PUT /reports/{id}/blocks/{block_id} - Replace a block.
///
/// A text block whose content gains a `---` line is split around a new
/// separator; the new blocks are listed in `created`.
async fn update_block(
    State(state): State<AppState>,
    ClientId(client): ClientId,
    Path((id, block_id)): Path<(String, String)>,
    Json(block): Json<Block>,
) -> ApiResult<Json<MutationResponse>> {
    let block_id = BlockId::from(block_id);
    if *block.id() != block_id {
        return Err(ApiError::BadRequest(format!(
            "Body id {} does not match path id {block_id}",
            block.id()
        )));
    }

    mutate(&state, client, id, |doc| {
        if !document::update(doc, block) {
            return Err(CoreError::BlockNotFound(block_id).into());
        }
        let created = document::apply_separator_marker(doc, &block_id)
            .map(|(separator, text)| vec![separator, text])
            .unwrap_or_default();
        Ok(Outcome::Changed(created))
    })
    .await
}

/// DELETE /reports/{id}/blocks/{block_id} - Delete a block.
async fn delete_block(
    State(state): State<AppState>,
    ClientId(client): ClientId,
    Path((id, block_id)): Path<(String, String)>,
) -> ApiResult<Json<MutationResponse>> {
    let block_id = BlockId::from(block_id);
    mutate(&state, client, id, |doc| {
        if document::delete(doc, &block_id) {
            Ok(Outcome::Changed(Vec::new()))
        } else {
            Err(CoreError::BlockNotFound(block_id).into())
        }
    })
    .await
}

/// POST /reports/{id}/blocks/{block_id}/convert - Switch a data block's view.
async fn convert_block(
    State(state): State<AppState>,
    ClientId(client): ClientId,
    Path((id, block_id)): Path<(String, String)>,
    Json(request): Json<ConvertBlockRequest>,
) -> ApiResult<Json<MutationResponse>> {
    let to: ViewType = request.to.parse()?;
    let block_id = BlockId::from(block_id);
    mutate(&state, client, id, |doc| {
        Ok(document::convert(doc, &block_id, to)?.into())
    })
    .await
}

/// POST /reports/{id}/blocks/{block_id}/split - Insert a separator and an
/// empty text block after a block.
///
/// A `---` line in a text block's content is removed first.
async fn split_block(
    State(state): State<AppState>,
    ClientId(client): ClientId,
    Path((id, block_id)): Path<(String, String)>,
) -> ApiResult<Json<MutationResponse>> {
    let block_id = BlockId::from(block_id);
    mutate(&state, client, id, |doc| {
        find_block(doc, &block_id)?;
        let split = document::apply_separator_marker(doc, &block_id)
            .or_else(|| document::insert_separator_and_split(doc, &block_id));
        Ok(match split {
            Some((separator, text)) => Outcome::Changed(vec![separator, text]),
            None => Outcome::Unchanged,
        })
    })
    .await
}

/// POST /reports/{id}/blocks/{block_id}/metrics - Add the next unused metric.
async fn add_metric(
    State(state): State<AppState>,
    ClientId(client): ClientId,
    Path((id, block_id)): Path<(String, String)>,
) -> ApiResult<Json<MutationResponse>> {
    let block_id = BlockId::from(block_id);
    mutate(&state, client, id, |doc| {
        edit_data_block(doc, &block_id, metrics::add_metric)
    })
    .await
}

/// DELETE /reports/{id}/blocks/{block_id}/metrics/{index} - Remove a metric.
async fn remove_metric(
    State(state): State<AppState>,
    ClientId(client): ClientId,
    Path((id, block_id, index)): Path<(String, String, usize)>,
) -> ApiResult<Json<MutationResponse>> {
    let block_id = BlockId::from(block_id);
    mutate(&state, client, id, |doc| {
        edit_data_block(doc, &block_id, |block| metrics::remove_metric(block, index))
    })
    .await
}

/// POST /reports/{id}/blocks/{block_id}/dimensions - Add the next dimension value.
async fn add_dimension(
    State(state): State<AppState>,
    ClientId(client): ClientId,
    Path((id, block_id)): Path<(String, String)>,
) -> ApiResult<Json<MutationResponse>> {
    let block_id = BlockId::from(block_id);
    mutate(&state, client, id, |doc| {
        edit_data_block(doc, &block_id, metrics::add_dimension)
    })
    .await
}

/// DELETE /reports/{id}/blocks/{block_id}/dimensions/{index} - Remove a dimension value.
async fn remove_dimension(
    State(state): State<AppState>,
    ClientId(client): ClientId,
    Path((id, block_id, index)): Path<(String, String, usize)>,
) -> ApiResult<Json<MutationResponse>> {
    let block_id = BlockId::from(block_id);
    mutate(&state, client, id, |doc| {
        edit_data_block(doc, &block_id, |block| {
            metrics::remove_dimension(block, index)
        })
    })
    .await
}

/// Build block routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/reports/{id}/blocks", post(insert_block))
        .route("/reports/{id}/blocks/move", post(move_block))
        .route(
            "/reports/{id}/blocks/{block_id}",
            put(update_block).delete(delete_block),
        )
        .route("/reports/{id}/blocks/{block_id}/convert", post(convert_block))
        .route("/reports/{id}/blocks/{block_id}/split", post(split_block))
        .route("/reports/{id}/blocks/{block_id}/metrics", post(add_metric))
        .route(
            "/reports/{id}/blocks/{block_id}/metrics/{index}",
            axum::routing::delete(remove_metric),
        )
        .route(
            "/reports/{id}/blocks/{block_id}/dimensions",
            post(add_dimension),
        )
        .route(
            "/reports/{id}/blocks/{block_id}/dimensions/{index}",
            axum::routing::delete(remove_dimension),
        )
}
