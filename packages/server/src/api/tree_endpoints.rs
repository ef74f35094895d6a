//! Tree Endpoints
//!
//! - `GET /api/tree` - Nested projection (array of top-level nodes)
//! - `GET /api/tree/validate` - Whole-tree invariant report
//! - `POST /api/tree/move` - Move relative to a parent or sibling anchor
//! - `POST /api/tree/reorder` - Rewrite a parent's child order
//! - `POST /api/tree/drop` - Resolve a drag-and-drop gesture and move
//! - `POST /api/tree/:id/sort` - Sort children alphabetically (`root` for top level)

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::Json,
    routing::{get, post},
    Extension, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::{AppState, HttpError};
use navtree_core::models::{Node, TreeNode, ROOT_PARENT_ID};
use navtree_core::operations::{DropIntent, MoveNodeParams, ReorderParams};
use navtree_core::services::{Actor, InvariantViolation, TreeError};

#[derive(Debug, Serialize)]
pub struct MutationResponse {
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub violations: Vec<InvariantViolation>,
}

/// Drop gesture as measured by the client
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropRequest {
    pub dragged_id: String,
    pub target_id: String,
    /// Pointer offset from the top of the target row
    pub offset_y: f64,
    pub row_height: f64,
}

#[derive(Debug, Serialize)]
pub struct DropResponse {
    pub intent: DropIntent,
    pub success: bool,
}

async fn get_tree(State(state): State<AppState>) -> Result<Json<Vec<TreeNode>>, HttpError> {
    Ok(Json(state.service.get_tree().await?))
}

async fn validate_tree(State(state): State<AppState>) -> Result<Json<ValidationReport>, HttpError> {
    let violations = state.service.validate().await?;
    Ok(Json(ValidationReport {
        valid: violations.is_empty(),
        violations,
    }))
}

/// Move a node
///
/// ```bash
/// curl -X POST http://localhost:3001/api/tree/move \
///   -H "Content-Type: application/json" \
///   -d '{"id": "<m1>", "targetParentId": "<f1>", "position": "after", "anchorSiblingId": "<m2>"}'
/// ```
async fn move_node(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    body: Result<Json<MoveNodeParams>, JsonRejection>,
) -> Result<Json<MutationResponse>, HttpError> {
    let Json(params) = body?;
    state.service.with_actor(actor).move_node(params).await?;
    Ok(Json(MutationResponse { success: true }))
}

async fn reorder_nodes(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    body: Result<Json<ReorderParams>, JsonRejection>,
) -> Result<Json<MutationResponse>, HttpError> {
    let Json(params) = body?;
    state.service.with_actor(actor).reorder_nodes(params).await?;
    Ok(Json(MutationResponse { success: true }))
}

async fn drop_node(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    body: Result<Json<DropRequest>, JsonRejection>,
) -> Result<Json<DropResponse>, HttpError> {
    let Json(request) = body?;
    let target = state
        .service
        .get_node(&request.target_id)
        .await?
        .ok_or_else(|| TreeError::not_found(&request.target_id))?;

    let params = state.service.drop_zone_resolver().resolve_move(
        &request.dragged_id,
        &target,
        request.offset_y,
        request.row_height,
    );
    let intent = params.position;
    tracing::debug!(
        dragged_id = %request.dragged_id,
        target_id = %target.id,
        intent = intent.as_str(),
        "Resolved drop"
    );

    state.service.with_actor(actor).move_node(params).await?;
    Ok(Json(DropResponse {
        intent,
        success: true,
    }))
}

async fn sort_children(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Node>>, HttpError> {
    let parent = (id != ROOT_PARENT_ID).then_some(id.as_str());
    let children = state
        .service
        .with_actor(actor)
        .sort_children_alphabetically(parent)
        .await?;
    Ok(Json(children))
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/tree", get(get_tree))
        .route("/api/tree/validate", get(validate_tree))
        .route("/api/tree/move", post(move_node))
        .route("/api/tree/reorder", post(reorder_nodes))
        .route("/api/tree/drop", post(drop_node))
        .route("/api/tree/:id/sort", post(sort_children))
        .with_state(state)
}
