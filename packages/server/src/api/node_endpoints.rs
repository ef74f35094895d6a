//! Node Endpoints
//!
//! - `GET /api/health` - Health check
//! - `POST /api/nodes` - Create a node (201)
//! - `GET /api/nodes/:id` - Get a node by ID
//! - `PATCH /api/nodes/:id` - Update display fields
//! - `DELETE /api/nodes/:id` - Delete a node and, for folders, its subtree

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Extension, Router,
};
use serde::Serialize;

use crate::api::{AppState, HttpError};
use navtree_core::models::{DeleteResult, Node, NodeUpdate};
use navtree_core::operations::CreateNodeParams;
use navtree_core::services::{Actor, TreeError};

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
}

/// Health check endpoint
///
/// ```bash
/// curl http://localhost:3001/api/health
/// ```
async fn health_check() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Create a new node
///
/// ```bash
/// curl -X POST http://localhost:3001/api/nodes \
///   -H "Content-Type: application/json" \
///   -d '{"parentId": null, "kind": "folder", "label": "Billing", "labelZh": "计费"}'
/// ```
async fn create_node(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    body: Result<Json<CreateNodeParams>, JsonRejection>,
) -> Result<(StatusCode, Json<Node>), HttpError> {
    let Json(params) = body?;
    let node = state.service.with_actor(actor).add_node(params).await?;
    Ok((StatusCode::CREATED, Json(node)))
}

async fn get_node(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Node>, HttpError> {
    let node = state
        .service
        .get_node(&id)
        .await?
        .ok_or_else(|| TreeError::not_found(&id))?;
    Ok(Json(node))
}

/// Update an existing node
///
/// `description` and `icon` accept `null` to clear them.
///
/// ```bash
/// curl -X PATCH http://localhost:3001/api/nodes/<id> \
///   -H "Content-Type: application/json" \
///   -d '{"label": "Invoices", "status": "ready"}'
/// ```
async fn update_node(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    body: Result<Json<NodeUpdate>, JsonRejection>,
) -> Result<Json<Node>, HttpError> {
    let Json(update) = body?;
    let node = state
        .service
        .with_actor(actor)
        .update_node(&id, update)
        .await?;
    Ok(Json(node))
}

async fn delete_node(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResult>, HttpError> {
    let result = state.service.with_actor(actor).delete_node(&id).await?;
    Ok(Json(result))
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/nodes", post(create_node))
        .route(
            "/api/nodes/:id",
            get(get_node).patch(update_node).delete(delete_node),
        )
        .with_state(state)
}
