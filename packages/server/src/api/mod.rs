//! HTTP API over the tree engine
//!
//! Endpoints are grouped by resource and merged into one router:
//! - `node_endpoints`: health and single-node CRUD
//! - `tree_endpoints`: projection, validation and structural mutations
//!
//! Handlers never touch the store; every call goes through `TreeService`,
//! scoped to the requesting actor.

use axum::{
    http::{header, HeaderValue, Method},
    middleware, Router,
};
use navtree_core::services::TreeService;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod actor;
mod http_error;
mod node_endpoints;
mod tree_endpoints;

pub use http_error::HttpError;

/// Application state shared across all endpoints
#[derive(Clone)]
pub struct AppState {
    pub service: TreeService,
}

impl AppState {
    pub fn new(service: TreeService) -> Self {
        Self { service }
    }
}

/// Create the application router with all endpoint modules
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(node_endpoints::routes(state.clone()))
        .merge(tree_endpoints::routes(state))
        .layer(middleware::from_fn(actor::resolve_actor))
        .layer(TraceLayer::new_for_http())
}

/// CORS layer for the configured browser origins
///
/// Origins are validated by `ServerConfig::validate`; any that still fail
/// to parse are skipped.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| o.parse::<HeaderValue>().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([
            header::CONTENT_TYPE,
            header::HeaderName::from_static(actor::ACTOR_ID_HEADER),
            header::HeaderName::from_static(actor::ACTOR_NAME_HEADER),
        ])
        .allow_credentials(false)
}
