//! Actor identity from request headers
//!
//! There is no authentication; callers name themselves with `x-actor-id`
//! and `x-actor-name`. The middleware stores the resulting [`Actor`] as a
//! request extension for handlers. Missing or non-UTF-8 headers fall back
//! to the anonymous actor.

use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use navtree_core::services::Actor;

pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const ACTOR_NAME_HEADER: &str = "x-actor-name";

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Actor named by the request headers; the name defaults to the id
pub fn actor_from_headers(headers: &HeaderMap) -> Actor {
    match header(headers, ACTOR_ID_HEADER) {
        Some(id) => {
            let name = header(headers, ACTOR_NAME_HEADER).unwrap_or_else(|| id.clone());
            Actor::new(id, name)
        }
        None => Actor::anonymous(),
    }
}

pub async fn resolve_actor(mut request: Request, next: Next) -> Response {
    let actor = actor_from_headers(request.headers());
    request.extensions_mut().insert(actor);
    next.run(request).await
}
