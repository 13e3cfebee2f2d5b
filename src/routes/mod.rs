//! Router assembly.

mod common;
mod docs;
mod entity;

pub use common::common_routes;
pub use docs::docs_routes;
pub use entity::entity_routes;

use crate::error::{status_envelope, AppError};
use crate::state::AppState;
use axum::{
    http::{header, HeaderValue, Uri},
    middleware::map_response,
    response::Response,
    Router,
};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Request bodies above this size are rejected with 413.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Full application: built-in paths, then the generic entity routes, with request tracing.
/// Every error response carries the `{success: false, error}` envelope.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(common_routes(state.clone()))
        .merge(docs_routes(state.clone()))
        .merge(entity_routes(state))
        .fallback(unknown_route)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(map_response(envelope_bare_errors))
        .layer(TraceLayer::new_for_http())
}

async fn unknown_route(uri: Uri) -> AppError {
    AppError::NotFound(format!("route {}", uri.path()))
}

/// Rewrites error responses that are not JSON (405, 413, extractor rejections) into the envelope.
async fn envelope_bare_errors(response: Response) -> Response {
    let status = response.status();
    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"));
    if !(status.is_client_error() || status.is_server_error()) || is_json {
        return response;
    }
    let allow: Option<HeaderValue> = response.headers().get(header::ALLOW).cloned();
    let mut enveloped = status_envelope(status);
    if let Some(allow) = allow {
        enveloped.headers_mut().insert(header::ALLOW, allow);
    }
    enveloped
}
