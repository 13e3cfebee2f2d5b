//! Welcome message, OpenAPI document, Redoc and Swagger UI pages.

use crate::handlers::docs::{openapi_json, redoc, swagger, welcome};
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn docs_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(welcome))
        .route("/openapi.json", get(openapi_json))
        .route("/docs", get(redoc))
        .route("/swagger", get(swagger))
        .with_state(state)
}
