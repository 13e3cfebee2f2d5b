//! Entity CRUD routes. Parameterized paths: handlers resolve the entity from the segment,
//! so one route pair serves every entity in the registry.

use crate::handlers::entity::{create, delete as delete_handler, list, read, update};
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn entity_routes(state: AppState) -> Router {
    Router::new()
        .route("/:table", get(list).post(create))
        .route("/:table/:id", get(read).put(update).delete(delete_handler))
        .with_state(state)
}
