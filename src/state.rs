//! Shared application state for all routes. Read-only after startup.

use crate::config::Registry;
use crate::openapi;
use sqlx::SqlitePool;
use std::sync::Arc;
use utoipa::openapi::OpenApi;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub registry: Arc<Registry>,
    /// Derived once from the registry; served at `/openapi.json`.
    pub api_doc: Arc<OpenApi>,
    /// API name for the welcome message and docs pages.
    pub name: String,
}

impl AppState {
    pub fn new(pool: SqlitePool, registry: Registry, name: impl Into<String>) -> Self {
        let name = name.into();
        let api_doc = openapi::document(&registry, &name);
        AppState {
            pool,
            registry: Arc::new(registry),
            api_doc: Arc::new(api_doc),
            name,
        }
    }
}
