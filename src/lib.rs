//! Skema: declarative entity definitions served as a relational schema and a generic REST CRUD API.

pub mod config;
pub mod error;
pub mod handlers;
pub mod migration;
pub mod naming;
pub mod openapi;
pub mod query;
pub mod response;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;
pub mod store;
pub mod value;

pub use config::{load_from_path, resolve, EntityDefinition, FullConfig, Registry};
pub use error::{AppError, ConfigError};
pub use migration::materialize;
pub use query::ListQuery;
pub use routes::app;
pub use service::{expand, CrudService, RecordValidator, WriteMode};
pub use state::AppState;
pub use store::connect;
pub use value::{FieldValue, Record};
