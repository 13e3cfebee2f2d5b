//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config load: {0}")]
    Load(String),
    #[error("config parse: {0}")]
    Parse(String),
    #[error("missing reference: {kind} '{id}'")]
    MissingReference { kind: &'static str, id: String },
    #[error("duplicate entity: {0}")]
    DuplicateEntity(String),
    #[error("duplicate table name '{table}' (entity {entity})")]
    DuplicateTable { entity: String, table: String },
    #[error("duplicate field '{field}' in entity {entity}")]
    DuplicateField { entity: String, field: String },
    #[error("field '{field}' in entity {entity} uses a reserved name")]
    ReservedField { entity: String, field: String },
    #[error("unknown relation type '{kind}' in entity {entity}")]
    UnknownRelation { entity: String, kind: String },
    #[error("invalid pattern for {entity}.{field}: {message}")]
    InvalidPattern {
        entity: String,
        field: String,
        message: String,
    },
    #[error("validation: {0}")]
    Validation(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("creating table {table}: {message}")]
    SchemaMaterialization { table: String, message: String },
    #[error("{0}")]
    Validation(String),
    #[error("related {entity} with id {id} does not exist")]
    RelationIntegrity { entity: String, id: String },
    #[error("not found: {0}")]
    NotFound(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            AppError::SchemaMaterialization { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "schema_error"),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            AppError::RelationIntegrity { .. } => (StatusCode::BAD_REQUEST, "relation_integrity_error"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AppError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            AppError::Db(e) => {
                if let sqlx::Error::RowNotFound = e {
                    (StatusCode::NOT_FOUND, "not_found")
                } else {
                    (StatusCode::INTERNAL_SERVER_ERROR, "database_error")
                }
            }
        }
    }

    /// Map a storage UNIQUE violation to Conflict; other storage errors pass through.
    pub(crate) fn from_write(e: sqlx::Error) -> Self {
        let unique = e
            .as_database_error()
            .map(|d| d.is_unique_violation())
            .unwrap_or(false);
        if unique {
            AppError::Conflict(e.to_string())
        } else {
            AppError::Db(e)
        }
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

fn envelope(status: StatusCode, code: &str, message: String) -> Response {
    let body = ErrorBody {
        success: false,
        error: ErrorDetail {
            code: code.to_string(),
            message,
        },
    };
    (status, Json(body)).into_response()
}

/// Error envelope for a status raised below the handlers: routing, extractors, body limits.
pub fn status_envelope(status: StatusCode) -> Response {
    let code = match status {
        StatusCode::NOT_FOUND => "not_found",
        StatusCode::METHOD_NOT_ALLOWED => "method_not_allowed",
        StatusCode::PAYLOAD_TOO_LARGE => "payload_too_large",
        StatusCode::UNSUPPORTED_MEDIA_TYPE => "unsupported_media_type",
        s if s.is_server_error() => "internal_error",
        _ => "bad_request",
    };
    let message = status
        .canonical_reason()
        .map(str::to_lowercase)
        .unwrap_or_else(|| status.as_str().to_string());
    envelope(status, code, message)
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        envelope(status, code, self.to_string())
    }
}
