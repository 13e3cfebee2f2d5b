//! Entity CRUD handlers: list, create, read, update, delete.
//! One set of handlers serves every entity; the path segment picks the entity.

use crate::config::{EntityDefinition, ID_COLUMN, RESERVED_FIELDS};
use crate::error::AppError;
use crate::query::{parse_expand, ListQuery};
use crate::response::{success_created, success_many, success_one, ListMeta};
use crate::service::{expand, CrudService, RecordValidator, WriteMode};
use crate::state::AppState;
use crate::value::{FieldValue, Record};
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::Value;
use std::collections::HashMap;

fn entity_for<'a>(state: &'a AppState, table: &str) -> Result<&'a EntityDefinition, AppError> {
    state
        .registry
        .entity_by_table(table)
        .ok_or_else(|| AppError::NotFound(format!("resource '{}'", table)))
}

fn parse_id(raw: &str) -> Result<i64, AppError> {
    raw.parse()
        .map_err(|_| AppError::BadRequest(format!("invalid id '{}'", raw)))
}

/// Parse a JSON object body, keeping declared fields only. System and unknown keys are dropped.
fn body_to_record(entity: &EntityDefinition, body: &[u8]) -> Result<Record, AppError> {
    let value: Value =
        serde_json::from_slice(body).map_err(|e| AppError::BadRequest(format!("invalid JSON body: {}", e)))?;
    let Value::Object(map) = value else {
        return Err(AppError::BadRequest("body must be a JSON object".into()));
    };
    let mut record = Record::new();
    for (key, v) in map {
        if entity.field(&key).is_some() {
            record.insert(key, FieldValue::from(v));
        } else if !RESERVED_FIELDS.contains(&key.as_str()) {
            tracing::debug!(entity = %entity.name, key = %key, "ignoring unknown field");
        }
    }
    Ok(record)
}

pub async fn list(
    State(state): State<AppState>,
    Path(table): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let entity = entity_for(&state, &table)?;
    let plan = ListQuery::from_params(entity, &params);
    let total = CrudService::count(&state.pool, entity, &plan).await?;
    let mut rows = CrudService::list(&state.pool, entity, &plan).await?;
    expand(&state.pool, &state.registry, entity, &mut rows, &plan.expand).await?;
    let meta = ListMeta {
        total,
        limit: plan.limit,
        offset: plan.offset,
    };
    Ok(success_many(rows, meta))
}

pub async fn create(
    State(state): State<AppState>,
    Path(table): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let entity = entity_for(&state, &table)?;
    let record = body_to_record(entity, &body)?;
    RecordValidator::validate(&state.pool, &state.registry, entity, &record, WriteMode::Create).await?;
    let row = CrudService::create(&state.pool, entity, record).await?;
    let new_id = row.get(ID_COLUMN).map(ToString::to_string).unwrap_or_default();
    tracing::info!(entity = %entity.name, id = %new_id, "created");
    Ok(success_created(row))
}

pub async fn read(
    State(state): State<AppState>,
    Path((table, id)): Path<(String, String)>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let entity = entity_for(&state, &table)?;
    let id = parse_id(&id)?;
    let row = CrudService::read(&state.pool, entity, &FieldValue::Integer(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{} with id {}", entity.name, id)))?;
    let mut rows = [row];
    let tokens = parse_expand(params.get("expand").map(String::as_str));
    expand(&state.pool, &state.registry, entity, &mut rows, &tokens).await?;
    let [row] = rows;
    Ok(success_one(row))
}

/// Partial update: only fields present in the body change; `updated_at` is refreshed.
pub async fn update(
    State(state): State<AppState>,
    Path((table, id)): Path<(String, String)>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let entity = entity_for(&state, &table)?;
    let id = parse_id(&id)?;
    let not_found = || AppError::NotFound(format!("{} with id {}", entity.name, id));
    if !CrudService::exists(&state.pool, entity, &FieldValue::Integer(id)).await? {
        return Err(not_found());
    }
    let record = body_to_record(entity, &body)?;
    RecordValidator::validate(&state.pool, &state.registry, entity, &record, WriteMode::Update(id)).await?;
    let row = CrudService::update(&state.pool, entity, id, record)
        .await?
        .ok_or_else(not_found)?;
    Ok(success_one(row))
}

/// Deleting an absent id is not an error.
pub async fn delete(
    State(state): State<AppState>,
    Path((table, id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let entity = entity_for(&state, &table)?;
    let id = parse_id(&id)?;
    let removed = CrudService::delete(&state.pool, entity, id).await?;
    tracing::debug!(entity = %entity.name, id, removed, "delete");
    Ok(StatusCode::NO_CONTENT)
}
