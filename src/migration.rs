//! Materialize the entity model: one table per entity, created once and never altered.

use crate::config::{EntityDefinition, Registry};
use crate::error::AppError;
use crate::sql;
use sqlx::SqlitePool;

/// Whether a table was created or already present.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TableStatus {
    Created,
    Existing,
}

/// Ensure every entity's table exists. Existing tables are left untouched (no column migration).
/// The first DDL error aborts startup.
pub async fn materialize(pool: &SqlitePool, registry: &Registry) -> Result<(), AppError> {
    for entity in registry.entities() {
        ensure_table(pool, entity).await?;
    }
    Ok(())
}

pub async fn ensure_table(pool: &SqlitePool, entity: &EntityDefinition) -> Result<TableStatus, AppError> {
    let fail = |e: sqlx::Error| AppError::SchemaMaterialization {
        table: entity.table.clone(),
        message: e.to_string(),
    };

    let q = sql::table_exists(&entity.table);
    let mut lookup = sqlx::query_scalar::<_, i64>(&q.sql);
    for p in &q.params {
        lookup = lookup.bind(p.clone());
    }
    let found = lookup.fetch_one(pool).await.map_err(fail)?;
    if found > 0 {
        tracing::info!(entity = %entity.name, table = %entity.table, "table exists, skipping");
        return Ok(TableStatus::Existing);
    }

    let ddl = sql::create_table(entity);
    tracing::debug!(sql = %ddl, "create table");
    sqlx::query(&ddl).execute(pool).await.map_err(fail)?;
    tracing::info!(entity = %entity.name, table = %entity.table, "table created");
    Ok(TableStatus::Created)
}
