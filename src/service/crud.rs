//! Generic CRUD execution against SQLite.

use crate::config::{EntityDefinition, FieldType, CREATED_AT, RESERVED_FIELDS, UPDATED_AT};
use crate::error::AppError;
use crate::query::ListQuery;
use crate::sql::{self, QueryBuf};
use crate::value::{FieldValue, Record};
use chrono::{SecondsFormat, Utc};
use sqlx::sqlite::{SqliteQueryResult, SqliteRow};
use sqlx::{Database, Sqlite, SqlitePool};

pub struct CrudService;

impl CrudService {
    /// Rows matching the plan's filters, sorted and sliced.
    pub async fn list(pool: &SqlitePool, entity: &EntityDefinition, plan: &ListQuery) -> Result<Vec<Record>, AppError> {
        let q = sql::select_list(entity, plan);
        Self::query_many(pool, entity, &q).await
    }

    /// Total rows matching the plan's filters (pagination ignored).
    pub async fn count(pool: &SqlitePool, entity: &EntityDefinition, plan: &ListQuery) -> Result<u64, AppError> {
        let q = sql::count(entity, plan);
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query_scalar::<_, i64>(&q.sql);
        for p in &q.params {
            query = query.bind(p.clone());
        }
        let n = query.fetch_one(pool).await?;
        Ok(n.max(0) as u64)
    }

    /// Fetch one row by id. Returns None when absent.
    pub async fn read(pool: &SqlitePool, entity: &EntityDefinition, id: &FieldValue) -> Result<Option<Record>, AppError> {
        let q = sql::select_by_id(entity, id);
        Ok(Self::query_many(pool, entity, &q).await?.into_iter().next())
    }

    /// All rows where `column = value`.
    pub async fn fetch_where(
        pool: &SqlitePool,
        entity: &EntityDefinition,
        column: &str,
        value: &FieldValue,
    ) -> Result<Vec<Record>, AppError> {
        let q = sql::select_by_column(entity, column, value);
        Self::query_many(pool, entity, &q).await
    }

    pub async fn exists(pool: &SqlitePool, entity: &EntityDefinition, id: &FieldValue) -> Result<bool, AppError> {
        let q = sql::exists_by_id(entity, id);
        Self::any_row(pool, &q).await
    }

    /// Whether another row already holds `value` in `column`.
    pub async fn value_taken(
        pool: &SqlitePool,
        entity: &EntityDefinition,
        column: &str,
        value: &FieldValue,
        exclude_id: Option<i64>,
    ) -> Result<bool, AppError> {
        let q = sql::exists_with_value(entity, column, value, exclude_id);
        Self::any_row(pool, &q).await
    }

    /// Insert one row with server-set timestamps. Returns the stored row.
    pub async fn create(pool: &SqlitePool, entity: &EntityDefinition, mut record: Record) -> Result<Record, AppError> {
        strip_reserved(&mut record);
        let now = FieldValue::String(timestamp());
        record.insert(CREATED_AT.to_string(), now.clone());
        record.insert(UPDATED_AT.to_string(), now);
        let q = sql::insert(entity, &record);
        let result = Self::execute(pool, &q).await?;
        let id = FieldValue::Integer(result.last_insert_rowid());
        Self::read(pool, entity, &id).await?.ok_or(AppError::Db(sqlx::Error::RowNotFound))
    }

    /// Partial update by id, refreshing `updated_at`. Returns the updated row, or None when absent.
    pub async fn update(
        pool: &SqlitePool,
        entity: &EntityDefinition,
        id: i64,
        mut record: Record,
    ) -> Result<Option<Record>, AppError> {
        strip_reserved(&mut record);
        record.insert(UPDATED_AT.to_string(), FieldValue::String(timestamp()));
        let q = sql::update(entity, id, &record);
        let result = Self::execute(pool, &q).await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        Self::read(pool, entity, &FieldValue::Integer(id)).await
    }

    /// Delete by id. Returns the number of rows removed (0 or 1).
    pub async fn delete(pool: &SqlitePool, entity: &EntityDefinition, id: i64) -> Result<u64, AppError> {
        let q = sql::delete(entity, id);
        let result = Self::execute(pool, &q).await?;
        Ok(result.rows_affected())
    }

    fn bind(q: &QueryBuf) -> sqlx::query::Query<'_, Sqlite, <Sqlite as Database>::Arguments<'_>> {
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(p.clone());
        }
        query
    }

    async fn query_many(pool: &SqlitePool, entity: &EntityDefinition, q: &QueryBuf) -> Result<Vec<Record>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let rows = Self::bind(q).fetch_all(pool).await?;
        Ok(rows.iter().map(|r| row_to_record(r, entity)).collect())
    }

    async fn any_row(pool: &SqlitePool, q: &QueryBuf) -> Result<bool, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let row = Self::bind(q).fetch_optional(pool).await?;
        Ok(row.is_some())
    }

    async fn execute(pool: &SqlitePool, q: &QueryBuf) -> Result<SqliteQueryResult, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "execute");
        Self::bind(q).execute(pool).await.map_err(AppError::from_write)
    }
}

/// System fields are never taken from a payload.
fn strip_reserved(record: &mut Record) {
    for name in RESERVED_FIELDS {
        record.remove(name);
    }
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Decode a row using the storage value's runtime type; boolean fields come back as 0/1 and are restored here.
pub(crate) fn row_to_record(row: &SqliteRow, entity: &EntityDefinition) -> Record {
    use sqlx::{Column, Row};
    let mut record = Record::new();
    for (index, col) in row.columns().iter().enumerate() {
        let name = col.name();
        let field_type = entity.field(name).map(|f| &f.field_type);
        record.insert(name.to_string(), cell_to_value(row, index, field_type));
    }
    record
}

fn cell_to_value(row: &SqliteRow, index: usize, field_type: Option<&FieldType>) -> FieldValue {
    use sqlx::{Row, TypeInfo, ValueRef};
    let Ok(raw) = row.try_get_raw(index) else {
        return FieldValue::Null;
    };
    if raw.is_null() {
        return FieldValue::Null;
    }
    let type_info = raw.type_info();
    match type_info.name() {
        "INTEGER" => match row.try_get::<i64, _>(index) {
            Ok(n) if field_type == Some(&FieldType::Boolean) => FieldValue::Bool(n != 0),
            Ok(n) => FieldValue::Integer(n),
            Err(_) => FieldValue::Null,
        },
        "REAL" => row.try_get::<f64, _>(index).map(FieldValue::Float).unwrap_or(FieldValue::Null),
        "TEXT" => row.try_get::<String, _>(index).map(FieldValue::String).unwrap_or(FieldValue::Null),
        _ => FieldValue::Null,
    }
}
