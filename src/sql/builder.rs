//! Builds parameterized CREATE, SELECT, INSERT, UPDATE, DELETE from an entity definition.

use crate::config::{EntityDefinition, RelationKind, CREATED_AT, ID_COLUMN, UPDATED_AT};
use crate::query::{FilterOp, ListQuery};
use crate::value::{FieldValue, Record};

/// Quote identifier for SQLite (safe: names only ever come from config).
pub fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

#[derive(Debug, Default)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<FieldValue>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf::default()
    }

    /// Appends a value and returns its placeholder.
    fn push_param(&mut self, v: FieldValue) -> &'static str {
        self.params.push(v);
        "?"
    }
}

/// `id`, declared fields in order, then timestamps.
fn column_names(entity: &EntityDefinition) -> Vec<&str> {
    let mut cols = vec![ID_COLUMN];
    cols.extend(entity.fields.iter().map(|f| f.name.as_str()));
    cols.push(CREATED_AT);
    cols.push(UPDATED_AT);
    cols
}

fn select_column_list(entity: &EntityDefinition) -> String {
    column_names(entity)
        .into_iter()
        .map(quoted)
        .collect::<Vec<_>>()
        .join(", ")
}

/// CREATE TABLE statement for an entity: engine-assigned id, one column per field, timestamps, belongs_to foreign keys.
pub fn create_table(entity: &EntityDefinition) -> String {
    let mut defs = vec![format!("{} INTEGER PRIMARY KEY AUTOINCREMENT", quoted(ID_COLUMN))];
    for f in &entity.fields {
        let mut def = format!("{} {}", quoted(&f.name), f.field_type.sql_type());
        if f.required {
            def.push_str(" NOT NULL");
        }
        if f.unique {
            def.push_str(" UNIQUE");
        }
        defs.push(def);
    }
    defs.push(format!("{} DATETIME", quoted(CREATED_AT)));
    defs.push(format!("{} DATETIME", quoted(UPDATED_AT)));
    for r in entity.relations.iter().filter(|r| r.kind == RelationKind::BelongsTo) {
        defs.push(format!(
            "FOREIGN KEY ({}) REFERENCES {}({})",
            quoted(&r.field),
            quoted(&r.target_table()),
            quoted(ID_COLUMN)
        ));
    }
    format!("CREATE TABLE {} (\n  {}\n)", quoted(&entity.table), defs.join(",\n  "))
}

/// Single-parameter lookup of a table by name in the SQLite catalog.
pub fn table_exists(table: &str) -> QueryBuf {
    let mut q = QueryBuf::new();
    let ph = q.push_param(FieldValue::from(table));
    q.sql = format!("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = {}", ph);
    q
}

/// Escape LIKE wildcards so user input only ever matches literally.
fn like_pattern(value: &FieldValue) -> FieldValue {
    let raw = value.to_string();
    let mut escaped = String::with_capacity(raw.len() + 2);
    escaped.push('%');
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    FieldValue::String(escaped)
}

fn where_clause(q: &mut QueryBuf, plan: &ListQuery) -> String {
    let mut parts = Vec::with_capacity(plan.filters.len());
    for f in &plan.filters {
        let part = match f.op {
            FilterOp::Contains => {
                let ph = q.push_param(like_pattern(&f.value));
                format!("{} LIKE {} ESCAPE '\\'", quoted(&f.column), ph)
            }
            FilterOp::Equals => {
                let ph = q.push_param(f.value.clone());
                format!("{} = {}", quoted(&f.column), ph)
            }
        };
        parts.push(part);
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", parts.join(" AND "))
    }
}

/// SELECT list: filters, ORDER BY sort column then id in the same direction, LIMIT/OFFSET.
pub fn select_list(entity: &EntityDefinition, plan: &ListQuery) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_clause = where_clause(&mut q, plan);
    let dir = plan.sort.direction.as_sql();
    let mut order = format!("{} {}", quoted(&plan.sort.column), dir);
    if plan.sort.column != ID_COLUMN {
        order.push_str(&format!(", {} {}", quoted(ID_COLUMN), dir));
    }
    q.sql = format!(
        "SELECT {} FROM {}{} ORDER BY {} LIMIT {} OFFSET {}",
        select_column_list(entity),
        quoted(&entity.table),
        where_clause,
        order,
        plan.limit,
        plan.offset
    );
    q
}

/// COUNT(*) with the same filters as `select_list`, ignoring sort and pagination.
pub fn count(entity: &EntityDefinition, plan: &ListQuery) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_clause = where_clause(&mut q, plan);
    q.sql = format!("SELECT COUNT(*) FROM {}{}", quoted(&entity.table), where_clause);
    q
}

pub fn select_by_id(entity: &EntityDefinition, id: &FieldValue) -> QueryBuf {
    select_by_column(entity, ID_COLUMN, id)
}

/// All rows where `column = value`, ordered by id. Used for has_many expansion.
pub fn select_by_column(entity: &EntityDefinition, column: &str, value: &FieldValue) -> QueryBuf {
    let mut q = QueryBuf::new();
    let ph = q.push_param(value.clone());
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} = {} ORDER BY {}",
        select_column_list(entity),
        quoted(&entity.table),
        quoted(column),
        ph,
        quoted(ID_COLUMN)
    );
    q
}

/// `SELECT 1` check for a row by id (relation integrity).
pub fn exists_by_id(entity: &EntityDefinition, id: &FieldValue) -> QueryBuf {
    let mut q = QueryBuf::new();
    let ph = q.push_param(id.clone());
    q.sql = format!(
        "SELECT 1 FROM {} WHERE {} = {} LIMIT 1",
        quoted(&entity.table),
        quoted(ID_COLUMN),
        ph
    );
    q
}

/// `SELECT 1` check for another row holding `value` in `column` (unique check). `exclude_id` skips the row being updated.
pub fn exists_with_value(
    entity: &EntityDefinition,
    column: &str,
    value: &FieldValue,
    exclude_id: Option<i64>,
) -> QueryBuf {
    let mut q = QueryBuf::new();
    let ph = q.push_param(value.clone());
    let mut sql = format!(
        "SELECT 1 FROM {} WHERE {} = {}",
        quoted(&entity.table),
        quoted(column),
        ph
    );
    if let Some(id) = exclude_id {
        let ph = q.push_param(FieldValue::Integer(id));
        sql.push_str(&format!(" AND {} <> {}", quoted(ID_COLUMN), ph));
    }
    sql.push_str(" LIMIT 1");
    q.sql = sql;
    q
}

/// INSERT declared fields present in the record, plus timestamps. Other keys are never written.
pub fn insert(entity: &EntityDefinition, record: &Record) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut cols = Vec::new();
    let mut placeholders = Vec::new();
    let writable = entity
        .fields
        .iter()
        .map(|f| f.name.as_str())
        .chain([CREATED_AT, UPDATED_AT]);
    for name in writable {
        if let Some(v) = record.get(name) {
            placeholders.push(q.push_param(v.clone()));
            cols.push(quoted(name));
        }
    }
    q.sql = if cols.is_empty() {
        format!("INSERT INTO {} DEFAULT VALUES", quoted(&entity.table))
    } else {
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quoted(&entity.table),
            cols.join(", "),
            placeholders.join(", ")
        )
    };
    q
}

/// UPDATE by id: SET only declared fields present in the record, plus `updated_at` when given.
pub fn update(entity: &EntityDefinition, id: i64, record: &Record) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut sets = Vec::new();
    let writable = entity
        .fields
        .iter()
        .map(|f| f.name.as_str())
        .chain([UPDATED_AT]);
    for name in writable {
        if let Some(v) = record.get(name) {
            let ph = q.push_param(v.clone());
            sets.push(format!("{} = {}", quoted(name), ph));
        }
    }
    if sets.is_empty() {
        sets.push(format!("{} = {}", quoted(UPDATED_AT), quoted(UPDATED_AT)));
    }
    let ph = q.push_param(FieldValue::Integer(id));
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = {}",
        quoted(&entity.table),
        sets.join(", "),
        quoted(ID_COLUMN),
        ph
    );
    q
}

pub fn delete(entity: &EntityDefinition, id: i64) -> QueryBuf {
    let mut q = QueryBuf::new();
    let ph = q.push_param(FieldValue::Integer(id));
    q.sql = format!("DELETE FROM {} WHERE {} = {}", quoted(&entity.table), quoted(ID_COLUMN), ph);
    q
}
