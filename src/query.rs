//! Translate list query parameters (filters, sort, limit/offset, expand) into a plan.
//! No I/O here; `sql::select_list` and `sql::count` render the plan as parameterized SQL.

use crate::config::{EntityDefinition, FieldType, CREATED_AT};
use crate::value::FieldValue;
use std::collections::HashMap;

pub const DEFAULT_LIMIT: u32 = 100;
pub const MAX_LIMIT: u32 = 1000;

/// Query parameters that never act as filters.
pub const CONTROL_PARAMS: [&str; 4] = ["sort", "limit", "offset", "expand"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterOp {
    /// Substring match (string and text fields).
    Contains,
    Equals,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Filter {
    pub column: String,
    pub op: FilterOp,
    pub value: FieldValue,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sort {
    pub column: String,
    pub direction: SortDirection,
}

impl Default for Sort {
    fn default() -> Self {
        Sort {
            column: CREATED_AT.to_string(),
            direction: SortDirection::Desc,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ListQuery {
    pub filters: Vec<Filter>,
    pub sort: Sort,
    pub limit: u32,
    pub offset: u32,
    /// Raw expand tokens; matched against relations by the expander.
    pub expand: Vec<String>,
}

impl Default for ListQuery {
    fn default() -> Self {
        ListQuery {
            filters: Vec::new(),
            sort: Sort::default(),
            limit: DEFAULT_LIMIT,
            offset: 0,
            expand: Vec::new(),
        }
    }
}

impl ListQuery {
    pub fn from_params(entity: &EntityDefinition, params: &HashMap<String, String>) -> Self {
        let filters = entity
            .fields
            .iter()
            .filter_map(|field| {
                let raw = params.get(&field.name).filter(|v| !v.is_empty())?;
                let op = if field.field_type.is_textual() {
                    FilterOp::Contains
                } else {
                    FilterOp::Equals
                };
                Some(Filter {
                    column: field.name.clone(),
                    op,
                    value: coerce(&field.field_type, raw),
                })
            })
            .collect();

        ListQuery {
            filters,
            sort: parse_sort(entity, params.get("sort").map(String::as_str)),
            limit: parse_count(params.get("limit"), DEFAULT_LIMIT).min(MAX_LIMIT),
            offset: parse_count(params.get("offset"), 0),
            expand: parse_expand(params.get("expand").map(String::as_str)),
        }
    }
}

/// `field`, `field:asc` or `field:desc`. Unknown columns fall back to the default sort.
pub fn parse_sort(entity: &EntityDefinition, raw: Option<&str>) -> Sort {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Sort::default();
    };
    let (column, direction) = match raw.split_once(':') {
        Some((column, dir)) if dir.trim().eq_ignore_ascii_case("desc") => (column.trim(), SortDirection::Desc),
        Some((column, _)) => (column.trim(), SortDirection::Asc),
        None => (raw, SortDirection::Asc),
    };
    if !entity.has_column(column) {
        tracing::debug!(entity = %entity.name, column, "ignoring sort on unknown column");
        return Sort::default();
    }
    Sort {
        column: column.to_string(),
        direction,
    }
}

/// Comma-separated, trimmed, empty and repeated tokens dropped.
pub fn parse_expand(raw: Option<&str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for token in raw.unwrap_or_default().split(',').map(str::trim) {
        if !token.is_empty() && !out.iter().any(|t| t == token) {
            out.push(token.to_string());
        }
    }
    out
}

fn parse_count(raw: Option<&String>, default: u32) -> u32 {
    raw.and_then(|s| s.trim().parse().ok()).unwrap_or(default)
}

/// Filter value typed like the column; values that do not parse stay text and match nothing.
fn coerce(field_type: &FieldType, raw: &str) -> FieldValue {
    match field_type {
        FieldType::Integer => raw.parse().map(FieldValue::Integer).ok(),
        FieldType::Float => raw.parse().map(FieldValue::Float).ok(),
        FieldType::Boolean => match raw.to_ascii_lowercase().as_str() {
            "true" | "1" => Some(FieldValue::Bool(true)),
            "false" | "0" => Some(FieldValue::Bool(false)),
            _ => None,
        },
        _ => None,
    }
    .unwrap_or_else(|| FieldValue::String(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{from_yaml_str, resolve, Registry};

    fn registry() -> Registry {
        let yaml = r#"
entities:
  - name: User
    fields:
      - { name: name, type: string }
      - { name: bio, type: text }
      - { name: age, type: int }
      - { name: active, type: bool }
      - { name: score, type: float }
"#;
        resolve(&from_yaml_str(yaml).unwrap()).unwrap()
    }

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn defaults_when_no_params() {
        let reg = registry();
        let user = reg.entity_by_table("users").unwrap();
        let q = ListQuery::from_params(user, &HashMap::new());
        assert!(q.filters.is_empty());
        assert_eq!(q.sort, Sort::default());
        assert_eq!(q.sort.column, "created_at");
        assert_eq!(q.sort.direction, SortDirection::Desc);
        assert_eq!(q.limit, 100);
        assert_eq!(q.offset, 0);
        assert!(q.expand.is_empty());
    }

    #[test]
    fn text_fields_use_contains_others_equality() {
        let reg = registry();
        let user = reg.entity_by_table("users").unwrap();
        let q = ListQuery::from_params(
            user,
            &params(&[("name", "ali"), ("bio", "rust"), ("age", "25"), ("active", "true"), ("score", "1.5")]),
        );
        assert_eq!(
            q.filters,
            vec![
                Filter { column: "name".into(), op: FilterOp::Contains, value: "ali".into() },
                Filter { column: "bio".into(), op: FilterOp::Contains, value: "rust".into() },
                Filter { column: "age".into(), op: FilterOp::Equals, value: FieldValue::Integer(25) },
                Filter { column: "active".into(), op: FilterOp::Equals, value: FieldValue::Bool(true) },
                Filter { column: "score".into(), op: FilterOp::Equals, value: FieldValue::Float(1.5) },
            ]
        );
    }

    #[test]
    fn unknown_and_empty_params_are_ignored() {
        let reg = registry();
        let user = reg.entity_by_table("users").unwrap();
        let q = ListQuery::from_params(user, &params(&[("nickname", "x"), ("name", ""), ("expand", "")]));
        assert!(q.filters.is_empty());
        assert!(q.expand.is_empty());
    }

    #[test]
    fn non_numeric_pagination_falls_back() {
        let reg = registry();
        let user = reg.entity_by_table("users").unwrap();
        let q = ListQuery::from_params(user, &params(&[("limit", "ten"), ("offset", "-3")]));
        assert_eq!((q.limit, q.offset), (100, 0));
        let q = ListQuery::from_params(user, &params(&[("limit", "5"), ("offset", "10")]));
        assert_eq!((q.limit, q.offset), (5, 10));
        let q = ListQuery::from_params(user, &params(&[("limit", "50000")]));
        assert_eq!(q.limit, MAX_LIMIT);
    }

    #[test]
    fn sort_forms() {
        let reg = registry();
        let user = reg.entity_by_table("users").unwrap();
        assert_eq!(
            parse_sort(user, Some("name")),
            Sort { column: "name".into(), direction: SortDirection::Asc }
        );
        assert_eq!(
            parse_sort(user, Some("age:desc")),
            Sort { column: "age".into(), direction: SortDirection::Desc }
        );
        assert_eq!(
            parse_sort(user, Some("id:ASC")),
            Sort { column: "id".into(), direction: SortDirection::Asc }
        );
        assert_eq!(parse_sort(user, Some("name; DROP TABLE users")), Sort::default());
    }

    #[test]
    fn expand_tokens_are_trimmed_and_deduplicated() {
        assert_eq!(parse_expand(Some(" user, posts,,user ")), vec!["user", "posts"]);
    }

    #[test]
    fn uncoercible_values_stay_text() {
        assert_eq!(coerce(&FieldType::Integer, "abc"), FieldValue::from("abc"));
        assert_eq!(coerce(&FieldType::Boolean, "0"), FieldValue::Bool(false));
    }
}
