//! Record validation from entity definitions.

use super::CrudService;
use crate::config::{EntityDefinition, FieldDefinition, FieldFormat, FieldType, Registry};
use crate::error::AppError;
use crate::value::{FieldValue, Record};
use regex::Regex;
use sqlx::SqlitePool;
use std::sync::OnceLock;

/// Create checks every required field; update only the fields present in the payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteMode {
    Create,
    /// Row being updated; excluded from uniqueness checks.
    Update(i64),
}

pub struct RecordValidator;

impl RecordValidator {
    /// First violation wins: field rules in definition order, then relations, then uniqueness.
    pub async fn validate(
        pool: &SqlitePool,
        registry: &Registry,
        entity: &EntityDefinition,
        record: &Record,
        mode: WriteMode,
    ) -> Result<(), AppError> {
        Self::check_fields(entity, record, mode)?;
        Self::check_relations(pool, registry, entity, record).await?;
        Self::check_unique(pool, entity, record, mode).await
    }

    /// Required, type, bounds, pattern and format. No I/O.
    pub fn check_fields(entity: &EntityDefinition, record: &Record, mode: WriteMode) -> Result<(), AppError> {
        for field in &entity.fields {
            match record.get(&field.name) {
                None if mode == WriteMode::Create && field.required => return Err(required(field)),
                None => {}
                Some(v) if field.required && v.is_blank() => return Err(required(field)),
                Some(FieldValue::Null) => {}
                Some(v) => validate_field(field, v)?,
            }
        }
        Ok(())
    }

    /// Each belongs_to foreign key present in the record must reference an existing row.
    pub async fn check_relations(
        pool: &SqlitePool,
        registry: &Registry,
        entity: &EntityDefinition,
        record: &Record,
    ) -> Result<(), AppError> {
        for rel in entity.belongs_to() {
            let Some(fk) = record.get(&rel.field).filter(|v| !v.is_null()) else {
                continue;
            };
            let target = registry
                .entity_by_name(&rel.entity)
                .ok_or_else(|| AppError::NotFound(format!("entity {}", rel.entity)))?;
            if !CrudService::exists(pool, target, fk).await? {
                return Err(AppError::RelationIntegrity {
                    entity: rel.entity.clone(),
                    id: fk.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Unique fields must not collide with another row.
    pub async fn check_unique(
        pool: &SqlitePool,
        entity: &EntityDefinition,
        record: &Record,
        mode: WriteMode,
    ) -> Result<(), AppError> {
        let exclude = match mode {
            WriteMode::Create => None,
            WriteMode::Update(id) => Some(id),
        };
        for field in entity.fields.iter().filter(|f| f.unique) {
            let Some(v) = record.get(&field.name).filter(|v| !v.is_null()) else {
                continue;
            };
            if CrudService::value_taken(pool, entity, &field.name, v, exclude).await? {
                return Err(AppError::Validation(format!("field '{}' must be unique", field.name)));
            }
        }
        Ok(())
    }
}

fn required(field: &FieldDefinition) -> AppError {
    AppError::Validation(format!("field '{}' is required", field.name))
}

fn invalid(field: &FieldDefinition, rule: &str) -> AppError {
    AppError::Validation(format!("field '{}' {}", field.name, rule))
}

fn validate_field(field: &FieldDefinition, v: &FieldValue) -> Result<(), AppError> {
    check_type(field, v)?;

    if field.field_type.is_numeric() {
        if let Some(n) = v.as_f64() {
            if let Some(min) = field.min.filter(|&min| n < min) {
                return Err(invalid(field, &format!("must be at least {}", min)));
            }
            if let Some(max) = field.max.filter(|&max| n > max) {
                return Err(invalid(field, &format!("must be at most {}", max)));
            }
        }
    }

    if let Some(re) = &field.pattern {
        if !re.is_match(&v.to_string()) {
            return Err(invalid(field, &format!("does not match pattern '{}'", re.as_str())));
        }
    }

    match &field.format {
        Some(FieldFormat::Email) if !email_regex().is_some_and(|re| re.is_match(&v.to_string())) => {
            Err(invalid(field, "must be a valid email"))
        }
        Some(FieldFormat::Uuid) if uuid::Uuid::parse_str(&v.to_string()).is_err() => {
            Err(invalid(field, "must be a valid uuid"))
        }
        _ => Ok(()),
    }
}

fn check_type(field: &FieldDefinition, v: &FieldValue) -> Result<(), AppError> {
    let (ok, expected) = match field.field_type {
        FieldType::Integer => (matches!(v, FieldValue::Integer(_)), "an integer"),
        FieldType::Float => (matches!(v, FieldValue::Integer(_) | FieldValue::Float(_)), "a number"),
        FieldType::Boolean => (matches!(v, FieldValue::Bool(_)), "a boolean"),
        FieldType::String | FieldType::Text => (matches!(v, FieldValue::String(_)), "a string"),
        FieldType::Other(_) => (true, ""),
    };
    if ok {
        Ok(())
    } else {
        Err(invalid(field, &format!("must be {}", expected)))
    }
}

/// ASCII `local@domain.tld` with a 2-4 letter TLD, any case.
fn email_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^[a-z0-9._%+\-]+@[a-z0-9.\-]+\.[a-z]{2,4}$").ok())
        .as_ref()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{from_yaml_str, resolve};
    use serde_json::json;

    fn registry() -> Registry {
        let yaml = r#"
entities:
  - name: User
    fields:
      - { name: name, type: string, required: true }
      - { name: email, type: string, format: email }
      - { name: age, type: int, min: 18, max: 120 }
      - { name: score, type: float, min: 0.5 }
      - { name: active, type: bool }
      - { name: code, type: string, pattern: "^[A-Z]{3}$" }
      - { name: token, type: string, format: uuid }
"#;
        resolve(&from_yaml_str(yaml).unwrap()).unwrap()
    }

    fn record(json: serde_json::Value) -> Record {
        match FieldValue::from(json) {
            FieldValue::Object(r) => r,
            other => panic!("not an object: {:?}", other),
        }
    }

    fn message(json: serde_json::Value, mode: WriteMode) -> Option<String> {
        let reg = registry();
        let user = reg.entity_by_name("User").unwrap();
        RecordValidator::check_fields(user, &record(json), mode)
            .err()
            .map(|e| e.to_string())
    }

    #[test]
    fn required_field_missing_null_or_empty() {
        assert_eq!(message(json!({}), WriteMode::Create).as_deref(), Some("field 'name' is required"));
        assert_eq!(
            message(json!({"name": null}), WriteMode::Create).as_deref(),
            Some("field 'name' is required")
        );
        assert_eq!(
            message(json!({"name": ""}), WriteMode::Update(1)).as_deref(),
            Some("field 'name' is required")
        );
    }

    #[test]
    fn update_skips_absent_fields() {
        assert_eq!(message(json!({"age": 30}), WriteMode::Update(1)), None);
    }

    #[test]
    fn bounds_are_inclusive_and_name_the_limit() {
        let msg = message(json!({"name": "Ann", "age": 10}), WriteMode::Create).unwrap();
        assert_eq!(msg, "field 'age' must be at least 18");
        assert_eq!(message(json!({"name": "Ann", "age": 18}), WriteMode::Create), None);
        assert_eq!(message(json!({"name": "Ann", "age": 120}), WriteMode::Create), None);
        assert_eq!(
            message(json!({"name": "Ann", "age": 121}), WriteMode::Create).as_deref(),
            Some("field 'age' must be at most 120")
        );
        assert_eq!(
            message(json!({"name": "Ann", "score": 0.25}), WriteMode::Create).as_deref(),
            Some("field 'score' must be at least 0.5")
        );
        assert_eq!(message(json!({"name": "Ann", "score": 1}), WriteMode::Create), None);
    }

    #[test]
    fn wrong_types_are_rejected() {
        assert_eq!(
            message(json!({"name": "Ann", "age": "ten"}), WriteMode::Create).as_deref(),
            Some("field 'age' must be an integer")
        );
        assert_eq!(
            message(json!({"name": 7}), WriteMode::Create).as_deref(),
            Some("field 'name' must be a string")
        );
        assert_eq!(
            message(json!({"name": "Ann", "active": "yes"}), WriteMode::Create).as_deref(),
            Some("field 'active' must be a boolean")
        );
    }

    #[test]
    fn pattern_and_formats() {
        assert_eq!(
            message(json!({"name": "Ann", "code": "ab1"}), WriteMode::Create).as_deref(),
            Some("field 'code' does not match pattern '^[A-Z]{3}$'")
        );
        assert_eq!(message(json!({"name": "Ann", "code": "ABC"}), WriteMode::Create), None);
        assert_eq!(
            message(json!({"name": "Ann", "email": "not-an-email"}), WriteMode::Create).as_deref(),
            Some("field 'email' must be a valid email")
        );
        assert_eq!(message(json!({"name": "Ann", "email": "Ann.Lee@Example.org"}), WriteMode::Create), None);
        assert_eq!(
            message(json!({"name": "Ann", "token": "123"}), WriteMode::Create).as_deref(),
            Some("field 'token' must be a valid uuid")
        );
        assert_eq!(
            message(
                json!({"name": "Ann", "token": "67e55044-10b1-426f-9247-bb680e5fe0c8"}),
                WriteMode::Create
            ),
            None
        );
    }

    #[test]
    fn empty_optional_values_are_still_checked() {
        assert_eq!(
            message(json!({"name": "Ann", "email": ""}), WriteMode::Create).as_deref(),
            Some("field 'email' must be a valid email")
        );
        assert_eq!(
            message(json!({"name": "Ann", "code": ""}), WriteMode::Create).as_deref(),
            Some("field 'code' does not match pattern '^[A-Z]{3}$'")
        );
        assert_eq!(
            message(json!({"name": "Ann", "age": ""}), WriteMode::Update(1)).as_deref(),
            Some("field 'age' must be an integer")
        );
        assert_eq!(message(json!({"name": "Ann", "email": null, "age": null}), WriteMode::Create), None);
    }

    #[test]
    fn first_violation_in_field_order() {
        let msg = message(json!({"age": 5, "email": "x"}), WriteMode::Create).unwrap();
        assert_eq!(msg, "field 'name' is required");
    }
}
