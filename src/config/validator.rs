//! Config validation: uniqueness, reserved names and relation integrity.

use crate::config::{FullConfig, RelationKind, RESERVED_FIELDS};
use crate::error::ConfigError;
use crate::naming::table_name;
use crate::query::CONTROL_PARAMS;
use regex::Regex;
use std::collections::{HashMap, HashSet};

/// Top-level paths served by the router itself; no entity table may take one.
pub const RESERVED_PATHS: [&str; 6] = ["openapi.json", "docs", "swagger", "health", "ready", "version"];

pub fn validate(config: &FullConfig) -> Result<(), ConfigError> {
    let mut entity_names = HashSet::new();
    let mut tables: HashMap<String, &str> = HashMap::new();
    for e in &config.entities {
        if e.name.trim().is_empty() {
            return Err(ConfigError::Validation("entity name must not be empty".into()));
        }
        if !entity_names.insert(e.name.as_str()) {
            return Err(ConfigError::DuplicateEntity(e.name.clone()));
        }
        let table = table_name(&e.name);
        if RESERVED_PATHS.contains(&table.as_str()) {
            return Err(ConfigError::Validation(format!(
                "entity {} maps to the reserved path /{}",
                e.name, table
            )));
        }
        if let Some(other) = tables.insert(table.clone(), e.name.as_str()) {
            return Err(ConfigError::DuplicateTable {
                entity: format!("{} / {}", other, e.name),
                table,
            });
        }
    }

    let fields_by_entity: HashMap<&str, HashSet<&str>> = config
        .entities
        .iter()
        .map(|e| (e.name.as_str(), e.fields.iter().map(|f| f.name.as_str()).collect()))
        .collect();

    for e in &config.entities {
        let mut seen = HashSet::new();
        for f in &e.fields {
            if f.name.trim().is_empty() {
                return Err(ConfigError::Validation(format!("entity {} has a field with no name", e.name)));
            }
            if RESERVED_FIELDS.contains(&f.name.as_str()) || CONTROL_PARAMS.contains(&f.name.as_str()) {
                return Err(ConfigError::ReservedField {
                    entity: e.name.clone(),
                    field: f.name.clone(),
                });
            }
            if !seen.insert(f.name.as_str()) {
                return Err(ConfigError::DuplicateField {
                    entity: e.name.clone(),
                    field: f.name.clone(),
                });
            }
            if let (Some(min), Some(max)) = (f.min, f.max) {
                if min > max {
                    return Err(ConfigError::Validation(format!(
                        "{}.{}: min {} is greater than max {}",
                        e.name, f.name, min, max
                    )));
                }
            }
            if let Some(pattern) = f.pattern.as_deref().filter(|p| !p.is_empty()) {
                Regex::new(pattern).map_err(|err| ConfigError::InvalidPattern {
                    entity: e.name.clone(),
                    field: f.name.clone(),
                    message: err.to_string(),
                })?;
            }
        }

        for r in &e.relations {
            let kind = RelationKind::parse(&r.type_).ok_or_else(|| ConfigError::UnknownRelation {
                entity: e.name.clone(),
                kind: r.type_.clone(),
            })?;
            let target_fields = fields_by_entity.get(r.entity.as_str()).ok_or_else(|| ConfigError::MissingReference {
                kind: "entity",
                id: r.entity.clone(),
            })?;
            let (fk_owner, fk_fields) = match kind {
                RelationKind::BelongsTo => (e.name.as_str(), &seen),
                RelationKind::HasMany => (r.entity.as_str(), target_fields),
            };
            if !fk_fields.contains(r.field.as_str()) {
                return Err(ConfigError::MissingReference {
                    kind: "field",
                    id: format!("{}.{}", fk_owner, r.field),
                });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::from_yaml_str;

    fn check(yaml: &str) -> Result<(), ConfigError> {
        validate(&from_yaml_str(yaml).expect("parse"))
    }

    #[test]
    fn accepts_belongs_to_with_declared_fk() {
        let yaml = r#"
entities:
  - name: User
    fields:
      - { name: name, type: string }
  - name: Profile
    fields:
      - { name: user_id, type: int }
    relations:
      - { type: belongs_to, entity: User, field: user_id }
"#;
        assert!(check(yaml).is_ok());
    }

    #[test]
    fn rejects_unknown_relation_target() {
        let yaml = r#"
entities:
  - name: Post
    fields:
      - { name: author_id, type: int }
    relations:
      - { type: belongs_to, entity: Author, field: author_id }
"#;
        assert!(matches!(
            check(yaml),
            Err(ConfigError::MissingReference { kind: "entity", .. })
        ));
    }

    #[test]
    fn rejects_has_many_fk_missing_on_target() {
        let yaml = r#"
entities:
  - name: User
    relations:
      - { type: has_many, entity: Post, field: user_id }
  - name: Post
    fields:
      - { name: title, type: string }
"#;
        assert!(matches!(
            check(yaml),
            Err(ConfigError::MissingReference { kind: "field", .. })
        ));
    }

    #[test]
    fn rejects_duplicates_and_reserved_names() {
        let dup_entity = "entities:\n  - name: User\n  - name: User\n";
        assert!(matches!(check(dup_entity), Err(ConfigError::DuplicateEntity(_))));

        let dup_field = "entities:\n  - name: User\n    fields:\n      - { name: a, type: string }\n      - { name: a, type: int }\n";
        assert!(matches!(check(dup_field), Err(ConfigError::DuplicateField { .. })));

        let reserved = "entities:\n  - name: User\n    fields:\n      - { name: created_at, type: string }\n";
        assert!(matches!(check(reserved), Err(ConfigError::ReservedField { .. })));
    }

    #[test]
    fn rejects_fields_named_like_query_controls() {
        for name in ["limit", "offset", "sort", "expand"] {
            let yaml = format!("entities:\n  - name: Item\n    fields:\n      - {{ name: {}, type: int }}\n", name);
            assert!(
                matches!(check(&yaml), Err(ConfigError::ReservedField { ref field, .. }) if field == name),
                "{} accepted",
                name
            );
        }
        assert!(check("entities:\n  - name: Item\n    fields:\n      - { name: sorted, type: bool }\n").is_ok());
    }

    #[test]
    fn rejects_tables_shadowing_builtin_paths() {
        assert!(matches!(check("entities:\n  - name: Doc\n"), Err(ConfigError::Validation(_))));
        assert!(check("entities:\n  - name: Document\n").is_ok());
    }

    #[test]
    fn rejects_bad_pattern_and_relation_kind() {
        let pattern = "entities:\n  - name: User\n    fields:\n      - { name: code, type: string, pattern: '([a-z' }\n";
        assert!(matches!(check(pattern), Err(ConfigError::InvalidPattern { .. })));

        let kind = "entities:\n  - name: User\n    relations:\n      - { type: many_to_many, entity: User, field: x }\n";
        assert!(matches!(check(kind), Err(ConfigError::UnknownRelation { .. })));
    }
}
