//! Resolved entity model: config validated and flattened for runtime use.

use crate::naming::{pluralize, singular_key, table_name};
use regex::Regex;
use std::collections::HashMap;

/// System columns present on every table, in physical order around the declared fields.
pub const ID_COLUMN: &str = "id";
pub const CREATED_AT: &str = "created_at";
pub const UPDATED_AT: &str = "updated_at";
pub const RESERVED_FIELDS: [&str; 3] = [ID_COLUMN, CREATED_AT, UPDATED_AT];

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldType {
    String,
    Text,
    Integer,
    Boolean,
    Float,
    /// Unrecognized type name from config; stored and described as text.
    Other(String),
}

impl FieldType {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "string" => FieldType::String,
            "text" => FieldType::Text,
            "int" | "integer" => FieldType::Integer,
            "bool" | "boolean" => FieldType::Boolean,
            "float" => FieldType::Float,
            _ => FieldType::Other(s.to_string()),
        }
    }

    /// Column type used by the schema materializer.
    pub fn sql_type(&self) -> &'static str {
        match self {
            FieldType::String | FieldType::Text | FieldType::Other(_) => "TEXT",
            FieldType::Integer => "INTEGER",
            FieldType::Boolean => "BOOLEAN",
            FieldType::Float => "REAL",
        }
    }

    /// JSON schema type used by the API descriptor.
    pub fn json_type(&self) -> &'static str {
        match self {
            FieldType::String | FieldType::Text | FieldType::Other(_) => "string",
            FieldType::Integer => "integer",
            FieldType::Boolean => "boolean",
            FieldType::Float => "number",
        }
    }

    /// String and text fields are filtered by substring, everything else by equality.
    pub fn is_textual(&self) -> bool {
        matches!(self, FieldType::String | FieldType::Text)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldType::Integer | FieldType::Float)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldFormat {
    Email,
    Uuid,
    Other(String),
}

impl FieldFormat {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "email" => FieldFormat::Email,
            "uuid" => FieldFormat::Uuid,
            _ => FieldFormat::Other(s.to_string()),
        }
    }
}

#[derive(Clone, Debug)]
pub struct FieldDefinition {
    pub name: String,
    pub field_type: FieldType,
    pub required: bool,
    /// Enforced by a UNIQUE column constraint and a pre-write check.
    pub unique: bool,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub pattern: Option<Regex>,
    pub format: Option<FieldFormat>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RelationKind {
    BelongsTo,
    HasMany,
}

impl RelationKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "belongs_to" => Some(RelationKind::BelongsTo),
            "has_many" => Some(RelationKind::HasMany),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct RelationDefinition {
    pub kind: RelationKind,
    /// Target entity name (resolves in the registry).
    pub entity: String,
    /// Foreign key column: ours for belongs_to, the target's for has_many.
    pub field: String,
}

impl RelationDefinition {
    pub fn target_table(&self) -> String {
        table_name(&self.entity)
    }

    /// Key the expanded data is embedded under: singular for belongs_to, plural for has_many.
    pub fn embed_key(&self) -> String {
        match self.kind {
            RelationKind::BelongsTo => singular_key(&self.entity),
            RelationKind::HasMany => pluralize(&singular_key(&self.entity)),
        }
    }

    /// Whether an `expand` token names this relation's target (singular or plural, any case).
    pub fn matches_token(&self, token: &str) -> bool {
        token.eq_ignore_ascii_case(&self.entity) || token.eq_ignore_ascii_case(&self.target_table())
    }
}

#[derive(Clone, Debug)]
pub struct EntityDefinition {
    pub name: String,
    /// Table name, also the REST path segment.
    pub table: String,
    pub fields: Vec<FieldDefinition>,
    pub relations: Vec<RelationDefinition>,
}

impl EntityDefinition {
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Declared fields plus system columns.
    pub fn has_column(&self, name: &str) -> bool {
        RESERVED_FIELDS.contains(&name) || self.field(name).is_some()
    }

    pub fn belongs_to(&self) -> impl Iterator<Item = &RelationDefinition> {
        self.relations.iter().filter(|r| r.kind == RelationKind::BelongsTo)
    }
}

/// All entities, looked up by name or by table/path segment. Read-only after startup.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    entities: Vec<EntityDefinition>,
    by_table: HashMap<String, usize>,
    by_name: HashMap<String, usize>,
}

impl Registry {
    pub fn new(entities: Vec<EntityDefinition>) -> Self {
        let by_table = entities.iter().enumerate().map(|(i, e)| (e.table.clone(), i)).collect();
        let by_name = entities.iter().enumerate().map(|(i, e)| (e.name.clone(), i)).collect();
        Registry {
            entities,
            by_table,
            by_name,
        }
    }

    pub fn entities(&self) -> &[EntityDefinition] {
        &self.entities
    }

    pub fn entity_by_table(&self, table: &str) -> Option<&EntityDefinition> {
        self.by_table.get(table).map(|&i| &self.entities[i])
    }

    pub fn entity_by_name(&self, name: &str) -> Option<&EntityDefinition> {
        self.by_name.get(name).map(|&i| &self.entities[i])
    }
}
