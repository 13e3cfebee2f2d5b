//! Load config from a YAML/JSON file and resolve it into the runtime registry.

use crate::config::resolved::{
    EntityDefinition, FieldDefinition, FieldFormat, FieldType, RelationDefinition, RelationKind, Registry,
};
use crate::config::types::*;
use crate::config::validate;
use crate::error::ConfigError;
use crate::naming::table_name;
use regex::Regex;
use std::path::Path;

pub fn from_yaml_str(s: &str) -> Result<FullConfig, ConfigError> {
    serde_yaml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))
}

pub fn from_json_str(s: &str) -> Result<FullConfig, ConfigError> {
    serde_json::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))
}

/// Read a config file; `.json` is parsed as JSON, anything else as YAML.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<FullConfig, ConfigError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    let is_json = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let mut config = if is_json { from_json_str(&raw)? } else { from_yaml_str(&raw)? };
    apply_env_overrides(&mut config.server);
    tracing::debug!(path = %path.display(), entities = config.entities.len(), "config loaded");
    Ok(config)
}

/// `SKEMA_PORT` and `DATABASE_URL` override the file. Call `dotenvy::dotenv()` first to pick up `.env`.
pub fn apply_env_overrides(server: &mut ServerConfig) {
    if let Ok(port) = std::env::var("SKEMA_PORT") {
        match port.parse() {
            Ok(p) => server.port = p,
            Err(_) => tracing::warn!(value = %port, "ignoring invalid SKEMA_PORT"),
        }
    }
    if let Ok(url) = std::env::var("DATABASE_URL") {
        server.database = url;
    }
}

/// Build the registry from config (validates first).
pub fn resolve(config: &FullConfig) -> Result<Registry, ConfigError> {
    validate(config)?;

    let mut entities = Vec::with_capacity(config.entities.len());
    for e in &config.entities {
        let mut fields = Vec::with_capacity(e.fields.len());
        for f in &e.fields {
            let field_type = FieldType::parse(&f.type_);
            if let FieldType::Other(name) = &field_type {
                tracing::warn!(entity = %e.name, field = %f.name, field_type = %name, "unknown field type, stored as text");
            }
            let pattern = match f.pattern.as_deref().filter(|p| !p.is_empty()) {
                Some(p) => Some(Regex::new(p).map_err(|err| ConfigError::InvalidPattern {
                    entity: e.name.clone(),
                    field: f.name.clone(),
                    message: err.to_string(),
                })?),
                None => None,
            };
            let format = f.format.as_deref().filter(|s| !s.is_empty()).map(FieldFormat::parse);
            if let Some(FieldFormat::Other(name)) = &format {
                tracing::warn!(entity = %e.name, field = %f.name, format = %name, "unknown format, not checked");
            }
            fields.push(FieldDefinition {
                name: f.name.clone(),
                field_type,
                required: f.required,
                unique: f.unique,
                min: f.min,
                max: f.max,
                pattern,
                format,
            });
        }

        let relations = e
            .relations
            .iter()
            .map(|r| {
                let kind = RelationKind::parse(&r.type_).ok_or_else(|| ConfigError::UnknownRelation {
                    entity: e.name.clone(),
                    kind: r.type_.clone(),
                })?;
                Ok(RelationDefinition {
                    kind,
                    entity: r.entity.clone(),
                    field: r.field.clone(),
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        entities.push(EntityDefinition {
            name: e.name.clone(),
            table: table_name(&e.name),
            fields,
            relations,
        });
    }

    Ok(Registry::new(entities))
}
