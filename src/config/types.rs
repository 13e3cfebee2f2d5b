//! Raw config types matching the skema file (YAML or JSON).

use serde::{Deserialize, Serialize};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_NAME: &str = "Skema API";
pub const DEFAULT_DATABASE: &str = "sqlite://skema.db";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_name")]
    pub name: String,
    /// Storage URL, e.g. `sqlite://skema.db` or `sqlite::memory:`.
    #[serde(default = "default_database")]
    pub database: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            port: DEFAULT_PORT,
            name: DEFAULT_NAME.to_string(),
            database: DEFAULT_DATABASE.to_string(),
        }
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_name() -> String {
    DEFAULT_NAME.to_string()
}

fn default_database() -> String {
    DEFAULT_DATABASE.to_string()
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FieldConfig {
    pub name: String,
    /// One of string, text, int/integer, bool/boolean, float.
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(default)]
    pub pattern: Option<String>,
    /// Semantic format: email, uuid.
    #[serde(default)]
    pub format: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RelationConfig {
    /// belongs_to or has_many.
    #[serde(rename = "type")]
    pub type_: String,
    pub entity: String,
    /// Foreign key column: on this entity for belongs_to, on the target for has_many.
    pub field: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EntityConfig {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldConfig>,
    #[serde(default)]
    pub relations: Vec<RelationConfig>,
}

/// Whole config file.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FullConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub entities: Vec<EntityConfig>,
}
