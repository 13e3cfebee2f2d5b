//! OpenAPI document derived from the entity registry.
//!
//! Per entity: component schemas `<Name>` (stored row) and `<Name>Input` (writable fields),
//! a collection path `/<table>` (list, create) and an item path `/<table>/{id}` (read,
//! update, delete), all wrapped in the standard response envelope.

use crate::config::{EntityDefinition, FieldDefinition, FieldFormat, FieldType, Registry, CREATED_AT, ID_COLUMN, UPDATED_AT};
use crate::query::{DEFAULT_LIMIT, MAX_LIMIT};
use utoipa::openapi::content::ContentBuilder;
use utoipa::openapi::info::InfoBuilder;
use utoipa::openapi::path::{HttpMethod, Operation, OperationBuilder, Parameter, ParameterBuilder, ParameterIn, PathItem, PathsBuilder};
use utoipa::openapi::request_body::RequestBodyBuilder;
use utoipa::openapi::response::ResponseBuilder;
use utoipa::openapi::schema::{Array, ComponentsBuilder, KnownFormat, ObjectBuilder, Schema, SchemaFormat, Type};
use utoipa::openapi::tag::TagBuilder;
use utoipa::openapi::{OpenApi, OpenApiBuilder, Ref, RefOr, Required};

pub const API_VERSION: &str = "1.0.0";
const ERROR_SCHEMA: &str = "Error";
const JSON: &str = "application/json";

/// Build the document for every entity in the registry.
pub fn document(registry: &Registry, title: &str) -> OpenApi {
    let mut paths = PathsBuilder::new();
    let mut components = ComponentsBuilder::new().schema(ERROR_SCHEMA, error_schema());
    let mut tags = Vec::new();

    for entity in registry.entities() {
        components = components
            .schema(entity.name.clone(), entity_schema(entity))
            .schema(input_name(entity), input_schema(entity));
        paths = paths
            .path(format!("/{}", entity.table), collection_path(entity))
            .path(format!("/{}/{{id}}", entity.table), item_path(entity));
        tags.push(
            TagBuilder::new()
                .name(entity.name.clone())
                .description(Some(format!("Operations on {}", entity.table)))
                .build(),
        );
    }

    OpenApiBuilder::new()
        .info(
            InfoBuilder::new()
                .title(title)
                .version(API_VERSION)
                .description(Some("Generated from entity definitions"))
                .build(),
        )
        .paths(paths.build())
        .components(Some(components.build()))
        .tags(Some(tags))
        .build()
}

fn input_name(entity: &EntityDefinition) -> String {
    format!("{}Input", entity.name)
}

fn schema_ref(name: &str) -> RefOr<Schema> {
    RefOr::Ref(Ref::from_schema_name(name))
}

fn object(builder: ObjectBuilder) -> RefOr<Schema> {
    RefOr::T(Schema::Object(builder.build()))
}

fn array_of(item: RefOr<Schema>) -> RefOr<Schema> {
    RefOr::T(Schema::Array(Array::new(item)))
}

fn scalar(schema_type: Type) -> RefOr<Schema> {
    object(ObjectBuilder::new().schema_type(schema_type))
}

fn json_type(field_type: &FieldType) -> Type {
    match field_type {
        FieldType::Integer => Type::Integer,
        FieldType::Float => Type::Number,
        FieldType::Boolean => Type::Boolean,
        FieldType::String | FieldType::Text | FieldType::Other(_) => Type::String,
    }
}

fn field_schema(field: &FieldDefinition) -> RefOr<Schema> {
    let mut b = ObjectBuilder::new().schema_type(json_type(&field.field_type));
    if field.field_type.is_numeric() {
        b = b.minimum(field.min).maximum(field.max);
    }
    if let Some(re) = &field.pattern {
        b = b.pattern(Some(re.as_str()));
    }
    b = match &field.format {
        Some(FieldFormat::Email) => b.format(Some(SchemaFormat::Custom("email".into()))),
        Some(FieldFormat::Uuid) => b.format(Some(SchemaFormat::KnownFormat(KnownFormat::Uuid))),
        _ => b,
    };
    if field.unique {
        b = b.description(Some("unique"));
    }
    object(b)
}

fn timestamp_schema() -> RefOr<Schema> {
    object(
        ObjectBuilder::new()
            .schema_type(Type::String)
            .format(Some(SchemaFormat::KnownFormat(KnownFormat::DateTime))),
    )
}

/// Stored row: id, declared fields, timestamps.
fn entity_schema(entity: &EntityDefinition) -> RefOr<Schema> {
    let mut b = ObjectBuilder::new()
        .schema_type(Type::Object)
        .property(ID_COLUMN, scalar(Type::Integer))
        .required(ID_COLUMN);
    for field in &entity.fields {
        b = b.property(field.name.clone(), field_schema(field));
        if field.required {
            b = b.required(field.name.clone());
        }
    }
    b = b
        .property(CREATED_AT, timestamp_schema())
        .property(UPDATED_AT, timestamp_schema());
    object(b)
}

/// Writable fields only; system columns are always server-set.
fn input_schema(entity: &EntityDefinition) -> RefOr<Schema> {
    let mut b = ObjectBuilder::new().schema_type(Type::Object);
    for field in &entity.fields {
        b = b.property(field.name.clone(), field_schema(field));
        if field.required {
            b = b.required(field.name.clone());
        }
    }
    object(b)
}

fn error_schema() -> RefOr<Schema> {
    let detail = ObjectBuilder::new()
        .schema_type(Type::Object)
        .property("code", scalar(Type::String))
        .property("message", scalar(Type::String))
        .required("code")
        .required("message");
    object(
        ObjectBuilder::new()
            .schema_type(Type::Object)
            .property("success", scalar(Type::Boolean))
            .property("error", object(detail))
            .required("success")
            .required("error"),
    )
}

fn envelope_one(entity: &EntityDefinition) -> RefOr<Schema> {
    object(
        ObjectBuilder::new()
            .schema_type(Type::Object)
            .property("success", scalar(Type::Boolean))
            .property("data", schema_ref(&entity.name))
            .required("success")
            .required("data"),
    )
}

fn envelope_many(entity: &EntityDefinition) -> RefOr<Schema> {
    let meta = ObjectBuilder::new()
        .schema_type(Type::Object)
        .property("total", scalar(Type::Integer))
        .property("limit", scalar(Type::Integer))
        .property("offset", scalar(Type::Integer));
    object(
        ObjectBuilder::new()
            .schema_type(Type::Object)
            .property("success", scalar(Type::Boolean))
            .property("data", array_of(schema_ref(&entity.name)))
            .property("meta", object(meta))
            .required("success")
            .required("data")
            .required("meta"),
    )
}

fn json_response(description: &str, schema: RefOr<Schema>) -> RefOr<utoipa::openapi::Response> {
    RefOr::T(
        ResponseBuilder::new()
            .description(description)
            .content(JSON, ContentBuilder::new().schema(Some(schema)).build())
            .build(),
    )
}

fn error_response(description: &str) -> RefOr<utoipa::openapi::Response> {
    json_response(description, schema_ref(ERROR_SCHEMA))
}

fn query_param(name: &str, schema: RefOr<Schema>, description: String) -> Parameter {
    ParameterBuilder::new()
        .name(name)
        .parameter_in(ParameterIn::Query)
        .required(Required::False)
        .schema(Some(schema))
        .description(Some(description))
        .build()
}

fn id_param() -> Parameter {
    ParameterBuilder::new()
        .name(ID_COLUMN)
        .parameter_in(ParameterIn::Path)
        .required(Required::True)
        .schema(Some(scalar(Type::Integer)))
        .build()
}

/// `expand` is offered only when the entity declares relations.
fn expand_param(entity: &EntityDefinition) -> Option<Parameter> {
    if entity.relations.is_empty() {
        return None;
    }
    let names: Vec<String> = entity.relations.iter().map(|r| r.embed_key()).collect();
    Some(query_param(
        "expand",
        scalar(Type::String),
        format!("Comma-separated relations to embed: {}", names.join(", ")),
    ))
}

fn base_operation(entity: &EntityDefinition, id: String, summary: String) -> OperationBuilder {
    OperationBuilder::new()
        .tag(entity.name.clone())
        .operation_id(Some(id))
        .summary(Some(summary))
}

fn input_body(entity: &EntityDefinition) -> utoipa::openapi::request_body::RequestBody {
    RequestBodyBuilder::new()
        .content(
            JSON,
            ContentBuilder::new().schema(Some(schema_ref(&input_name(entity)))).build(),
        )
        .required(Some(Required::True))
        .build()
}

fn list_operation(entity: &EntityDefinition) -> Operation {
    let mut op = base_operation(entity, format!("list_{}", entity.table), format!("List {}", entity.table))
        .parameter(query_param(
            "limit",
            scalar(Type::Integer),
            format!("Maximum rows returned (default {}, at most {})", DEFAULT_LIMIT, MAX_LIMIT),
        ))
        .parameter(query_param("offset", scalar(Type::Integer), "Rows skipped (default 0)".into()))
        .parameter(query_param(
            "sort",
            scalar(Type::String),
            "field, field:asc or field:desc (default created_at:desc)".into(),
        ));
    if let Some(p) = expand_param(entity) {
        op = op.parameter(p);
    }
    for field in &entity.fields {
        let how = if field.field_type.is_textual() { "substring" } else { "exact" };
        op = op.parameter(query_param(
            &field.name,
            scalar(json_type(&field.field_type)),
            format!("Filter by {} ({} match)", field.name, how),
        ));
    }
    op.response("200", json_response("Matching rows", envelope_many(entity)))
        .build()
}

fn create_operation(entity: &EntityDefinition) -> Operation {
    base_operation(entity, format!("create_{}", entity.table), format!("Create {}", entity.name))
        .request_body(Some(input_body(entity)))
        .response("201", json_response("Created", envelope_one(entity)))
        .response("400", error_response("Validation failed"))
        .build()
}

fn read_operation(entity: &EntityDefinition) -> Operation {
    let mut op = base_operation(entity, format!("get_{}", entity.table), format!("Get {} by id", entity.name))
        .parameter(id_param());
    if let Some(p) = expand_param(entity) {
        op = op.parameter(p);
    }
    op.response("200", json_response("Found", envelope_one(entity)))
        .response("404", error_response("Not found"))
        .build()
}

fn update_operation(entity: &EntityDefinition) -> Operation {
    base_operation(entity, format!("update_{}", entity.table), format!("Update {}", entity.name))
        .parameter(id_param())
        .request_body(Some(input_body(entity)))
        .response("200", json_response("Updated", envelope_one(entity)))
        .response("400", error_response("Validation failed"))
        .response("404", error_response("Not found"))
        .build()
}

fn delete_operation(entity: &EntityDefinition) -> Operation {
    base_operation(entity, format!("delete_{}", entity.table), format!("Delete {}", entity.name))
        .parameter(id_param())
        .response("204", RefOr::T(ResponseBuilder::new().description("Deleted").build()))
        .build()
}

fn collection_path(entity: &EntityDefinition) -> PathItem {
    let mut item = PathItem::new(HttpMethod::Get, list_operation(entity));
    item.post = Some(create_operation(entity));
    item
}

fn item_path(entity: &EntityDefinition) -> PathItem {
    let mut item = PathItem::new(HttpMethod::Get, read_operation(entity));
    item.put = Some(update_operation(entity));
    item.delete = Some(delete_operation(entity));
    item
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{from_yaml_str, resolve};
    use serde_json::Value;

    fn doc() -> Value {
        let yaml = r#"
entities:
  - name: User
    fields:
      - { name: name, type: string, required: true }
      - { name: email, type: string, format: email, unique: true }
      - { name: age, type: int, min: 18 }
      - { name: active, type: bool }
      - { name: rating, type: float }
    relations:
      - { type: has_many, entity: Profile, field: user_id }
  - name: Tag
    fields:
      - { name: label, type: text }
  - name: Profile
    fields:
      - { name: user_id, type: int }
    relations:
      - { type: belongs_to, entity: User, field: user_id }
"#;
        let reg = resolve(&from_yaml_str(yaml).unwrap()).unwrap();
        serde_json::to_value(document(&reg, "Test API")).unwrap()
    }

    fn param_names(op: &Value) -> Vec<String> {
        op["parameters"]
            .as_array()
            .map(|ps| ps.iter().map(|p| p["name"].as_str().unwrap().to_string()).collect())
            .unwrap_or_default()
    }

    #[test]
    fn info_and_tags() {
        let d = doc();
        assert_eq!(d["info"]["title"], "Test API");
        let tags: Vec<&str> = d["tags"].as_array().unwrap().iter().map(|t| t["name"].as_str().unwrap()).collect();
        assert_eq!(tags, vec!["User", "Tag", "Profile"]);
    }

    #[test]
    fn component_schema_collapses_types_and_lists_required() {
        let d = doc();
        let user = &d["components"]["schemas"]["User"];
        let props = &user["properties"];
        assert_eq!(props["id"]["type"], "integer");
        assert_eq!(props["name"]["type"], "string");
        assert_eq!(props["email"]["type"], "string");
        assert_eq!(props["email"]["format"], "email");
        assert_eq!(props["age"]["type"], "integer");
        assert_eq!(props["active"]["type"], "boolean");
        assert_eq!(props["rating"]["type"], "number");
        assert_eq!(props["created_at"]["format"], "date-time");
        assert_eq!(props["updated_at"]["type"], "string");
        let required: Vec<&str> = user["required"].as_array().unwrap().iter().map(|v| v.as_str().unwrap()).collect();
        assert!(required.contains(&"name"));
        assert!(!required.contains(&"age"));

        let input = &d["components"]["schemas"]["UserInput"]["properties"];
        assert!(input.get("id").is_none());
        assert!(input.get("created_at").is_none());
        assert!(input.get("name").is_some());
    }

    #[test]
    fn collection_and_item_paths() {
        let d = doc();
        let users = &d["paths"]["/users"];
        assert!(users["get"].is_object());
        assert!(users["post"].is_object());
        let list_params = param_names(&users["get"]);
        for p in ["limit", "offset", "sort", "expand", "name", "email", "age", "active", "rating"] {
            assert!(list_params.contains(&p.to_string()), "missing {}", p);
        }
        assert_eq!(users["post"]["responses"]["201"]["content"]["application/json"]["schema"]["properties"]["data"]["$ref"], "#/components/schemas/User");

        let item = &d["paths"]["/users/{id}"];
        assert!(item["get"].is_object());
        assert!(item["put"].is_object());
        assert!(item["delete"].is_object());
        assert!(param_names(&item["get"]).contains(&"id".to_string()));
        assert!(param_names(&item["get"]).contains(&"expand".to_string()));
    }

    #[test]
    fn expand_offered_only_with_relations() {
        let d = doc();
        assert!(!param_names(&d["paths"]["/tags"]["get"]).contains(&"expand".to_string()));
        assert!(param_names(&d["paths"]["/profiles"]["get"]).contains(&"expand".to_string()));
    }

    #[test]
    fn list_envelope_has_meta() {
        let d = doc();
        let schema = &d["paths"]["/users"]["get"]["responses"]["200"]["content"]["application/json"]["schema"];
        assert_eq!(schema["properties"]["data"]["type"], "array");
        assert_eq!(schema["properties"]["data"]["items"]["$ref"], "#/components/schemas/User");
        assert!(schema["properties"]["meta"]["properties"]["total"].is_object());
    }
}
