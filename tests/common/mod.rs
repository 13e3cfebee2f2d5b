#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use skema::config::from_yaml_str;
use skema::{app, connect, materialize, resolve, AppState};
use sqlx::SqlitePool;
use tower::ServiceExt;

pub const USERS_AND_PROFILES: &str = r#"
server:
  name: "Test API"
entities:
  - name: User
    fields:
      - { name: name, type: string, required: true }
      - { name: email, type: string, format: email, unique: true }
      - { name: age, type: int, min: 18 }
      - { name: active, type: bool }
    relations:
      - { type: has_many, entity: Profile, field: user_id }
  - name: Profile
    fields:
      - { name: bio, type: text }
      - { name: user_id, type: int }
    relations:
      - { type: belongs_to, entity: User, field: user_id }
"#;

/// Fresh in-memory database with tables materialized, and the full router over it.
pub async fn setup(yaml: &str) -> (Router, SqlitePool) {
    let config = from_yaml_str(yaml).expect("parse config");
    let registry = resolve(&config).expect("resolve config");
    let pool = connect("sqlite::memory:").await.expect("connect");
    materialize(&pool, &registry).await.expect("materialize");
    let state = AppState::new(pool.clone(), registry, config.server.name.clone());
    (app(state), pool)
}

pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.expect("router response");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("read body")
        .to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, body)
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::builder().uri(uri).body(Body::empty()).expect("valid GET request")).await
}

pub async fn delete(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(
        app,
        Request::builder()
            .method("DELETE")
            .uri(uri)
            .body(Body::empty())
            .expect("valid DELETE request"),
    )
    .await
}

pub async fn write_raw(app: &Router, method: &str, uri: &str, body: &str) -> (StatusCode, Value) {
    send(
        app,
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("valid write request"),
    )
    .await
}

pub async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    write_raw(app, "POST", uri, &body.to_string()).await
}

pub async fn put(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    write_raw(app, "PUT", uri, &body.to_string()).await
}

/// Ids of a list response, in order.
pub fn ids(body: &Value) -> Vec<i64> {
    body["data"]
        .as_array()
        .expect("data array")
        .iter()
        .map(|row| row["id"].as_i64().expect("integer id"))
        .collect()
}
