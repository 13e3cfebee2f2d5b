//! HTTP handlers for entity CRUD and API documentation.

pub mod docs;
pub mod entity;
