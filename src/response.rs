//! Standard response envelope helpers.

use axum::{http::StatusCode, Json};
use serde::Serialize;

#[derive(Serialize)]
pub struct Success<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ListMeta>,
}

/// Pagination info on list responses. `total` ignores limit/offset.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListMeta {
    pub total: u64,
    pub limit: u32,
    pub offset: u32,
}

pub fn success_one<T: Serialize>(data: T) -> (StatusCode, Json<Success<T>>) {
    (
        StatusCode::OK,
        Json(Success {
            success: true,
            data,
            meta: None,
        }),
    )
}

pub fn success_created<T: Serialize>(data: T) -> (StatusCode, Json<Success<T>>) {
    (
        StatusCode::CREATED,
        Json(Success {
            success: true,
            data,
            meta: None,
        }),
    )
}

pub fn success_many<T: Serialize>(data: Vec<T>, meta: ListMeta) -> (StatusCode, Json<Success<Vec<T>>>) {
    (
        StatusCode::OK,
        Json(Success {
            success: true,
            data,
            meta: Some(meta),
        }),
    )
}
