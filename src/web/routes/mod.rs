pub mod candidates;
pub mod health;
pub mod matches;
pub mod swipes;

use axum::{http::StatusCode, Json};
use serde_json::{json, Value};

use crate::services::store::StoreError;

pub type ApiError = (StatusCode, Json<Value>);

pub(crate) fn api_error(status: StatusCode, code: &str) -> ApiError {
    (status, Json(json!({ "error": code })))
}

pub(crate) fn store_error(e: StoreError) -> ApiError {
    match e {
        StoreError::NotFound(what) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "not_found", "detail": what })),
        ),
        StoreError::Duplicate(what) => (
            StatusCode::CONFLICT,
            Json(json!({ "error": "duplicate", "detail": what })),
        ),
        StoreError::Upstream { status, detail } => {
            tracing::warn!(status, %detail, "upstream_failed");
            api_error(StatusCode::BAD_GATEWAY, "bad_gateway")
        }
        StoreError::Unavailable(detail) => {
            tracing::warn!(%detail, "store_unavailable");
            api_error(StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        }
        StoreError::Database(e) => {
            tracing::error!("database error: {}", e);
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "internal")
        }
    }
}
