use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{store_error, ApiError};
use crate::models::CandidateProfile;
use crate::web::middleware::auth::AuthenticatedUser;
use crate::web::AppState;

#[derive(Debug, Deserialize)]
pub struct CandidatesQuery {
    /// Comma separated profile ids the client already holds.
    exclude: Option<String>,
    limit: Option<i64>,
}

fn parse_exclude(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or("")
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

pub async fn list_candidates(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(query): Query<CandidatesQuery>,
) -> Result<Json<Vec<CandidateProfile>>, ApiError> {
    let exclude = parse_exclude(query.exclude.as_deref());
    let limit = query.limit.unwrap_or(20).clamp(1, 100);

    let candidates = state
        .store
        .candidates_page(&user.id, &exclude, limit)
        .await
        .map_err(store_error)?;

    tracing::debug!(user_id = %user.id, count = candidates.len(), "candidates_listed");
    Ok(Json(candidates))
}

pub async fn profile_photos(
    State(state): State<AppState>,
    Path(profile_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let photos = state
        .photos
        .fetch_photos(&profile_id)
        .await
        .map_err(store_error)?;
    Ok(Json(json!({ "profile_id": profile_id, "photos": photos })))
}
