use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{api_error, store_error, ApiError};
use crate::models::SwipeDirection;
use crate::services::store::SwipeOutcome;
use crate::web::middleware::auth::AuthenticatedUser;
use crate::web::AppState;

#[derive(Debug, Deserialize)]
pub struct SwipeBody {
    target_id: String,
    /// left/right, or pass/like.
    direction: String,
}

pub async fn record_swipe(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(body): Json<SwipeBody>,
) -> Result<Json<Value>, ApiError> {
    let target_id = body.target_id.trim();
    if target_id.is_empty() || target_id == user.id {
        return Err(api_error(StatusCode::BAD_REQUEST, "invalid_target"));
    }
    let direction = SwipeDirection::parse(&body.direction)
        .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "invalid_direction"))?;

    let result = state
        .swipes
        .record_swipe(&user.id, target_id, direction)
        .await
        .map_err(store_error)?;

    // Answer from a single read; a miss gets the patient check in the
    // background, which notifies both sides if it finds the pair.
    let matched = match &result.like {
        Some(_) => {
            let check = state.matches.check_now(&user.id, target_id).await;
            if check.record().is_none() {
                let matches = Arc::clone(&state.matches);
                let (liker_id, liked_id) = (user.id.clone(), target_id.to_string());
                tokio::spawn(async move {
                    matches.check_for_match(&liker_id, &liked_id).await;
                });
            }
            check.record().cloned()
        }
        None => None,
    };

    tracing::info!(
        user_id = %user.id,
        target_id,
        direction = direction.as_str(),
        matched = matched.is_some(),
        "swipe_recorded"
    );

    let swipe = match &result.swipe {
        SwipeOutcome::Recorded(record) => json!({ "duplicate": false, "record": record }),
        SwipeOutcome::DuplicateOk => json!({ "duplicate": true, "record": null }),
    };
    let like = result
        .like
        .as_ref()
        .map(|like| json!({ "new": like.is_new(), "record": like.record() }));

    Ok(Json(json!({
        "swipe": swipe,
        "like": like,
        "match": matched,
    })))
}

pub async fn undo_like(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(liked_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let removed = state
        .swipes
        .undo_like(&user.id, &liked_id)
        .await
        .map_err(store_error)?;
    Ok(Json(json!({ "removed": removed })))
}
