use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use super::{store_error, ApiError};
use crate::web::middleware::auth::AuthenticatedUser;
use crate::web::AppState;

#[derive(Debug, Deserialize)]
pub struct MatchesQuery {
    limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct MatchView {
    pub match_id: String,
    pub other_user_id: String,
    pub matched_at: String,
}

pub async fn list_matches(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(query): Query<MatchesQuery>,
) -> Result<Json<Vec<MatchView>>, ApiError> {
    let records = state
        .store
        .list_matches_for_user(&user.id, query.limit.unwrap_or(50))
        .await
        .map_err(store_error)?;

    let views = records
        .iter()
        .map(|record| MatchView {
            match_id: record.match_id.clone(),
            other_user_id: record.other_user(&user.id).to_string(),
            matched_at: record.matched_at.clone(),
        })
        .collect();
    Ok(Json(views))
}
