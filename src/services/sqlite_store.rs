use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::database::schema::{is_unique_violation, now_timestamp};
use crate::database::{likes_repo, matches_repo, profiles_repo, swipes_repo};
use crate::models::{
    canonical_pair, CandidateProfile, LikeRecord, MatchRecord, SwipeDirection, SwipeRecord,
};
use crate::services::store::{
    LikeOutcome, PhotoSource, ProfileSource, StoreError, StoreResult, SwipeOutcome, SwipeStore,
};

const CANDIDATE_PAGE_SIZE: i64 = 50;

/// SQLite implementation of every store contract.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
    page_size: i64,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            page_size: CANDIDATE_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: i64) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Like `fetch_candidates` with an explicit page size.
    pub async fn candidates_page(
        &self,
        user_id: &str,
        exclude_ids: &[String],
        limit: i64,
    ) -> StoreResult<Vec<CandidateProfile>> {
        let rows = profiles_repo::load_candidates(&self.pool, user_id, exclude_ids, limit).await?;
        Ok(rows.into_iter().map(CandidateProfile::from).collect())
    }

    pub async fn list_matches_for_user(
        &self,
        user_id: &str,
        limit: i64,
    ) -> StoreResult<Vec<MatchRecord>> {
        Ok(matches_repo::list_matches_for_user(&self.pool, user_id, limit).await?)
    }
}

fn classify(err: sqlx::Error, key: impl FnOnce() -> String) -> StoreError {
    if is_unique_violation(&err) {
        StoreError::Duplicate(key())
    } else {
        StoreError::Database(err)
    }
}

#[async_trait]
impl ProfileSource for SqliteStore {
    async fn fetch_candidates(
        &self,
        user_id: &str,
        exclude_ids: &[String],
    ) -> StoreResult<Vec<CandidateProfile>> {
        self.candidates_page(user_id, exclude_ids, self.page_size)
            .await
    }

    async fn fetch_profile(&self, profile_id: &str) -> StoreResult<Option<CandidateProfile>> {
        let row = profiles_repo::load_profile(&self.pool, profile_id).await?;
        Ok(row.map(CandidateProfile::from))
    }
}

#[async_trait]
impl PhotoSource for SqliteStore {
    async fn fetch_photos(&self, profile_id: &str) -> StoreResult<Vec<String>> {
        Ok(profiles_repo::load_photo_urls(&self.pool, profile_id).await?)
    }
}

#[async_trait]
impl SwipeStore for SqliteStore {
    async fn record_swipe(
        &self,
        swiper_id: &str,
        target_id: &str,
        direction: SwipeDirection,
    ) -> StoreResult<SwipeOutcome> {
        let record = SwipeRecord {
            swipe_id: Uuid::new_v4().to_string(),
            swiper_id: swiper_id.to_string(),
            target_id: target_id.to_string(),
            direction,
            created_at: now_timestamp(),
        };

        let inserted = swipes_repo::insert_swipe(
            &self.pool,
            swipes_repo::NewSwipe {
                swipe_id: &record.swipe_id,
                swiper_id,
                target_id,
                direction,
                created_at: &record.created_at,
            },
        )
        .await;

        match inserted {
            Ok(_) => Ok(SwipeOutcome::Recorded(record)),
            Err(e) if is_unique_violation(&e) => {
                debug!(swiper_id, target_id, direction = direction.as_str(), "swipe already recorded");
                Ok(SwipeOutcome::DuplicateOk)
            }
            Err(e) => Err(StoreError::Database(e)),
        }
    }

    async fn has_liked(&self, liker_id: &str, liked_id: &str) -> StoreResult<bool> {
        Ok(likes_repo::has_liked(&self.pool, liker_id, liked_id).await?)
    }

    async fn create_like(&self, liker_id: &str, liked_id: &str) -> StoreResult<LikeOutcome> {
        let created_at = now_timestamp();
        match likes_repo::insert_like(&self.pool, liker_id, liked_id, &created_at).await {
            Ok(()) => Ok(LikeOutcome::Created(LikeRecord {
                liker_id: liker_id.to_string(),
                liked_id: liked_id.to_string(),
                created_at,
            })),
            Err(e) if is_unique_violation(&e) => {
                let existing = likes_repo::load_like(&self.pool, liker_id, liked_id)
                    .await?
                    .ok_or_else(|| StoreError::NotFound(format!("like {liker_id}->{liked_id}")))?;
                Ok(LikeOutcome::Existing(existing))
            }
            Err(e) => Err(StoreError::Database(e)),
        }
    }

    async fn get_like(&self, liker_id: &str, liked_id: &str) -> StoreResult<Option<LikeRecord>> {
        Ok(likes_repo::load_like(&self.pool, liker_id, liked_id).await?)
    }

    async fn remove_like(&self, liker_id: &str, liked_id: &str) -> StoreResult<bool> {
        let removed = likes_repo::delete_like(&self.pool, liker_id, liked_id).await?;
        Ok(removed > 0)
    }

    async fn get_existing_match(&self, a: &str, b: &str) -> StoreResult<Option<MatchRecord>> {
        let (user1_id, user2_id) = canonical_pair(a, b);
        Ok(matches_repo::load_match(&self.pool, user1_id, user2_id).await?)
    }

    async fn create_match(&self, a: &str, b: &str) -> StoreResult<MatchRecord> {
        let (user1_id, user2_id) = canonical_pair(a, b);
        let record = MatchRecord {
            match_id: Uuid::new_v4().to_string(),
            user1_id: user1_id.to_string(),
            user2_id: user2_id.to_string(),
            matched_at: now_timestamp(),
        };
        matches_repo::insert_match(&self.pool, &record)
            .await
            .map_err(|e| classify(e, || format!("match {user1_id}:{user2_id}")))?;
        Ok(record)
    }
}
