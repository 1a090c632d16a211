//! Persistence and profile contracts the deck and the pipelines are written
//! against. `SqliteStore` implements all of them; tests swap in fakes.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{
    CandidateProfile, LikeRecord, MatchRecord, NotificationRequest, SwipeDirection, SwipeRecord,
};

#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique key already holds this row.
    #[error("duplicate key: {0}")]
    Duplicate(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// The store answered but could not serve the request right now.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("upstream error ({status}): {detail}")]
    Upstream { status: u16, detail: String },
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone, PartialEq)]
pub enum SwipeOutcome {
    Recorded(SwipeRecord),
    /// The same decision was already on file; nothing new was written.
    DuplicateOk,
}

impl SwipeOutcome {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, SwipeOutcome::DuplicateOk)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LikeOutcome {
    Created(LikeRecord),
    Existing(LikeRecord),
}

impl LikeOutcome {
    pub fn record(&self) -> &LikeRecord {
        match self {
            LikeOutcome::Created(record) | LikeOutcome::Existing(record) => record,
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, LikeOutcome::Created(_))
    }
}

#[async_trait]
pub trait ProfileSource: Send + Sync {
    async fn fetch_candidates(
        &self,
        user_id: &str,
        exclude_ids: &[String],
    ) -> StoreResult<Vec<CandidateProfile>>;

    /// Re-reads a single profile. `Ok(None)` means it no longer exists.
    async fn fetch_profile(&self, profile_id: &str) -> StoreResult<Option<CandidateProfile>>;
}

#[async_trait]
pub trait PhotoSource: Send + Sync {
    async fn fetch_photos(&self, profile_id: &str) -> StoreResult<Vec<String>>;
}

#[async_trait]
pub trait SwipeStore: Send + Sync {
    async fn record_swipe(
        &self,
        swiper_id: &str,
        target_id: &str,
        direction: SwipeDirection,
    ) -> StoreResult<SwipeOutcome>;

    async fn has_liked(&self, liker_id: &str, liked_id: &str) -> StoreResult<bool>;

    async fn create_like(&self, liker_id: &str, liked_id: &str) -> StoreResult<LikeOutcome>;

    async fn get_like(&self, liker_id: &str, liked_id: &str) -> StoreResult<Option<LikeRecord>>;

    async fn remove_like(&self, liker_id: &str, liked_id: &str) -> StoreResult<bool>;

    /// Order of `a` and `b` does not matter.
    async fn get_existing_match(&self, a: &str, b: &str) -> StoreResult<Option<MatchRecord>>;

    /// Inserts the canonical row for the pair. Fails with `Duplicate` if it exists.
    async fn create_match(&self, a: &str, b: &str) -> StoreResult<MatchRecord>;
}

/// Fire-and-forget delivery hook. Callers log and drop errors.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, request: NotificationRequest) -> StoreResult<()>;
}
