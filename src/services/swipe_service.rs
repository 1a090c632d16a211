use std::sync::Arc;

use tracing::{debug, warn};

use crate::models::SwipeDirection;
use crate::services::notification_service::{like_notification, notify_detached};
use crate::services::store::{
    LikeOutcome, Notifier, StoreError, StoreResult, SwipeOutcome, SwipeStore,
};

#[derive(Debug, Clone, PartialEq)]
pub struct SwipeResult {
    pub swipe: SwipeOutcome,
    /// Set for right swipes.
    pub like: Option<LikeOutcome>,
}

/// Turns a committed swipe into durable records. Re-running it for the same
/// decision is harmless.
pub struct SwipeService {
    store: Arc<dyn SwipeStore>,
    notifier: Arc<dyn Notifier>,
}

impl SwipeService {
    pub fn new(store: Arc<dyn SwipeStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }

    pub async fn record_swipe(
        &self,
        swiper_id: &str,
        target_id: &str,
        direction: SwipeDirection,
    ) -> StoreResult<SwipeResult> {
        let swipe = match self.store.record_swipe(swiper_id, target_id, direction).await {
            Ok(outcome) => outcome,
            Err(StoreError::Duplicate(key)) => {
                debug!(%key, "duplicate swipe treated as recorded");
                SwipeOutcome::DuplicateOk
            }
            Err(e) => return Err(e),
        };

        let like = match direction {
            SwipeDirection::Right => Some(self.create_like(swiper_id, target_id).await?),
            SwipeDirection::Left => {
                // A pass retracts an earlier like; the pass itself is already durable.
                if let Err(e) = self.store.remove_like(swiper_id, target_id).await {
                    warn!(swiper_id, target_id, "removing like after pass failed: {}", e);
                }
                None
            }
        };

        Ok(SwipeResult { swipe, like })
    }

    pub async fn create_like(&self, liker_id: &str, liked_id: &str) -> StoreResult<LikeOutcome> {
        let outcome = match self.store.create_like(liker_id, liked_id).await {
            Ok(outcome) => outcome,
            Err(StoreError::Duplicate(_)) => self.existing_like(liker_id, liked_id).await?,
            Err(e) => return Err(e),
        };

        if outcome.is_new() {
            notify_detached(&self.notifier, like_notification(liker_id, liked_id));
        }
        Ok(outcome)
    }

    /// Explicit undo of a like. Returns whether a like was on file.
    pub async fn undo_like(&self, liker_id: &str, liked_id: &str) -> StoreResult<bool> {
        self.store.remove_like(liker_id, liked_id).await
    }

    // Only reached when a store surfaces the raw duplicate instead of resolving it.
    async fn existing_like(&self, liker_id: &str, liked_id: &str) -> StoreResult<LikeOutcome> {
        self.store
            .get_like(liker_id, liked_id)
            .await?
            .map(LikeOutcome::Existing)
            .ok_or_else(|| StoreError::NotFound(format!("like {liker_id}->{liked_id}")))
    }
}
