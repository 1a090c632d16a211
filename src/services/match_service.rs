use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::models::MatchRecord;
use crate::services::notification_service::{match_notification, notify_detached};
use crate::services::store::{Notifier, StoreError, StoreResult, SwipeStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchConfig {
    /// Wait before the first reverse-like read so a just-written like can land.
    pub initial_delay: Duration,
    /// Extra reverse-like reads when the first one comes back negative.
    pub retries: u32,
    pub retry_interval: Duration,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(400),
            retries: 2,
            retry_interval: Duration::from_millis(250),
        }
    }
}

impl MatchConfig {
    pub fn immediate() -> Self {
        Self {
            initial_delay: Duration::ZERO,
            retries: 0,
            retry_interval: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MatchCheck {
    Matched {
        record: MatchRecord,
        /// False when the other side's check already wrote the row.
        created: bool,
    },
    NotMatched,
}

impl MatchCheck {
    pub fn record(&self) -> Option<&MatchRecord> {
        match self {
            MatchCheck::Matched { record, .. } => Some(record),
            MatchCheck::NotMatched => None,
        }
    }
}

/// Decides whether a fresh like completes a mutual pair.
///
/// Correctness rests on canonical pair ordering plus reading the existing row
/// before inserting; the delay and the re-reads only shorten the window in
/// which a lagging store hides the partner's like.
pub struct MatchService {
    store: Arc<dyn SwipeStore>,
    notifier: Arc<dyn Notifier>,
    config: MatchConfig,
}

impl MatchService {
    pub fn new(store: Arc<dyn SwipeStore>, notifier: Arc<dyn Notifier>, config: MatchConfig) -> Self {
        Self {
            store,
            notifier,
            config,
        }
    }

    /// Runs after `liker_id`'s like on `liked_id` is durable. Never fails:
    /// store errors are logged and reported as `NotMatched`, and the next like
    /// from either side re-runs the same check.
    pub async fn check_for_match(&self, liker_id: &str, liked_id: &str) -> MatchCheck {
        self.check(liker_id, liked_id, true).await
    }

    /// One reverse-like read with no delay or retries. A `NotMatched` here is
    /// not final; callers that need certainty follow up with `check_for_match`.
    pub async fn check_now(&self, liker_id: &str, liked_id: &str) -> MatchCheck {
        self.check(liker_id, liked_id, false).await
    }

    async fn check(&self, liker_id: &str, liked_id: &str, patient: bool) -> MatchCheck {
        if liker_id == liked_id {
            return MatchCheck::NotMatched;
        }

        if patient && !self.config.initial_delay.is_zero() {
            tokio::time::sleep(self.config.initial_delay).await;
        }

        let retries = if patient { self.config.retries } else { 0 };
        match self.reverse_like_visible(liker_id, liked_id, retries).await {
            Ok(true) => {}
            Ok(false) => {
                debug!(liker_id, liked_id, "no reverse like yet");
                return MatchCheck::NotMatched;
            }
            Err(e) => {
                warn!(liker_id, liked_id, "reverse like lookup failed: {}", e);
                return MatchCheck::NotMatched;
            }
        }

        match self.converge(liker_id, liked_id).await {
            Ok((record, created)) => {
                if created {
                    info!(match_id = %record.match_id, "match created");
                    notify_detached(
                        &self.notifier,
                        match_notification(&record.user1_id, &record.user2_id, &record.match_id),
                    );
                    notify_detached(
                        &self.notifier,
                        match_notification(&record.user2_id, &record.user1_id, &record.match_id),
                    );
                }
                MatchCheck::Matched { record, created }
            }
            Err(e) => {
                warn!(liker_id, liked_id, "match creation failed: {}", e);
                MatchCheck::NotMatched
            }
        }
    }

    /// Returns the single canonical row for the pair, creating it if absent.
    /// The bool is true when this call inserted it.
    pub async fn converge(&self, a: &str, b: &str) -> StoreResult<(MatchRecord, bool)> {
        if let Some(existing) = self.store.get_existing_match(a, b).await? {
            return Ok((existing, false));
        }

        match self.store.create_match(a, b).await {
            Ok(record) => Ok((record, true)),
            // Lost the insert race to the other side's check.
            Err(StoreError::Duplicate(key)) => {
                let existing = self
                    .store
                    .get_existing_match(a, b)
                    .await?
                    .ok_or(StoreError::NotFound(key))?;
                Ok((existing, false))
            }
            Err(e) => Err(e),
        }
    }

    async fn reverse_like_visible(
        &self,
        liker_id: &str,
        liked_id: &str,
        retries: u32,
    ) -> StoreResult<bool> {
        for attempt in 0..=retries {
            if self.store.has_liked(liked_id, liker_id).await? {
                return Ok(true);
            }
            if attempt < retries {
                tokio::time::sleep(self.config.retry_interval).await;
            }
        }
        Ok(false)
    }
}
