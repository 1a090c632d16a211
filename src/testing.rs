//! In-memory fakes for the store contracts, with call counters and scripted
//! failures.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::database::schema::now_timestamp;
use crate::models::{
    canonical_pair, CandidateProfile, LikeRecord, MatchRecord, NotificationRequest,
    SwipeDirection, SwipeRecord,
};
use crate::services::store::{
    LikeOutcome, Notifier, PhotoSource, ProfileSource, StoreError, StoreResult, SwipeOutcome,
    SwipeStore,
};

#[derive(Default)]
struct MemoryState {
    profiles: Vec<CandidateProfile>,
    photos: HashMap<String, Vec<String>>,
    swipes: Vec<SwipeRecord>,
    likes: HashMap<(String, String), LikeRecord>,
    matches: HashMap<(String, String), MatchRecord>,
    // (liker, liked) -> number of has_liked reads that still miss the row
    lagging_likes: HashMap<(String, String), usize>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
    pub record_swipe_calls: AtomicUsize,
    pub create_like_calls: AtomicUsize,
    pub remove_like_calls: AtomicUsize,
    pub has_liked_calls: AtomicUsize,
    pub create_match_calls: AtomicUsize,
    pub fetch_photos_calls: AtomicUsize,
    pub fetch_profile_calls: AtomicUsize,
    pub fail_photos: AtomicBool,
    pub fail_profiles: AtomicBool,
    pub fail_swipes: AtomicBool,
    pub fail_create_match: AtomicUsize,
    photo_delay: Mutex<Option<Duration>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profiles(profiles: Vec<CandidateProfile>) -> Self {
        let store = Self::default();
        store.state.lock().profiles = profiles;
        store
    }

    pub fn set_photos(&self, profile_id: &str, photos: Vec<String>) {
        self.state
            .lock()
            .photos
            .insert(profile_id.to_string(), photos);
    }

    pub fn set_photo_delay(&self, delay: Duration) {
        *self.photo_delay.lock() = Some(delay);
    }

    pub fn insert_like(&self, liker_id: &str, liked_id: &str) {
        self.state.lock().likes.insert(
            (liker_id.to_string(), liked_id.to_string()),
            LikeRecord {
                liker_id: liker_id.to_string(),
                liked_id: liked_id.to_string(),
                created_at: now_timestamp(),
            },
        );
    }

    /// Makes the next `reads` `has_liked(liker, liked)` calls miss an existing row.
    pub fn lag_like_visibility(&self, liker_id: &str, liked_id: &str, reads: usize) {
        self.state
            .lock()
            .lagging_likes
            .insert((liker_id.to_string(), liked_id.to_string()), reads);
    }

    pub fn swipes(&self) -> Vec<SwipeRecord> {
        self.state.lock().swipes.clone()
    }

    pub fn like_count(&self) -> usize {
        self.state.lock().likes.len()
    }

    pub fn matches(&self) -> Vec<MatchRecord> {
        self.state.lock().matches.values().cloned().collect()
    }

    pub fn calls(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProfileSource for MemoryStore {
    async fn fetch_candidates(
        &self,
        user_id: &str,
        exclude_ids: &[String],
    ) -> StoreResult<Vec<CandidateProfile>> {
        if self.fail_profiles.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("profiles offline".into()));
        }
        let state = self.state.lock();
        Ok(state
            .profiles
            .iter()
            .filter(|p| p.id != user_id && !exclude_ids.contains(&p.id))
            .filter(|p| {
                !state
                    .swipes
                    .iter()
                    .any(|s| s.swiper_id == user_id && s.target_id == p.id)
            })
            .cloned()
            .collect())
    }

    async fn fetch_profile(&self, profile_id: &str) -> StoreResult<Option<CandidateProfile>> {
        self.fetch_profile_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_profiles.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("profiles offline".into()));
        }
        Ok(self
            .state
            .lock()
            .profiles
            .iter()
            .find(|p| p.id == profile_id)
            .cloned())
    }
}

#[async_trait]
impl PhotoSource for MemoryStore {
    async fn fetch_photos(&self, profile_id: &str) -> StoreResult<Vec<String>> {
        self.fetch_photos_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.photo_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_photos.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("photos offline".into()));
        }
        Ok(self
            .state
            .lock()
            .photos
            .get(profile_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl SwipeStore for MemoryStore {
    async fn record_swipe(
        &self,
        swiper_id: &str,
        target_id: &str,
        direction: SwipeDirection,
    ) -> StoreResult<SwipeOutcome> {
        self.record_swipe_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_swipes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("swipes offline".into()));
        }
        let mut state = self.state.lock();
        let exists = state.swipes.iter().any(|s| {
            s.swiper_id == swiper_id && s.target_id == target_id && s.direction == direction
        });
        if exists {
            return Ok(SwipeOutcome::DuplicateOk);
        }
        let record = SwipeRecord {
            swipe_id: format!("swipe-{}", state.swipes.len() + 1),
            swiper_id: swiper_id.to_string(),
            target_id: target_id.to_string(),
            direction,
            created_at: now_timestamp(),
        };
        state.swipes.push(record.clone());
        Ok(SwipeOutcome::Recorded(record))
    }

    async fn has_liked(&self, liker_id: &str, liked_id: &str) -> StoreResult<bool> {
        self.has_liked_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock();
        let key = (liker_id.to_string(), liked_id.to_string());
        if let Some(remaining) = state.lagging_likes.get_mut(&key) {
            if *remaining > 0 {
                *remaining -= 1;
                return Ok(false);
            }
        }
        Ok(state.likes.contains_key(&key))
    }

    async fn create_like(&self, liker_id: &str, liked_id: &str) -> StoreResult<LikeOutcome> {
        self.create_like_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock();
        let key = (liker_id.to_string(), liked_id.to_string());
        if let Some(existing) = state.likes.get(&key) {
            return Ok(LikeOutcome::Existing(existing.clone()));
        }
        let record = LikeRecord {
            liker_id: liker_id.to_string(),
            liked_id: liked_id.to_string(),
            created_at: now_timestamp(),
        };
        state.likes.insert(key, record.clone());
        Ok(LikeOutcome::Created(record))
    }

    async fn get_like(&self, liker_id: &str, liked_id: &str) -> StoreResult<Option<LikeRecord>> {
        let key = (liker_id.to_string(), liked_id.to_string());
        Ok(self.state.lock().likes.get(&key).cloned())
    }

    async fn remove_like(&self, liker_id: &str, liked_id: &str) -> StoreResult<bool> {
        self.remove_like_calls.fetch_add(1, Ordering::SeqCst);
        let key = (liker_id.to_string(), liked_id.to_string());
        Ok(self.state.lock().likes.remove(&key).is_some())
    }

    async fn get_existing_match(&self, a: &str, b: &str) -> StoreResult<Option<MatchRecord>> {
        let (u1, u2) = canonical_pair(a, b);
        Ok(self
            .state
            .lock()
            .matches
            .get(&(u1.to_string(), u2.to_string()))
            .cloned())
    }

    async fn create_match(&self, a: &str, b: &str) -> StoreResult<MatchRecord> {
        self.create_match_calls.fetch_add(1, Ordering::SeqCst);
        let scripted_failure = self
            .fail_create_match
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if scripted_failure {
            return Err(StoreError::Unavailable("matches offline".into()));
        }
        let (u1, u2) = canonical_pair(a, b);
        let key = (u1.to_string(), u2.to_string());
        let mut state = self.state.lock();
        if state.matches.contains_key(&key) {
            return Err(StoreError::Duplicate(format!("match {u1}:{u2}")));
        }
        let record = MatchRecord {
            match_id: format!("match-{}-{}", u1, u2),
            user1_id: u1.to_string(),
            user2_id: u2.to_string(),
            matched_at: now_timestamp(),
        };
        state.matches.insert(key, record.clone());
        Ok(record)
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<NotificationRequest>>,
    pub fail: AtomicBool,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<NotificationRequest> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, request: NotificationRequest) -> StoreResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("push gateway down".into()));
        }
        self.sent.lock().push(request);
        Ok(())
    }
}

pub fn profiles(ids: &[&str]) -> Vec<CandidateProfile> {
    ids.iter()
        .map(|id| CandidateProfile::new(*id, format!("Name {id}")))
        .collect()
}
