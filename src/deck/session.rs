//! One user's swiping session: wires the card stack, preload cache and the
//! persistence pipelines together and reports what happened as `DeckEvent`s.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::AppConfig;
use crate::deck::card_stack::{CardStack, CardTransform, DeckConfig, ReleaseOutcome, SwipeCommit};
use crate::deck::gesture::{GestureSession, HapticPulse};
use crate::deck::preload::{CachedCard, PreloadCache};
use crate::models::{CandidateProfile, SwipeDirection};
use crate::services::match_service::{MatchCheck, MatchService};
use crate::services::store::{PhotoSource, ProfileSource, StoreResult};
use crate::services::swipe_service::SwipeService;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeckEvent {
    SwipeCommitted {
        direction: SwipeDirection,
        profile_id: String,
    },
    MatchFound {
        match_id: String,
        other_profile: CandidateProfile,
    },
}

/// Collaborators a session is built from.
#[derive(Clone)]
pub struct DeckServices {
    pub profiles: Arc<dyn ProfileSource>,
    pub photos: Arc<dyn PhotoSource>,
    pub swipes: Arc<SwipeService>,
    pub matches: Arc<MatchService>,
}

pub struct SwipeSession {
    user_id: String,
    services: DeckServices,
    stack: CardStack,
    cache: PreloadCache,
    listing: HashMap<String, CandidateProfile>,
    gesture: Option<GestureSession>,
    events: mpsc::UnboundedSender<DeckEvent>,
    /// Swipe writes still running, keyed by target id.
    persistence: Vec<(String, JoinHandle<()>)>,
}

impl SwipeSession {
    pub fn new(
        user_id: impl Into<String>,
        services: DeckServices,
        config: DeckConfig,
        look_ahead: usize,
    ) -> (Self, mpsc::UnboundedReceiver<DeckEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let cache = PreloadCache::new(
            Arc::clone(&services.profiles),
            Arc::clone(&services.photos),
            look_ahead,
        );
        let session = Self {
            user_id: user_id.into(),
            services,
            stack: CardStack::new(config),
            cache,
            listing: HashMap::new(),
            gesture: None,
            events,
            persistence: Vec::new(),
        };
        (session, rx)
    }

    /// Builds a session with the deck layout and look-ahead from `config`.
    pub fn from_config(
        user_id: impl Into<String>,
        services: DeckServices,
        config: &AppConfig,
    ) -> (Self, mpsc::UnboundedReceiver<DeckEvent>) {
        Self::new(user_id, services, config.deck.clone(), config.look_ahead)
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn stack(&self) -> &CardStack {
        &self.stack
    }

    pub fn cache(&self) -> &PreloadCache {
        &self.cache
    }

    /// Fetches the next batch of candidates and appends them to the deck.
    /// Returns how many new cards were added.
    ///
    /// Only ids the store cannot filter yet are excluded: cards still in the
    /// deck and swipes whose write has not landed.
    pub async fn load_more(&mut self) -> StoreResult<usize> {
        let exclude: Vec<String> = self.unsettled_ids().into_iter().collect();
        let fetched = self
            .services
            .profiles
            .fetch_candidates(&self.user_id, &exclude)
            .await?;

        let mut new_ids = Vec::new();
        for profile in fetched {
            if profile.id == self.user_id || self.is_swiped(&profile.id) {
                continue;
            }
            self.cache.merge(&profile);
            if !self.listing.contains_key(&profile.id) {
                new_ids.push(profile.id.clone());
            }
            self.listing.insert(profile.id.clone(), profile);
        }

        let added = self.stack.push_profiles(new_ids);
        self.advance_window();
        debug!(user_id = %self.user_id, added, "deck extended");
        Ok(added)
    }

    /// True when fewer cards are left than the cache looks ahead.
    pub fn needs_more(&self) -> bool {
        self.stack.remaining() <= self.cache.look_ahead()
    }

    pub fn begin_drag(&mut self) -> bool {
        if self.stack.front_id().is_none() {
            return false;
        }
        self.gesture = Some(GestureSession::begin(self.stack.config().gesture));
        true
    }

    /// One drag sample. Returns a haptic pulse when the tier changed.
    pub fn drag(&mut self, dx: f64) -> Option<HapticPulse> {
        let gesture = self.gesture.as_mut()?;
        let pulse = gesture.update(dx);
        if !self.stack.drag(gesture.dx()) {
            self.gesture = None;
            return None;
        }
        pulse
    }

    pub fn release(&mut self) -> ReleaseOutcome {
        let Some(gesture) = self.gesture.take() else {
            return ReleaseOutcome::Ignored;
        };
        match self.stack.resolve(gesture.finish()) {
            ReleaseOutcome::Committed(commit) => {
                self.after_commit(&commit);
                ReleaseOutcome::Committed(commit)
            }
            other => other,
        }
    }

    pub fn like(&mut self) -> Option<SwipeCommit> {
        self.commit(SwipeDirection::Right)
    }

    pub fn pass(&mut self) -> Option<SwipeCommit> {
        self.commit(SwipeDirection::Left)
    }

    /// Advances animations. Finished exits free their state and may let the
    /// cache evict them.
    pub fn tick(&mut self, dt: Duration) -> Vec<String> {
        let removed = self.stack.tick(dt);
        if !removed.is_empty() {
            self.cache
                .evict(self.stack.cursor(), self.stack.pending_exits());
            self.prune_listing();
        }
        removed
    }

    /// Listing entries held for cards in the deck or still exiting.
    pub fn listing_len(&self) -> usize {
        self.listing.len()
    }

    pub fn snapshot(&self) -> Vec<CardTransform> {
        self.stack.snapshot()
    }

    /// Hydrated card if cached, else whatever the listing had.
    pub fn card(&self, profile_id: &str) -> Option<CachedCard> {
        self.cache
            .get(profile_id)
            .or_else(|| self.listing.get(profile_id).map(CachedCard::from_listing))
    }

    pub fn front_card(&self) -> Option<CachedCard> {
        self.stack.front_id().and_then(|id| self.card(id))
    }

    /// Waits for outstanding persistence calls and preloads.
    pub async fn settle(&mut self) {
        for (_, task) in std::mem::take(&mut self.persistence) {
            if let Err(e) = task.await {
                warn!("swipe persistence task failed: {}", e);
            }
        }
        self.cache.settle().await;
    }

    /// Drops all local state. Persistence already issued keeps running.
    pub fn clear(&mut self) {
        self.gesture = None;
        self.stack.clear();
        self.cache.clear();
        self.listing.clear();
        self.persistence.clear();
    }

    fn commit(&mut self, direction: SwipeDirection) -> Option<SwipeCommit> {
        self.gesture = None;
        let commit = self.stack.commit(direction)?;
        self.after_commit(&commit);
        Some(commit)
    }

    fn after_commit(&mut self, commit: &SwipeCommit) {
        let _ = self.events.send(DeckEvent::SwipeCommitted {
            direction: commit.direction,
            profile_id: commit.profile_id.clone(),
        });

        let other_profile = self
            .card(&commit.profile_id)
            .map(|card| card.profile)
            .unwrap_or_else(|| CandidateProfile::new(commit.profile_id.clone(), ""));
        self.persistence.retain(|(_, t)| !t.is_finished());
        let task = tokio::spawn(persist_swipe(
            Arc::clone(&self.services.swipes),
            Arc::clone(&self.services.matches),
            self.events.clone(),
            self.user_id.clone(),
            commit.direction,
            other_profile,
        ));
        self.persistence.push((commit.profile_id.clone(), task));

        self.advance_window();
    }

    /// The cache reads positions from the order `preload` stores, so it runs
    /// before `evict`.
    fn advance_window(&mut self) {
        let cursor = self.stack.cursor();
        self.cache.preload(self.stack.order(), cursor);
        self.cache.evict(cursor, self.stack.pending_exits());
        self.prune_listing();
    }

    fn prune_listing(&mut self) {
        let stack = &self.stack;
        let order = stack.order();
        self.listing
            .retain(|id, _| order.contains(id) || stack.pending_exits().contains(id));
    }

    /// Deck ids plus swipes not yet confirmed by the store.
    fn unsettled_ids(&mut self) -> HashSet<String> {
        self.persistence.retain(|(_, t)| !t.is_finished());
        let mut ids: HashSet<String> = self.stack.order().iter().cloned().collect();
        ids.extend(self.stack.pending_exits().iter().cloned());
        ids.extend(self.persistence.iter().map(|(id, _)| id.clone()));
        ids
    }

    fn is_swiped(&self, id: &str) -> bool {
        let swiped = &self.stack.order()[..self.stack.cursor()];
        swiped.iter().any(|o| o == id)
            || self.stack.pending_exits().contains(id)
            || self.persistence.iter().any(|(p, _)| p == id)
    }
}

async fn persist_swipe(
    swipes: Arc<SwipeService>,
    matches: Arc<MatchService>,
    events: mpsc::UnboundedSender<DeckEvent>,
    user_id: String,
    direction: SwipeDirection,
    other_profile: CandidateProfile,
) {
    let target_id = other_profile.id.clone();
    let result = match swipes.record_swipe(&user_id, &target_id, direction).await {
        Ok(result) => result,
        Err(e) => {
            warn!(user_id = %user_id, target_id = %target_id, "swipe not persisted: {}", e);
            return;
        }
    };
    if result.like.is_none() {
        return;
    }

    if let MatchCheck::Matched { record, .. } = matches.check_for_match(&user_id, &target_id).await
    {
        let _ = events.send(DeckEvent::MatchFound {
            match_id: record.match_id,
            other_profile,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::gesture::GestureConfig;
    use crate::services::match_service::MatchConfig;
    use crate::testing::{profiles, MemoryStore, RecordingNotifier};
    use std::sync::atomic::Ordering;

    struct Harness {
        session: SwipeSession,
        events: mpsc::UnboundedReceiver<DeckEvent>,
        store: Arc<MemoryStore>,
    }

    fn harness(ids: &[&str]) -> Harness {
        let store = Arc::new(MemoryStore::with_profiles(profiles(ids)));
        let notifier = Arc::new(RecordingNotifier::default());
        let services = DeckServices {
            profiles: store.clone(),
            photos: store.clone(),
            swipes: Arc::new(SwipeService::new(store.clone(), notifier.clone())),
            matches: Arc::new(MatchService::new(
                store.clone(),
                notifier,
                MatchConfig::immediate(),
            )),
        };
        let config = DeckConfig {
            gesture: GestureConfig::default().with_viewport_width(400.0),
            ..DeckConfig::default()
        };
        let (session, events) = SwipeSession::new("u", services, config, 5);
        Harness {
            session,
            events,
            store,
        }
    }

    fn drain(events: &mut mpsc::UnboundedReceiver<DeckEvent>) -> Vec<DeckEvent> {
        let mut out = Vec::new();
        while let Ok(event) = events.try_recv() {
            out.push(event);
        }
        out
    }

    #[tokio::test]
    async fn right_swipe_past_threshold_persists_and_matches() {
        let mut h = harness(&["p1", "p2", "p3"]);
        h.store.insert_like("p1", "u");
        h.session.load_more().await.unwrap();

        assert!(h.session.begin_drag());
        h.session.drag(60.0);
        h.session.drag(130.0);
        let outcome = h.session.release();
        h.session.settle().await;

        assert!(matches!(outcome, ReleaseOutcome::Committed(ref c) if c.profile_id == "p1"));
        assert_eq!(MemoryStore::calls(&h.store.record_swipe_calls), 1);
        assert_eq!(MemoryStore::calls(&h.store.create_like_calls), 1);

        let events = drain(&mut h.events);
        assert_eq!(
            events[0],
            DeckEvent::SwipeCommitted {
                direction: SwipeDirection::Right,
                profile_id: "p1".into()
            }
        );
        let DeckEvent::MatchFound {
            match_id,
            other_profile,
        } = &events[1]
        else {
            panic!("expected a match event, got {:?}", events);
        };
        assert!(!match_id.is_empty());
        assert_eq!(other_profile.id, "p1");

        let stored = h.store.matches();
        assert_eq!(stored.len(), 1);
        assert_eq!((stored[0].user1_id.as_str(), stored[0].user2_id.as_str()), ("p1", "u"));
    }

    #[tokio::test]
    async fn short_drag_snaps_back_without_persistence() {
        let mut h = harness(&["p1", "p2"]);
        h.session.load_more().await.unwrap();

        h.session.begin_drag();
        h.session.drag(40.0);
        assert_eq!(h.session.release(), ReleaseOutcome::SnappedBack);
        h.session.tick(Duration::from_millis(500));
        h.session.settle().await;

        let front = h.session.stack().state_of("p1").unwrap();
        assert_eq!(front.position_x, 0.0);
        assert_eq!(front.rotation, 0.0);
        assert_eq!(MemoryStore::calls(&h.store.record_swipe_calls), 0);
        assert!(drain(&mut h.events).is_empty());
    }

    #[tokio::test]
    async fn buttons_behave_like_gestures() {
        let mut h = harness(&["p1", "p2", "p3"]);
        h.session.load_more().await.unwrap();

        let liked = h.session.like().unwrap();
        let passed = h.session.pass().unwrap();
        h.session.settle().await;

        assert_eq!(liked.profile_id, "p1");
        assert_eq!(passed.profile_id, "p2");
        assert!(h.session.stack().pending_exits().contains("p1"));
        assert!(h.session.stack().pending_exits().contains("p2"));
        assert_eq!(h.session.stack().front_id(), Some("p3"));
        assert_eq!(MemoryStore::calls(&h.store.record_swipe_calls), 2);
        assert_eq!(MemoryStore::calls(&h.store.create_like_calls), 1);
        assert_eq!(drain(&mut h.events).len(), 2);
        assert!(h.session.needs_more());
    }

    #[tokio::test]
    async fn persistence_failure_does_not_touch_local_state() {
        let mut h = harness(&["p1", "p2"]);
        h.session.load_more().await.unwrap();
        h.store.fail_swipes.store(true, Ordering::SeqCst);

        h.session.like().unwrap();
        h.session.settle().await;

        assert_eq!(h.session.stack().front_id(), Some("p2"));
        assert_eq!(MemoryStore::calls(&h.store.create_like_calls), 0);
    }

    #[tokio::test]
    async fn single_front_card_through_rapid_swipes() {
        let mut h = harness(&["p1", "p2", "p3", "p4", "p5", "p6"]);
        h.session.load_more().await.unwrap();

        for _ in 0..4 {
            h.session.like();
            h.session.tick(Duration::from_millis(30));
            let fronts = h
                .session
                .snapshot()
                .iter()
                .filter(|c| c.state.stack_depth == 0)
                .count();
            assert_eq!(fronts, 1);
        }
        h.session.settle().await;
    }

    #[tokio::test]
    async fn preload_follows_the_cursor_and_keeps_exiting_cards() {
        let ids: Vec<String> = (0..10).map(|i| format!("p{i}")).collect();
        let refs: Vec<&str> = ids.iter().map(|s| s.as_str()).collect();
        let mut h = harness(&refs);
        for id in &ids {
            h.store.set_photos(id, vec![format!("{id}.jpg")]);
        }
        h.session.load_more().await.unwrap();
        h.session.settle().await;
        assert!(!h.session.needs_more());
        assert_eq!(h.session.cache().cached_ids(), vec!["p0", "p1", "p2", "p3", "p4"]);

        h.session.pass();
        h.session.pass();
        h.session.settle().await;

        let cached = h.session.cache().cached_ids();
        assert!(cached.contains(&"p0".to_string()), "exiting card evicted early");
        assert!(cached.contains(&"p6".to_string()));
        assert_eq!(h.session.front_card().unwrap().photos, vec!["p2.jpg"]);

        h.session.tick(Duration::from_secs(1));
        assert!(!h.session.cache().contains("p0"));
    }

    #[tokio::test]
    async fn long_sessions_keep_bookkeeping_bounded() {
        let ids: Vec<String> = (0..40).map(|i| format!("p{i}")).collect();
        let refs: Vec<&str> = ids.iter().map(|s| s.as_str()).collect();
        let mut h = harness(&refs);
        assert_eq!(h.session.load_more().await.unwrap(), 40);

        for _ in 0..30 {
            h.session.pass().unwrap();
            h.session.tick(Duration::from_secs(1));
        }
        h.session.settle().await;

        assert_eq!(h.session.stack().front_id(), Some("p30"));
        assert_eq!(h.session.stack().order().len(), 11);
        assert_eq!(h.session.listing_len(), 11);
        assert!(h.session.cache().len() <= 7);
        assert_eq!(h.session.load_more().await.unwrap(), 0);
        assert_eq!(h.session.stack().remaining(), 10);
    }

    #[tokio::test]
    async fn unsaved_swipe_is_not_dealt_again() {
        let mut h = harness(&["p1", "p2"]);
        h.session.load_more().await.unwrap();
        h.session.pass().unwrap();
        h.session.pass().unwrap();
        h.session.tick(Duration::from_secs(1));
        assert!(!h.session.stack().order().contains(&"p1".to_string()));

        assert_eq!(h.session.load_more().await.unwrap(), 0);
        assert_eq!(h.session.stack().remaining(), 0);
        h.session.settle().await;
        assert_eq!(h.store.swipes().len(), 2);
    }

    #[tokio::test]
    async fn clear_resets_the_session() {
        let mut h = harness(&["p1", "p2"]);
        h.session.load_more().await.unwrap();
        h.session.clear();

        assert!(h.session.snapshot().is_empty());
        assert!(h.session.front_card().is_none());
        assert_eq!(h.session.release(), ReleaseOutcome::Ignored);
    }
}
