//! Look-ahead cache of hydrated cards (profile + full photo list).
//!
//! Fetches run as background tasks. When one lands, the cache re-checks that
//! the id is still inside the wanted window before writing, since the cursor
//! may have moved on while the fetch was in flight.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, warn};

use crate::models::CandidateProfile;
use crate::services::store::{PhotoSource, ProfileSource};

pub const DEFAULT_LOOK_AHEAD: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct CachedCard {
    pub profile: CandidateProfile,
    pub photos: Vec<String>,
    /// False for a card built from list data only.
    pub fresh: bool,
}

impl CachedCard {
    pub fn from_listing(profile: &CandidateProfile) -> Self {
        Self {
            profile: profile.clone(),
            photos: profile.photos.clone(),
            fresh: false,
        }
    }
}

/// Reconciles a live profile with what is cached. Live photos win when they
/// are non-empty; a populated list is never replaced by an empty one.
pub fn merge_card(cached: Option<&CachedCard>, live: &CandidateProfile) -> CachedCard {
    let photos = if !live.photos.is_empty() {
        live.photos.clone()
    } else {
        cached.map(|c| c.photos.clone()).unwrap_or_default()
    };
    CachedCard {
        profile: CandidateProfile {
            photos: photos.clone(),
            ..live.clone()
        },
        photos,
        fresh: true,
    }
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<String, CachedCard>,
    in_flight: HashMap<String, AbortHandle>,
    tasks: Vec<JoinHandle<()>>,
    order: Vec<String>,
    current_index: usize,
}

impl CacheState {
    /// Inside `[current_index - 1, current_index + look_ahead]`.
    fn is_wanted(&self, id: &str, look_ahead: usize) -> bool {
        let Some(index) = self.order.iter().position(|o| o == id) else {
            return false;
        };
        index + 1 >= self.current_index && index <= self.current_index + look_ahead
    }

    fn absorb(&mut self, card: CachedCard) {
        let live = CandidateProfile {
            photos: card.photos,
            ..card.profile
        };
        let merged = merge_card(self.entries.get(&live.id), &live);
        self.entries.insert(live.id.clone(), merged);
    }
}

/// Owned by a deck session; `clear` tears it down with the session.
#[derive(Clone)]
pub struct PreloadCache {
    state: Arc<Mutex<CacheState>>,
    profiles: Arc<dyn ProfileSource>,
    photos: Arc<dyn PhotoSource>,
    look_ahead: usize,
}

impl PreloadCache {
    pub fn new(
        profiles: Arc<dyn ProfileSource>,
        photos: Arc<dyn PhotoSource>,
        look_ahead: usize,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(CacheState::default())),
            profiles,
            photos,
            look_ahead: look_ahead.max(1),
        }
    }

    pub fn look_ahead(&self) -> usize {
        self.look_ahead
    }

    /// Starts background hydration for up to `look_ahead` ids beginning at
    /// `window_start`, skipping ids that are cached or already in flight.
    /// Returns the ids a fetch was issued for. Must run inside a tokio runtime.
    pub fn preload(&self, ids: &[String], window_start: usize) -> Vec<String> {
        let mut state = self.state.lock();
        state.order = ids.to_vec();
        state.current_index = window_start;
        state.tasks.retain(|t| !t.is_finished());

        let start = window_start.min(ids.len());
        let end = (window_start + self.look_ahead).min(ids.len());
        let mut issued = Vec::new();

        for id in &ids[start..end] {
            if state.entries.contains_key(id) || state.in_flight.contains_key(id) {
                continue;
            }
            let handle = tokio::spawn(Self::hydrate_into(
                Arc::clone(&self.state),
                Arc::clone(&self.profiles),
                Arc::clone(&self.photos),
                id.clone(),
                self.look_ahead,
            ));
            state.in_flight.insert(id.clone(), handle.abort_handle());
            state.tasks.push(handle);
            issued.push(id.clone());
        }

        if !issued.is_empty() {
            debug!(count = issued.len(), window_start, "preload issued");
        }
        issued
    }

    pub fn get(&self, id: &str) -> Option<CachedCard> {
        self.state.lock().entries.get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.state.lock().entries.contains_key(id)
    }

    pub fn is_in_flight(&self, id: &str) -> bool {
        self.state.lock().in_flight.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn cached_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.state.lock().entries.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Merges a freshly fetched profile into an existing entry and returns the
    /// merged card. Ids that are not cached are not added.
    pub fn merge(&self, live: &CandidateProfile) -> CachedCard {
        let mut state = self.state.lock();
        let merged = merge_card(state.entries.get(&live.id), live);
        if let Some(entry) = state.entries.get_mut(&live.id) {
            *entry = merged.clone();
        }
        merged
    }

    /// Drops entries outside `[current_index - 1, current_index + look_ahead]`,
    /// except ids in `retain` (cards still animating out).
    pub fn evict(&self, current_index: usize, retain: &HashSet<String>) -> Vec<String> {
        let mut state = self.state.lock();
        state.current_index = current_index;

        let look_ahead = self.look_ahead;
        let stale: Vec<String> = state
            .entries
            .keys()
            .filter(|id| !retain.contains(*id) && !state.is_wanted(id, look_ahead))
            .cloned()
            .collect();
        for id in &stale {
            state.entries.remove(id);
        }
        if !stale.is_empty() {
            debug!(count = stale.len(), current_index, "evicted cards");
        }
        stale
    }

    /// Waits for every fetch issued so far.
    pub async fn settle(&self) {
        loop {
            let tasks = std::mem::take(&mut self.state.lock().tasks);
            if tasks.is_empty() {
                return;
            }
            for task in tasks {
                let _ = task.await;
            }
        }
    }

    pub fn clear(&self) {
        let mut state = self.state.lock();
        for (_, handle) in state.in_flight.drain() {
            handle.abort();
        }
        state.tasks.clear();
        state.entries.clear();
        state.order.clear();
        state.current_index = 0;
    }

    async fn hydrate_into(
        state: Arc<Mutex<CacheState>>,
        profiles: Arc<dyn ProfileSource>,
        photos: Arc<dyn PhotoSource>,
        id: String,
        look_ahead: usize,
    ) {
        let card = hydrate(profiles.as_ref(), photos.as_ref(), &id).await;

        let mut state = state.lock();
        state.in_flight.remove(&id);
        let Some(card) = card else {
            return;
        };
        if !state.is_wanted(&id, look_ahead) {
            debug!(profile_id = %id, "discarding preload for id outside window");
            return;
        }
        state.absorb(card);
    }
}

/// Profile failure means no card; photo failure leaves only the photos the
/// profile itself carries.
async fn hydrate(
    profiles: &dyn ProfileSource,
    photos: &dyn PhotoSource,
    id: &str,
) -> Option<CachedCard> {
    let profile = match profiles.fetch_profile(id).await {
        Ok(Some(profile)) => profile,
        Ok(None) => {
            debug!(profile_id = %id, "profile gone before preload");
            return None;
        }
        Err(e) => {
            warn!(profile_id = %id, "profile preload failed: {}", e);
            return None;
        }
    };

    let fetched = match photos.fetch_photos(id).await {
        Ok(urls) => urls,
        Err(e) => {
            warn!(profile_id = %id, "photo preload failed: {}", e);
            Vec::new()
        }
    };
    let photos = if fetched.is_empty() {
        profile.photos.clone()
    } else {
        fetched
    };

    Some(CachedCard {
        profile,
        photos,
        fresh: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{profiles, MemoryStore};
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    fn ids(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("p{i}")).collect()
    }

    fn store_with(n: usize) -> Arc<MemoryStore> {
        let names: Vec<String> = ids(n);
        let refs: Vec<&str> = names.iter().map(|s| s.as_str()).collect();
        let store = MemoryStore::with_profiles(profiles(&refs));
        for id in &names {
            store.set_photos(id, vec![format!("https://img.example/{id}/1.jpg")]);
        }
        Arc::new(store)
    }

    fn cache(store: &Arc<MemoryStore>) -> PreloadCache {
        PreloadCache::new(store.clone(), store.clone(), 5)
    }

    #[test]
    fn merge_prefers_live_photos_and_never_empties() {
        let cached = CachedCard {
            profile: CandidateProfile::new("p1", "Pia"),
            photos: vec![],
            fresh: false,
        };
        let live = CandidateProfile::new("p1", "Pia").with_photos(vec!["a.jpg".into()]);
        let enriched = merge_card(Some(&cached), &live);
        assert_eq!(enriched.photos, vec!["a.jpg"]);

        let bare = CandidateProfile::new("p1", "Pia Renamed");
        let kept = merge_card(Some(&enriched), &bare);
        assert_eq!(kept.photos, vec!["a.jpg"]);
        assert_eq!(kept.profile.name, "Pia Renamed");
        assert_eq!(kept.profile.photos, vec!["a.jpg"]);

        let both = CandidateProfile::new("p1", "Pia").with_photos(vec!["b.jpg".into()]);
        assert_eq!(merge_card(Some(&kept), &both).photos, vec!["b.jpg"]);
    }

    #[tokio::test]
    async fn preload_hydrates_the_look_ahead_window() {
        let store = store_with(10);
        let cache = cache(&store);

        let issued = cache.preload(&ids(10), 2);
        cache.settle().await;

        assert_eq!(issued, vec!["p2", "p3", "p4", "p5", "p6"]);
        assert_eq!(cache.cached_ids(), vec!["p2", "p3", "p4", "p5", "p6"]);
        assert_eq!(
            cache.get("p3").unwrap().photos,
            vec!["https://img.example/p3/1.jpg"]
        );
        assert!(cache.get("p7").is_none());
    }

    #[tokio::test]
    async fn advancing_evicts_behind_and_fetches_ahead() {
        let store = store_with(10);
        let cache = cache(&store);
        cache.preload(&ids(10), 2);
        cache.settle().await;

        let evicted = cache.evict(4, &HashSet::new());
        let issued = cache.preload(&ids(10), 4);
        cache.settle().await;

        assert_eq!(evicted, vec!["p2"]);
        assert!(issued.contains(&"p7".to_string()));
        assert!(!issued.contains(&"p4".to_string()));
        assert!(cache.contains("p3"));
        assert!(cache.contains("p7"));
    }

    #[tokio::test(start_paused = true)]
    async fn in_flight_ids_are_not_fetched_twice() {
        let store = store_with(10);
        store.set_photo_delay(Duration::from_millis(500));
        let cache = cache(&store);

        let first = cache.preload(&ids(10), 3);
        assert!(cache.is_in_flight("p7"));
        let second = cache.preload(&ids(10), 4);
        cache.settle().await;

        assert!(first.contains(&"p7".to_string()));
        assert_eq!(second, vec!["p8"]);
        assert_eq!(MemoryStore::calls(&store.fetch_photos_calls), 6);
        assert!(cache.contains("p7"));
        assert!(!cache.is_in_flight("p7"));
    }

    #[tokio::test]
    async fn eviction_spares_cards_that_are_still_exiting() {
        let store = store_with(10);
        let cache = cache(&store);
        cache.preload(&ids(10), 0);
        cache.settle().await;

        let exiting: HashSet<String> = ["p0".to_string()].into_iter().collect();
        let evicted = cache.evict(3, &exiting);

        assert_eq!(evicted, vec!["p1"]);
        assert!(cache.contains("p0"));
    }

    #[tokio::test(start_paused = true)]
    async fn late_results_for_ids_outside_the_window_are_discarded() {
        let store = store_with(20);
        store.set_photo_delay(Duration::from_millis(500));
        let cache = cache(&store);

        cache.preload(&ids(20), 0);
        cache.evict(12, &HashSet::new());
        cache.settle().await;

        assert!(cache.is_empty());
        assert!(!cache.is_in_flight("p0"));
    }

    #[tokio::test]
    async fn photo_failure_yields_empty_photos() {
        let store = store_with(3);
        store.fail_photos.store(true, Ordering::SeqCst);
        let cache = cache(&store);

        cache.preload(&ids(3), 0);
        cache.settle().await;

        let card = cache.get("p1").unwrap();
        assert!(card.photos.is_empty());
        assert!(card.fresh);
    }

    #[tokio::test]
    async fn profile_failure_leaves_the_id_absent() {
        let store = store_with(3);
        store.fail_profiles.store(true, Ordering::SeqCst);
        let cache = cache(&store);

        cache.preload(&ids(3), 0);
        cache.settle().await;

        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn merge_refreshes_only_cached_entries() {
        let store = store_with(3);
        let cache = cache(&store);
        cache.preload(&ids(3), 0);
        cache.settle().await;

        let refreshed = cache.merge(&CandidateProfile::new("p1", "New Name"));
        assert_eq!(refreshed.photos, vec!["https://img.example/p1/1.jpg"]);
        assert_eq!(cache.get("p1").unwrap().profile.name, "New Name");

        cache.merge(&CandidateProfile::new("stranger", "X"));
        assert!(!cache.contains("stranger"));
    }

    #[tokio::test]
    async fn clear_drops_everything() {
        let store = store_with(3);
        let cache = cache(&store);
        cache.preload(&ids(3), 0);
        cache.settle().await;

        cache.clear();
        assert!(cache.is_empty());
    }
}
