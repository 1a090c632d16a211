//! The visible window of cards and their per-card lifecycle:
//! `OFFSTAGE -> STACKED(depth) -> FRONT -> EXITING -> REMOVED`.
//!
//! A card that is exiting has already left the window (the cursor moved past
//! it) but stays in `pending_exits` until its exit tween completes, so window
//! bookkeeping never cuts an exit animation short.
//!
//! Swiped ids are dropped from the front of the list as the cursor moves, so
//! only the last swiped id and the cards still to come are kept.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use crate::deck::animation::{
    begin_exit, promote_to_front, shift_depth, snap_back, CardAnimationState, Easing,
    StackLayout, Tween,
};
use crate::deck::gesture::{GestureConfig, SwipeDecision};
use crate::models::SwipeDirection;

#[derive(Debug, Clone, PartialEq)]
pub struct DeckConfig {
    pub visible_cards: usize,
    pub gesture: GestureConfig,
    pub layout: StackLayout,
    /// Exit target as a multiple of the viewport width.
    pub exit_distance_factor: f64,
    pub exit_duration: Duration,
    pub promote_duration: Duration,
    pub shift_duration: Duration,
    pub snap_back_duration: Duration,
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            visible_cards: 3,
            gesture: GestureConfig::default(),
            layout: StackLayout::default(),
            exit_distance_factor: 1.5,
            exit_duration: Duration::from_millis(250),
            promote_duration: Duration::from_millis(300),
            shift_duration: Duration::from_millis(300),
            snap_back_duration: Duration::from_millis(200),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CardPhase {
    Stacked,
    Front,
    Exiting(SwipeDirection),
}

#[derive(Debug, Clone)]
struct CardEntry {
    phase: CardPhase,
    state: CardAnimationState,
    tween: Option<Tween>,
}

impl CardEntry {
    fn start(&mut self, tween: Tween) {
        self.state = tween.transition.from;
        self.tween = Some(tween);
    }
}

/// Read-only view of one card for the renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardTransform {
    pub profile_id: String,
    pub phase: CardPhase,
    pub interactive: bool,
    pub state: CardAnimationState,
    /// Paint order, 0 drawn first. Exiting cards are painted above the stack.
    pub z_order: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwipeCommit {
    pub profile_id: String,
    pub direction: SwipeDirection,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseOutcome {
    Committed(SwipeCommit),
    SnappedBack,
    /// No interactive card to act on.
    Ignored,
}

pub struct CardStack {
    config: DeckConfig,
    order: Vec<String>,
    cursor: usize,
    cards: HashMap<String, CardEntry>,
    pending_exits: HashSet<String>,
}

impl CardStack {
    pub fn new(config: DeckConfig) -> Self {
        Self {
            config,
            order: Vec::new(),
            cursor: 0,
            cards: HashMap::new(),
            pending_exits: HashSet::new(),
        }
    }

    pub fn config(&self) -> &DeckConfig {
        &self.config
    }

    /// Appends profile ids to the end of the list. Ids already listed are skipped.
    pub fn push_profiles<I>(&mut self, ids: I) -> usize
    where
        I: IntoIterator<Item = String>,
    {
        let mut added = 0;
        for id in ids {
            if self.order.contains(&id) {
                continue;
            }
            self.order.push(id);
            added += 1;
        }
        self.sync_window();
        added
    }

    pub fn order(&self) -> &[String] {
        &self.order
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn remaining(&self) -> usize {
        self.order.len().saturating_sub(self.cursor)
    }

    pub fn window(&self) -> &[String] {
        let start = self.cursor.min(self.order.len());
        let end = (self.cursor + self.config.visible_cards).min(self.order.len());
        &self.order[start..end]
    }

    pub fn front_id(&self) -> Option<&str> {
        let id = self.order.get(self.cursor)?;
        match self.cards.get(id) {
            Some(entry) if entry.phase == CardPhase::Front => Some(id.as_str()),
            _ => None,
        }
    }

    pub fn pending_exits(&self) -> &HashSet<String> {
        &self.pending_exits
    }

    /// In the window or still animating out.
    pub fn is_present(&self, id: &str) -> bool {
        self.pending_exits.contains(id) || self.window().iter().any(|w| w == id)
    }

    pub fn state_of(&self, id: &str) -> Option<CardAnimationState> {
        self.cards.get(id).map(|e| e.state)
    }

    pub fn phase_of(&self, id: &str) -> Option<CardPhase> {
        self.cards.get(id).map(|e| e.phase)
    }

    /// Live finger tracking on the front card. Stops any running move on it.
    /// Non-finite samples are dropped.
    pub fn drag(&mut self, dx: f64) -> bool {
        if !dx.is_finite() {
            return false;
        }
        let rotation = self.config.gesture.rotation_hint(dx);
        let Some(entry) = self.front_entry_mut() else {
            return false;
        };
        entry.tween = None;
        entry.state = CardAnimationState::front().dragged(dx, rotation);
        true
    }

    pub fn resolve(&mut self, decision: SwipeDecision) -> ReleaseOutcome {
        match decision {
            SwipeDecision::Commit(direction) => match self.commit(direction) {
                Some(commit) => ReleaseOutcome::Committed(commit),
                None => ReleaseOutcome::Ignored,
            },
            SwipeDecision::SnapBack => {
                if self.snap_back() {
                    ReleaseOutcome::SnappedBack
                } else {
                    ReleaseOutcome::Ignored
                }
            }
        }
    }

    pub fn snap_back(&mut self) -> bool {
        let duration = self.config.snap_back_duration;
        let Some(entry) = self.front_entry_mut() else {
            return false;
        };
        let tween = Tween::new(snap_back(entry.state), duration, Easing::EaseOutCubic);
        entry.start(tween);
        true
    }

    /// Sends the front card off screen and advances the window. Used by both
    /// gesture release and the like/pass buttons. Returns `None` when there is
    /// no front card or it is already leaving.
    pub fn commit(&mut self, direction: SwipeDirection) -> Option<SwipeCommit> {
        let id = self.order.get(self.cursor)?.clone();
        if self.pending_exits.contains(&id) {
            debug!(profile_id = %id, "card already exiting");
            return None;
        }

        let exit_distance = self.config.gesture.viewport_width * self.config.exit_distance_factor;
        let max_rotation = self.config.gesture.max_rotation_deg;
        let duration = self.config.exit_duration;

        let entry = self.cards.get_mut(&id)?;
        if entry.phase != CardPhase::Front {
            return None;
        }
        let transition = begin_exit(entry.state, direction, exit_distance, max_rotation);
        entry.phase = CardPhase::Exiting(direction);
        entry.start(Tween::new(transition, duration, Easing::Linear));

        self.pending_exits.insert(id.clone());
        self.cursor += 1;
        self.compact();
        self.sync_window();

        Some(SwipeCommit {
            profile_id: id,
            direction,
        })
    }

    /// Advances every running move by `dt`. Returns ids whose exit finished;
    /// those are removed along with their state.
    pub fn tick(&mut self, dt: Duration) -> Vec<String> {
        let mut finished_exits = Vec::new();
        for (id, entry) in self.cards.iter_mut() {
            let Some(tween) = entry.tween.as_mut() else {
                continue;
            };
            entry.state = tween.advance(dt);
            if tween.is_finished() {
                entry.tween = None;
                if matches!(entry.phase, CardPhase::Exiting(_)) {
                    finished_exits.push(id.clone());
                }
            }
        }

        for id in &finished_exits {
            self.pending_exits.remove(id);
            self.cards.remove(id);
        }
        finished_exits.sort();
        finished_exits
    }

    /// Cards to draw, back-most first: the stack by falling depth, then any
    /// exiting cards on top.
    pub fn snapshot(&self) -> Vec<CardTransform> {
        let mut out: Vec<CardTransform> = self
            .cards
            .iter()
            .map(|(id, entry)| CardTransform {
                profile_id: id.clone(),
                phase: entry.phase,
                interactive: entry.phase == CardPhase::Front,
                state: entry.state,
                z_order: 0,
            })
            .collect();
        out.sort_by(|a, b| {
            let a_exiting = matches!(a.phase, CardPhase::Exiting(_));
            let b_exiting = matches!(b.phase, CardPhase::Exiting(_));
            a_exiting
                .cmp(&b_exiting)
                .then_with(|| b.state.stack_depth.cmp(&a.state.stack_depth))
                .then_with(|| a.profile_id.cmp(&b.profile_id))
        });
        for (z, card) in out.iter_mut().enumerate() {
            card.z_order = z;
        }
        out
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.cursor = 0;
        self.cards.clear();
        self.pending_exits.clear();
    }

    /// Drops swiped ids except the most recent one.
    fn compact(&mut self) {
        let swiped = self.cursor.saturating_sub(1);
        if swiped > 0 {
            self.order.drain(..swiped);
            self.cursor -= swiped;
        }
    }

    fn front_entry_mut(&mut self) -> Option<&mut CardEntry> {
        let id = self.order.get(self.cursor)?;
        self.cards
            .get_mut(id)
            .filter(|entry| entry.phase == CardPhase::Front)
    }

    /// Brings per-card state in line with the window: lazily creates entries,
    /// promotes the new front, shifts the rest and drops anything that is
    /// neither visible nor exiting.
    fn sync_window(&mut self) {
        let window: Vec<String> = self.window().to_vec();
        let layout = self.config.layout;

        for (offset, id) in window.iter().enumerate() {
            let depth = offset as i32;
            let entry = self.cards.entry(id.clone()).or_insert_with(|| CardEntry {
                phase: if depth == 0 {
                    CardPhase::Front
                } else {
                    CardPhase::Stacked
                },
                state: CardAnimationState::stacked(depth, &layout),
                tween: None,
            });

            match entry.phase {
                CardPhase::Exiting(_) => continue,
                CardPhase::Stacked if depth == 0 => {
                    entry.phase = CardPhase::Front;
                    let tween = Tween::new(
                        promote_to_front(entry.state),
                        self.config.promote_duration,
                        Easing::EaseOutCubic,
                    );
                    entry.start(tween);
                }
                CardPhase::Stacked => {
                    let target_depth = entry
                        .tween
                        .map(|t| t.transition.to.stack_depth)
                        .unwrap_or(entry.state.stack_depth);
                    if target_depth != depth {
                        let tween = Tween::new(
                            shift_depth(entry.state, depth, &layout),
                            self.config.shift_duration,
                            Easing::EaseOutCubic,
                        );
                        entry.start(tween);
                    }
                }
                CardPhase::Front => {}
            }
        }

        let pending = &self.pending_exits;
        self.cards
            .retain(|id, _| pending.contains(id) || window.contains(id));
    }
}
