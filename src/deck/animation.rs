//! Per-card transform state and the pure transitions between stack positions.

use std::time::Duration;

use serde::Serialize;

use crate::models::SwipeDirection;

/// Depth given to a card that is flying off screen. Only the front card has
/// depth 0, so an exiting card leaves that slot; draw order comes from
/// `CardTransform::z_order`, not from depth.
pub const EXITING_DEPTH: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CardAnimationState {
    pub position_x: f64,
    pub position_y: f64,
    pub rotation: f64,
    pub scale: f64,
    pub opacity: f64,
    pub stack_depth: i32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StackLayout {
    /// Vertical offset per depth level (k1).
    pub depth_offset_y: f64,
    /// Scale lost per depth level (k2).
    pub depth_scale_step: f64,
    /// Opacity for cards at depth 2 and beyond.
    pub back_opacity: f64,
}

impl Default for StackLayout {
    fn default() -> Self {
        Self {
            depth_offset_y: 10.0,
            depth_scale_step: 0.05,
            back_opacity: 0.85,
        }
    }
}

impl CardAnimationState {
    pub fn front() -> Self {
        Self {
            position_x: 0.0,
            position_y: 0.0,
            rotation: 0.0,
            scale: 1.0,
            opacity: 1.0,
            stack_depth: 0,
        }
    }

    /// Resting transform for a card `depth` levels behind the front.
    pub fn stacked(depth: i32, layout: &StackLayout) -> Self {
        if depth <= 0 {
            return Self::front();
        }
        let d = depth as f64;
        Self {
            position_x: 0.0,
            position_y: d * layout.depth_offset_y,
            rotation: 0.0,
            scale: (1.0 - d * layout.depth_scale_step).max(0.0),
            opacity: if depth >= 2 { layout.back_opacity } else { 1.0 },
            stack_depth: depth,
        }
    }

    pub fn dragged(mut self, dx: f64, rotation: f64) -> Self {
        self.position_x = dx;
        self.rotation = rotation;
        self
    }
}

/// Start and end of a move. The start is applied immediately; the renderer
/// tweens towards `to`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub from: CardAnimationState,
    pub to: CardAnimationState,
}

/// Stacked card becomes the front card. Horizontal offset and rotation are
/// zeroed before the move starts so no drag residue rebounds into view.
pub fn promote_to_front(current: CardAnimationState) -> Transition {
    let from = CardAnimationState {
        position_x: 0.0,
        rotation: 0.0,
        stack_depth: 0,
        ..current
    };
    Transition {
        from,
        to: CardAnimationState::front(),
    }
}

/// Moves a stacked card to `depth` levels behind the front.
pub fn shift_depth(current: CardAnimationState, depth: i32, layout: &StackLayout) -> Transition {
    let to = CardAnimationState::stacked(depth, layout);
    Transition {
        from: CardAnimationState {
            stack_depth: to.stack_depth,
            ..current
        },
        to,
    }
}

/// Front card leaves towards `direction`, fading out on the way.
pub fn begin_exit(
    current: CardAnimationState,
    direction: SwipeDirection,
    exit_distance: f64,
    max_rotation: f64,
) -> Transition {
    let from = CardAnimationState {
        stack_depth: EXITING_DEPTH,
        ..current
    };
    let to = CardAnimationState {
        position_x: direction.sign() * exit_distance,
        rotation: direction.sign() * max_rotation,
        opacity: 0.0,
        ..from
    };
    Transition { from, to }
}

/// Back to rest after an indecisive drag.
pub fn snap_back(current: CardAnimationState) -> Transition {
    Transition {
        from: current,
        to: CardAnimationState::front(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Easing {
    Linear,
    EaseOutCubic,
}

impl Easing {
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseOutCubic => 1.0 - (1.0 - t).powi(3),
        }
    }
}

/// A running move on one card. Replaced wholesale when a new move starts on
/// the same card, so two moves never fight over a field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween {
    pub transition: Transition,
    pub duration: Duration,
    pub elapsed: Duration,
    pub easing: Easing,
}

impl Tween {
    pub fn new(transition: Transition, duration: Duration, easing: Easing) -> Self {
        Self {
            transition,
            duration,
            elapsed: Duration::ZERO,
            easing,
        }
    }

    pub fn advance(&mut self, dt: Duration) -> CardAnimationState {
        self.elapsed = (self.elapsed + dt).min(self.duration);
        self.current()
    }

    pub fn current(&self) -> CardAnimationState {
        let progress = if self.duration.is_zero() {
            1.0
        } else {
            self.elapsed.as_secs_f64() / self.duration.as_secs_f64()
        };
        let t = self.easing.apply(progress);
        let Transition { from, to } = self.transition;
        CardAnimationState {
            position_x: lerp(from.position_x, to.position_x, t),
            position_y: lerp(from.position_y, to.position_y, t),
            rotation: lerp(from.rotation, to.rotation, t),
            scale: lerp(from.scale, to.scale, t),
            opacity: lerp(from.opacity, to.opacity, t),
            stack_depth: to.stack_depth,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    if t >= 1.0 {
        b
    } else {
        a + (b - a) * t
    }
}
