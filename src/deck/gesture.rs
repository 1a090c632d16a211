//! Drag classification: rotation hint, commit decision and the haptic ramp.

use crate::models::SwipeDirection;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureConfig {
    pub viewport_width: f64,
    /// Fraction of the viewport a release must pass to commit.
    pub commit_fraction: f64,
    pub max_rotation_deg: f64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            viewport_width: 390.0,
            commit_fraction: 0.25,
            max_rotation_deg: 30.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeDecision {
    Commit(SwipeDirection),
    SnapBack,
}

impl GestureConfig {
    pub fn with_viewport_width(mut self, viewport_width: f64) -> Self {
        self.viewport_width = viewport_width;
        self
    }

    /// Cosmetic tilt for a horizontal offset, in degrees.
    pub fn rotation_hint(&self, dx: f64) -> f64 {
        if self.viewport_width <= 0.0 || !dx.is_finite() {
            return 0.0;
        }
        let max = self.max_rotation_deg;
        (dx / self.viewport_width * max).clamp(-max, max)
    }

    pub fn commit_threshold(&self) -> f64 {
        self.viewport_width * self.commit_fraction
    }

    pub fn classify_release(&self, dx: f64) -> SwipeDecision {
        let threshold = self.commit_threshold();
        if !dx.is_finite() || threshold <= 0.0 {
            SwipeDecision::SnapBack
        } else if dx > threshold {
            SwipeDecision::Commit(SwipeDirection::Right)
        } else if dx < -threshold {
            SwipeDecision::Commit(SwipeDirection::Left)
        } else {
            SwipeDecision::SnapBack
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HapticIntensity {
    Selection,
    Light,
    Medium,
    Heavy,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HapticStep {
    /// Share of the viewport width at which this tier starts.
    pub fraction: f64,
    pub intensity: HapticIntensity,
    pub pulses: u8,
}

const fn step(fraction: f64, intensity: HapticIntensity, pulses: u8) -> HapticStep {
    HapticStep {
        fraction,
        intensity,
        pulses,
    }
}

pub const HAPTIC_RAMP: &[HapticStep] = &[
    step(0.015, HapticIntensity::Selection, 1),
    step(0.03, HapticIntensity::Selection, 1),
    step(0.05, HapticIntensity::Light, 1),
    step(0.075, HapticIntensity::Light, 1),
    step(0.10, HapticIntensity::Light, 1),
    step(0.13, HapticIntensity::Medium, 1),
    step(0.17, HapticIntensity::Medium, 1),
    step(0.21, HapticIntensity::Medium, 1),
    step(0.26, HapticIntensity::Heavy, 1),
    step(0.32, HapticIntensity::Heavy, 1),
    step(0.40, HapticIntensity::Heavy, 2),
    step(0.50, HapticIntensity::Heavy, 3),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HapticPulse {
    pub tier: usize,
    pub intensity: HapticIntensity,
    pub pulses: u8,
}

/// Highest tier whose threshold `|dx|` has reached, if any.
pub fn haptic_tier(dx: f64, viewport_width: f64) -> Option<usize> {
    if viewport_width <= 0.0 || !dx.is_finite() {
        return None;
    }
    let fraction = dx.abs() / viewport_width;
    HAPTIC_RAMP.iter().rposition(|s| fraction >= s.fraction)
}

/// One drag on the front card, from pointer-down to release. Owns its own
/// haptic tier so nothing leaks between gestures.
#[derive(Debug, Clone)]
pub struct GestureSession {
    config: GestureConfig,
    dx: f64,
    tier: Option<usize>,
}

impl GestureSession {
    pub fn begin(config: GestureConfig) -> Self {
        Self {
            config,
            dx: 0.0,
            tier: None,
        }
    }

    /// Feeds one displacement sample. Returns a pulse only when the tier
    /// changed to another tier; dropping under the lowest threshold resets
    /// silently.
    pub fn update(&mut self, dx: f64) -> Option<HapticPulse> {
        if !dx.is_finite() {
            return None;
        }
        self.dx = dx;

        let tier = haptic_tier(dx, self.config.viewport_width);
        if tier == self.tier {
            return None;
        }
        self.tier = tier;

        tier.map(|index| {
            let step = HAPTIC_RAMP[index];
            HapticPulse {
                tier: index,
                intensity: step.intensity,
                pulses: step.pulses,
            }
        })
    }

    pub fn dx(&self) -> f64 {
        self.dx
    }

    pub fn tier(&self) -> Option<usize> {
        self.tier
    }

    pub fn rotation(&self) -> f64 {
        self.config.rotation_hint(self.dx)
    }

    pub fn finish(self) -> SwipeDecision {
        self.config.classify_release(self.dx)
    }
}
