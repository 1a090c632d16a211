use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
pub enum SwipeDirection {
    Left,
    Right,
}

impl SwipeDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            SwipeDirection::Left => "left",
            SwipeDirection::Right => "right",
        }
    }

    /// +1.0 for right, -1.0 for left. Used to pick the exit side.
    pub fn sign(self) -> f64 {
        match self {
            SwipeDirection::Left => -1.0,
            SwipeDirection::Right => 1.0,
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "left" | "pass" => Some(SwipeDirection::Left),
            "right" | "like" => Some(SwipeDirection::Right),
            _ => None,
        }
    }
}

// Not unique per (swiper, target): a later change of mind is a new row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SwipeRecord {
    pub swipe_id: String,
    pub swiper_id: String,
    pub target_id: String,
    pub direction: SwipeDirection,
    pub created_at: String,
}
