use serde::Serialize;

/// A mutual like. `user1_id < user2_id` always holds so the unordered pair maps
/// to exactly one row.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct MatchRecord {
    pub match_id: String,
    pub user1_id: String,
    pub user2_id: String,
    pub matched_at: String,
}

impl MatchRecord {
    pub fn other_user<'a>(&'a self, user_id: &str) -> &'a str {
        if self.user1_id == user_id {
            &self.user2_id
        } else {
            &self.user1_id
        }
    }
}

/// Orders an unordered pair so the smaller id comes first.
pub fn canonical_pair<'a>(a: &'a str, b: &'a str) -> (&'a str, &'a str) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}
