use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct LikeRecord {
    pub liker_id: String,
    pub liked_id: String,
    pub created_at: String,
}
