#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProfilePhotoRow {
    pub profile_id: String,
    pub position: i64,
    pub url: String,
}
