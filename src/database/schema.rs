use sqlx::SqlitePool;
use tracing::info;

const SCHEMA: &[&str] = &[
    r#"
CREATE TABLE IF NOT EXISTS profiles (
    profile_id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    age INTEGER,
    city TEXT,
    bio TEXT,
    main_photo_url TEXT,
    created_at TEXT NOT NULL
)
"#,
    r#"
CREATE TABLE IF NOT EXISTS profile_photos (
    profile_id TEXT NOT NULL,
    position INTEGER NOT NULL,
    url TEXT NOT NULL,
    PRIMARY KEY (profile_id, position)
)
"#,
    r#"
CREATE TABLE IF NOT EXISTS swipes (
    swipe_id TEXT PRIMARY KEY,
    swiper_id TEXT NOT NULL,
    target_id TEXT NOT NULL,
    direction TEXT NOT NULL CHECK (direction IN ('left', 'right')),
    created_at TEXT NOT NULL
)
"#,
    // Repeating the same decision collapses; changing it adds a row.
    r#"
CREATE UNIQUE INDEX IF NOT EXISTS idx_swipes_decision
ON swipes(swiper_id, target_id, direction)
"#,
    r#"
CREATE TABLE IF NOT EXISTS likes (
    liker_id TEXT NOT NULL,
    liked_id TEXT NOT NULL,
    created_at TEXT NOT NULL,
    PRIMARY KEY (liker_id, liked_id)
)
"#,
    r#"
CREATE TABLE IF NOT EXISTS matches (
    match_id TEXT NOT NULL UNIQUE,
    user1_id TEXT NOT NULL,
    user2_id TEXT NOT NULL,
    matched_at TEXT NOT NULL,
    PRIMARY KEY (user1_id, user2_id),
    CHECK (user1_id < user2_id)
)
"#,
    r#"
CREATE TABLE IF NOT EXISTS notifications (
    notification_id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    title TEXT NOT NULL,
    body TEXT NOT NULL,
    payload_json TEXT NOT NULL DEFAULT '{}',
    created_at TEXT NOT NULL
)
"#,
    r#"
CREATE TABLE IF NOT EXISTS current_user (
    user_id TEXT NOT NULL
)
"#,
];

/// Creates every table the store needs. Safe to run on each start.
pub async fn migrate(pool: &SqlitePool) -> sqlx::Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    info!("swipedeck schema migration complete");
    Ok(())
}

/// True when `err` is a SQLite primary-key or unique-index violation.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        // 2067 = SQLITE_CONSTRAINT_UNIQUE, 1555 = SQLITE_CONSTRAINT_PRIMARYKEY
        sqlx::Error::Database(db_err) => {
            matches!(db_err.code().as_deref(), Some("2067") | Some("1555"))
        }
        _ => false,
    }
}

pub fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    migrate(&pool).await.unwrap();
    pool
}
