use sqlx::SqlitePool;

use crate::models::MatchRecord;

const SQL_LOAD_MATCH: &str = r#"
SELECT match_id, user1_id, user2_id, matched_at
FROM matches
WHERE user1_id = ?1 AND user2_id = ?2
LIMIT 1
"#;

const SQL_INSERT_MATCH: &str = r#"
INSERT INTO matches (match_id, user1_id, user2_id, matched_at)
VALUES (?1, ?2, ?3, ?4)
"#;

const SQL_LIST_MATCHES_FOR_USER: &str = r#"
SELECT match_id, user1_id, user2_id, matched_at
FROM matches
WHERE user1_id = ?1 OR user2_id = ?1
ORDER BY matched_at DESC
LIMIT ?2
"#;

// Callers pass the pair already in canonical order.
pub async fn load_match(
    pool: &SqlitePool,
    user1_id: &str,
    user2_id: &str,
) -> sqlx::Result<Option<MatchRecord>> {
    sqlx::query_as::<_, MatchRecord>(SQL_LOAD_MATCH)
        .bind(user1_id)
        .bind(user2_id)
        .fetch_optional(pool)
        .await
}

pub async fn insert_match(pool: &SqlitePool, record: &MatchRecord) -> sqlx::Result<()> {
    sqlx::query(SQL_INSERT_MATCH)
        .bind(&record.match_id)
        .bind(&record.user1_id)
        .bind(&record.user2_id)
        .bind(&record.matched_at)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn list_matches_for_user(
    pool: &SqlitePool,
    user_id: &str,
    limit: i64,
) -> sqlx::Result<Vec<MatchRecord>> {
    sqlx::query_as::<_, MatchRecord>(SQL_LIST_MATCHES_FOR_USER)
        .bind(user_id)
        .bind(limit.clamp(1, 200))
        .fetch_all(pool)
        .await
}
