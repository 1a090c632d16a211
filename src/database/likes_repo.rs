use sqlx::SqlitePool;

use crate::models::LikeRecord;

const SQL_HAS_LIKED: &str = r#"
SELECT EXISTS (
    SELECT 1 FROM likes WHERE liker_id = ?1 AND liked_id = ?2
)
"#;

const SQL_INSERT_LIKE: &str = r#"
INSERT INTO likes (liker_id, liked_id, created_at)
VALUES (?1, ?2, ?3)
"#;

const SQL_LOAD_LIKE: &str = r#"
SELECT liker_id, liked_id, created_at
FROM likes
WHERE liker_id = ?1 AND liked_id = ?2
LIMIT 1
"#;

const SQL_DELETE_LIKE: &str = r#"
DELETE FROM likes
WHERE liker_id = ?1 AND liked_id = ?2
"#;

pub async fn has_liked(pool: &SqlitePool, liker_id: &str, liked_id: &str) -> sqlx::Result<bool> {
    let exists = sqlx::query_scalar::<_, i64>(SQL_HAS_LIKED)
        .bind(liker_id)
        .bind(liked_id)
        .fetch_one(pool)
        .await?;
    Ok(exists != 0)
}

/// Plain insert. A second insert for the same pair fails with a unique violation.
pub async fn insert_like(
    pool: &SqlitePool,
    liker_id: &str,
    liked_id: &str,
    created_at: &str,
) -> sqlx::Result<()> {
    sqlx::query(SQL_INSERT_LIKE)
        .bind(liker_id)
        .bind(liked_id)
        .bind(created_at)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn load_like(
    pool: &SqlitePool,
    liker_id: &str,
    liked_id: &str,
) -> sqlx::Result<Option<LikeRecord>> {
    sqlx::query_as::<_, LikeRecord>(SQL_LOAD_LIKE)
        .bind(liker_id)
        .bind(liked_id)
        .fetch_optional(pool)
        .await
}

pub async fn delete_like(pool: &SqlitePool, liker_id: &str, liked_id: &str) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_DELETE_LIKE)
        .bind(liker_id)
        .bind(liked_id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}
