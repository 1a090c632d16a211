use sqlx::SqlitePool;

use crate::models::SwipeDirection;

const SQL_INSERT_SWIPE: &str = r#"
INSERT INTO swipes (
  swipe_id,
  swiper_id,
  target_id,
  direction,
  created_at
) VALUES (?1, ?2, ?3, ?4, ?5)
"#;

const SQL_COUNT_SWIPES: &str = r#"
SELECT COUNT(*)
FROM swipes
WHERE swiper_id = ?1 AND target_id = ?2
"#;

pub struct NewSwipe<'a> {
    pub swipe_id: &'a str,
    pub swiper_id: &'a str,
    pub target_id: &'a str,
    pub direction: SwipeDirection,
    pub created_at: &'a str,
}

pub async fn insert_swipe(pool: &SqlitePool, swipe: NewSwipe<'_>) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_INSERT_SWIPE)
        .bind(swipe.swipe_id)
        .bind(swipe.swiper_id)
        .bind(swipe.target_id)
        .bind(swipe.direction)
        .bind(swipe.created_at)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

pub async fn count_swipes(pool: &SqlitePool, swiper_id: &str, target_id: &str) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>(SQL_COUNT_SWIPES)
        .bind(swiper_id)
        .bind(target_id)
        .fetch_one(pool)
        .await
}
