//! The single local identity used when no `access_token` cookie is present.

use sqlx::SqlitePool;

use crate::models::CurrentUserRow;

const SQL_CURRENT_USER: &str = r#"
SELECT user_id
FROM current_user
WHERE user_id <> ''
LIMIT 1
"#;

const SQL_CLEAR_CURRENT_USER: &str = "DELETE FROM current_user";

const SQL_INSERT_CURRENT_USER: &str = "INSERT INTO current_user (user_id) VALUES (?1)";

pub async fn load_current_user_id(pool: &SqlitePool) -> sqlx::Result<Option<String>> {
    let row: Option<CurrentUserRow> = sqlx::query_as(SQL_CURRENT_USER)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|r| r.user_id))
}

/// Replaces whatever identity was stored before.
pub async fn set_current_user_id(pool: &SqlitePool, user_id: &str) -> sqlx::Result<()> {
    let mut tx = pool.begin().await?;
    sqlx::query(SQL_CLEAR_CURRENT_USER).execute(&mut *tx).await?;
    sqlx::query(SQL_INSERT_CURRENT_USER)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::schema::test_pool;

    #[tokio::test]
    async fn setting_replaces_the_previous_user() {
        let pool = test_pool().await;
        assert_eq!(load_current_user_id(&pool).await.unwrap(), None);

        set_current_user_id(&pool, "amy").await.unwrap();
        set_current_user_id(&pool, "zed").await.unwrap();

        assert_eq!(load_current_user_id(&pool).await.unwrap().as_deref(), Some("zed"));
        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM current_user")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(rows, 1);
    }
}
