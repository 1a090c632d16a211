use sqlx::SqlitePool;

const SQL_INSERT_NOTIFICATION: &str = r#"
INSERT INTO notifications (
  notification_id,
  user_id,
  title,
  body,
  payload_json,
  created_at
) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
"#;

pub struct NewNotification<'a> {
    pub notification_id: &'a str,
    pub user_id: &'a str,
    pub title: &'a str,
    pub body: &'a str,
    pub payload_json: &'a str,
    pub created_at: &'a str,
}

pub async fn insert_notification(
    pool: &SqlitePool,
    notification: NewNotification<'_>,
) -> sqlx::Result<()> {
    sqlx::query(SQL_INSERT_NOTIFICATION)
        .bind(notification.notification_id)
        .bind(notification.user_id)
        .bind(notification.title)
        .bind(notification.body)
        .bind(notification.payload_json)
        .bind(notification.created_at)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn count_for_user(pool: &SqlitePool, user_id: &str) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM notifications WHERE user_id = ?1")
        .bind(user_id)
        .fetch_one(pool)
        .await
}
