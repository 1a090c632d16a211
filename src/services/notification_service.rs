use async_trait::async_trait;
use serde_json::json;
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::database::notifications_repo;
use crate::database::schema::now_timestamp;
use crate::models::NotificationRequest;
use crate::services::store::{Notifier, StoreResult};

/// Queues notification requests in the `notifications` table for a delivery
/// worker to pick up.
#[derive(Clone)]
pub struct OutboxNotifier {
    pool: SqlitePool,
}

impl OutboxNotifier {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Notifier for OutboxNotifier {
    async fn notify(&self, request: NotificationRequest) -> StoreResult<()> {
        let id = Uuid::new_v4().to_string();
        let payload_json = request.payload.to_string();
        let created_at = now_timestamp();
        notifications_repo::insert_notification(
            &self.pool,
            notifications_repo::NewNotification {
                notification_id: &id,
                user_id: &request.user_id,
                title: &request.title,
                body: &request.body,
                payload_json: &payload_json,
                created_at: &created_at,
            },
        )
        .await?;
        Ok(())
    }
}

/// Only logs. Handy when no delivery worker is running.
#[derive(Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, request: NotificationRequest) -> StoreResult<()> {
        info!(user_id = %request.user_id, title = %request.title, "notification requested");
        Ok(())
    }
}

/// Sends on a background task. Errors are logged and never reach the caller.
pub fn notify_detached(notifier: &Arc<dyn Notifier>, request: NotificationRequest) {
    let notifier = Arc::clone(notifier);
    tokio::spawn(async move {
        let user_id = request.user_id.clone();
        if let Err(e) = notifier.notify(request).await {
            warn!(user_id = %user_id, "notification failed: {}", e);
        }
    });
}

pub fn like_notification(liker_id: &str, liked_id: &str) -> NotificationRequest {
    NotificationRequest {
        user_id: liked_id.to_string(),
        title: "Someone likes you".to_string(),
        body: "Keep swiping to find out who.".to_string(),
        payload: json!({ "type": "like", "liker_id": liker_id }),
    }
}

pub fn match_notification(user_id: &str, other_id: &str, match_id: &str) -> NotificationRequest {
    NotificationRequest {
        user_id: user_id.to_string(),
        title: "It's a match!".to_string(),
        body: "You both liked each other.".to_string(),
        payload: json!({ "type": "match", "match_id": match_id, "other_user_id": other_id }),
    }
}
