use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationRequest {
    pub user_id: String,
    pub title: String,
    pub body: String,
    pub payload: Value,
}
