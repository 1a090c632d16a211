pub mod image_api_service;
pub mod match_service;
pub mod notification_service;
pub mod sqlite_store;
pub mod store;
pub mod swipe_service;
