pub mod current_user_repo;
pub mod likes_repo;
pub mod matches_repo;
pub mod notifications_repo;
pub mod profiles_repo;
pub mod schema;
pub mod swipes_repo;
