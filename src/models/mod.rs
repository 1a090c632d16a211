pub mod current_user;
pub mod like;
pub mod matches;
pub mod notification;
pub mod photo;
pub mod profile;
pub mod swipe;

pub use current_user::CurrentUserRow;
pub use like::LikeRecord;
pub use matches::{canonical_pair, MatchRecord};
pub use notification::NotificationRequest;
pub use photo::ProfilePhotoRow;
pub use profile::{CandidateProfile, ProfileRow};
pub use swipe::{SwipeDirection, SwipeRecord};
