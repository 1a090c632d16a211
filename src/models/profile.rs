use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProfileRow {
    pub profile_id: String,
    pub name: String,
    pub age: Option<i64>,
    pub city: Option<String>,
    pub bio: Option<String>,
    pub main_photo_url: Option<String>,
}

/// A swipeable profile as handed to the deck. `photos` may arrive empty and be
/// filled in later by the preloader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub id: String,
    pub name: String,
    pub age: Option<i64>,
    pub city: Option<String>,
    pub bio: Option<String>,
    #[serde(default)]
    pub photos: Vec<String>,
}

impl CandidateProfile {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            age: None,
            city: None,
            bio: None,
            photos: Vec::new(),
        }
    }

    pub fn with_photos(mut self, photos: Vec<String>) -> Self {
        self.photos = photos;
        self
    }
}

impl From<ProfileRow> for CandidateProfile {
    fn from(row: ProfileRow) -> Self {
        let photos = row
            .main_photo_url
            .filter(|url| !url.trim().is_empty())
            .into_iter()
            .collect();
        Self {
            id: row.profile_id,
            name: row.name,
            age: row.age,
            city: row.city,
            bio: row.bio,
            photos,
        }
    }
}
