use sqlx::{sqlite::SqliteArguments, Arguments, SqlitePool};

use crate::models::{ProfilePhotoRow, ProfileRow};

pub const SQL_CANDIDATES_BASE: &str = r#"
SELECT
    p.profile_id, p.name, p.age, p.city, p.bio, p.main_photo_url
FROM profiles p
WHERE p.profile_id != ?
    AND NOT EXISTS (
        SELECT 1 FROM swipes s
        WHERE s.swiper_id = ? AND s.target_id = p.profile_id
    )
"#;

pub const SQL_LOAD_PROFILE: &str = r#"
SELECT
    profile_id, name, age, city, bio, main_photo_url
FROM profiles
WHERE profile_id = ?1
LIMIT 1
"#;

pub const SQL_LOAD_PHOTOS: &str = r#"
SELECT profile_id, position, url
FROM profile_photos
WHERE profile_id = ?1
  AND url != ''
ORDER BY position ASC
"#;

const SQL_UPSERT_PROFILE: &str = r#"
INSERT INTO profiles (profile_id, name, age, city, bio, main_photo_url, created_at)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
ON CONFLICT(profile_id) DO UPDATE SET
    name = excluded.name,
    age = excluded.age,
    city = excluded.city,
    bio = excluded.bio,
    main_photo_url = excluded.main_photo_url
"#;

const SQL_UPSERT_PHOTO: &str = r#"
INSERT INTO profile_photos (profile_id, position, url)
VALUES (?1, ?2, ?3)
ON CONFLICT(profile_id, position) DO UPDATE SET url = excluded.url
"#;

/// Profiles the user has not swiped yet, minus `exclude_ids`.
pub async fn load_candidates(
    pool: &SqlitePool,
    user_id: &str,
    exclude_ids: &[String],
    limit: i64,
) -> sqlx::Result<Vec<ProfileRow>> {
    let mut sql = String::from(SQL_CANDIDATES_BASE);
    let mut args = SqliteArguments::default();
    args.add(user_id.to_string()).map_err(sqlx::Error::Encode)?; // self
    args.add(user_id.to_string()).map_err(sqlx::Error::Encode)?; // swipes join

    let exclude: Vec<&String> = exclude_ids
        .iter()
        .filter(|id| !id.trim().is_empty())
        .collect();
    if !exclude.is_empty() {
        let placeholders = vec!["?"; exclude.len()].join(", ");
        sql.push_str(&format!(" AND p.profile_id NOT IN ({})", placeholders));
        for id in exclude {
            args.add(id.clone()).map_err(sqlx::Error::Encode)?;
        }
    }

    sql.push_str(" ORDER BY p.created_at ASC, p.profile_id ASC LIMIT ?");
    args.add(limit.clamp(1, 500)).map_err(sqlx::Error::Encode)?;

    sqlx::query_as_with::<_, ProfileRow, _>(&sql, args)
        .fetch_all(pool)
        .await
}

pub async fn load_profile(pool: &SqlitePool, profile_id: &str) -> sqlx::Result<Option<ProfileRow>> {
    sqlx::query_as::<_, ProfileRow>(SQL_LOAD_PROFILE)
        .bind(profile_id)
        .fetch_optional(pool)
        .await
}

pub async fn load_photo_urls(pool: &SqlitePool, profile_id: &str) -> sqlx::Result<Vec<String>> {
    let rows = sqlx::query_as::<_, ProfilePhotoRow>(SQL_LOAD_PHOTOS)
        .bind(profile_id)
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(|r| r.url).collect())
}

pub struct NewProfile<'a> {
    pub profile_id: &'a str,
    pub name: &'a str,
    pub age: Option<i64>,
    pub city: Option<&'a str>,
    pub bio: Option<&'a str>,
    pub main_photo_url: Option<&'a str>,
    pub created_at: &'a str,
}

pub async fn upsert_profile(pool: &SqlitePool, profile: NewProfile<'_>) -> sqlx::Result<()> {
    sqlx::query(SQL_UPSERT_PROFILE)
        .bind(profile.profile_id)
        .bind(profile.name)
        .bind(profile.age)
        .bind(profile.city)
        .bind(profile.bio)
        .bind(profile.main_photo_url)
        .bind(profile.created_at)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn upsert_photo(
    pool: &SqlitePool,
    profile_id: &str,
    position: i64,
    url: &str,
) -> sqlx::Result<()> {
    sqlx::query(SQL_UPSERT_PHOTO)
        .bind(profile_id)
        .bind(position)
        .bind(url)
        .execute(pool)
        .await?;
    Ok(())
}
