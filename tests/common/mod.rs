#![allow(dead_code)]

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use swipedeck::database::{likes_repo, profiles_repo, schema};

pub async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    schema::migrate(&pool).await.unwrap();
    pool
}

/// Profiles are created in argument order so candidate order follows it.
pub async fn seed_profiles(pool: &SqlitePool, ids: &[&str]) {
    for (i, id) in ids.iter().enumerate() {
        let created_at = format!("2025-01-01T00:00:{:02}Z", i);
        let main_photo = format!("https://img.example/{id}/0.jpg");
        profiles_repo::upsert_profile(
            pool,
            profiles_repo::NewProfile {
                profile_id: id,
                name: id,
                age: Some(25),
                city: Some("Utrecht"),
                bio: None,
                main_photo_url: Some(&main_photo),
                created_at: &created_at,
            },
        )
        .await
        .unwrap();
        for position in 0..2 {
            let url = format!("https://img.example/{id}/{position}.jpg");
            profiles_repo::upsert_photo(pool, id, position, &url)
                .await
                .unwrap();
        }
    }
}

pub async fn seed_like(pool: &SqlitePool, liker_id: &str, liked_id: &str) {
    likes_repo::insert_like(pool, liker_id, liked_id, &schema::now_timestamp())
        .await
        .unwrap();
}
