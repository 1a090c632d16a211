use std::env;
use std::str::FromStr;

use anyhow::Context;
use dotenvy::dotenv;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use swipedeck::database::{current_user_repo, profiles_repo, schema};

const NAMES: &[&str] = &[
    "Anouk", "Bram", "Chloe", "Daan", "Eva", "Finn", "Gijs", "Hanna", "Isa", "Jesse", "Lotte",
    "Milan", "Noor", "Olivier", "Puck", "Ruben", "Sanne", "Thijs", "Yara", "Zoë",
];
const CITIES: &[&str] = &["Amsterdam", "Utrecht", "Rotterdam", "Den Haag", "Eindhoven"];
const PHOTOS_PER_PROFILE: i64 = 3;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let db_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let options = SqliteConnectOptions::from_str(&db_url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .connect_with(options)
        .await
        .context("cannot connect to database")?;
    schema::migrate(&pool).await?;

    let count: usize = env::var("SEED_COUNT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(NAMES.len());
    let current_user = env::var("SEED_CURRENT_USER").unwrap_or_else(|_| "me".to_string());

    let mut seeded = 0;
    for i in 0..count {
        let profile_id = format!("seed-{:03}", i + 1);
        let name = NAMES[i % NAMES.len()];
        let city = CITIES[i % CITIES.len()];
        let bio = format!("{} from {}", name, city);
        let main_photo = photo_url(&profile_id, 0);
        let created_at = schema::now_timestamp();

        profiles_repo::upsert_profile(
            &pool,
            profiles_repo::NewProfile {
                profile_id: &profile_id,
                name,
                age: Some(21 + (i as i64 * 3) % 17),
                city: Some(city),
                bio: Some(&bio),
                main_photo_url: Some(&main_photo),
                created_at: &created_at,
            },
        )
        .await
        .with_context(|| format!("seeding {}", profile_id))?;

        for position in 0..PHOTOS_PER_PROFILE {
            profiles_repo::upsert_photo(&pool, &profile_id, position, &photo_url(&profile_id, position))
                .await?;
        }
        seeded += 1;
    }

    current_user_repo::set_current_user_id(&pool, &current_user).await?;
    println!(
        "seeded {} candidates with {} photos each; current user is {}",
        seeded, PHOTOS_PER_PROFILE, current_user
    );
    Ok(())
}

fn photo_url(profile_id: &str, position: i64) -> String {
    format!(
        "https://picsum.photos/seed/{}-{}/600/800",
        profile_id, position
    )
}
