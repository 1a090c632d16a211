use std::str::FromStr;
use std::sync::Arc;

use anyhow::Context;
use dotenvy::dotenv;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing_subscriber::EnvFilter;

use swipedeck::config::{AppConfig, NotifierKind, PhotoSourceKind};
use swipedeck::database::schema;
use swipedeck::services::image_api_service::ImageApiPhotoSource;
use swipedeck::services::notification_service::{LogNotifier, OutboxNotifier};
use swipedeck::services::sqlite_store::SqliteStore;
use swipedeck::services::store::{Notifier, PhotoSource};
use swipedeck::web::{self, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    // 1. Logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env()?;

    // 2. Database
    tracing::info!(database_url = %config.database_url, "connecting to database");
    let options = SqliteConnectOptions::from_str(&config.database_url)
        .context("invalid DATABASE_URL")?
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .connect_with(options)
        .await
        .context("cannot connect to database")?;
    schema::migrate(&pool).await?;

    // 3. Services
    let photos: Arc<dyn PhotoSource> = match config.photo_source {
        PhotoSourceKind::Database => Arc::new(SqliteStore::new(pool.clone())),
        PhotoSourceKind::ImageApi => {
            let mut source = ImageApiPhotoSource::new(config.image_api_url.clone());
            if let Some(host) = &config.image_api_host {
                source = source.with_host_header(host.clone());
            }
            Arc::new(source)
        }
    };
    let notifier: Arc<dyn Notifier> = match config.notifier {
        NotifierKind::Outbox => Arc::new(OutboxNotifier::new(pool.clone())),
        NotifierKind::Log => Arc::new(LogNotifier),
    };
    let state = AppState::new(pool, photos, notifier, config.matching.clone());
    let app = web::router(state);

    // 4. Serve, one port up if the configured one is taken
    let addr = config.socket_addr()?;
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            let fallback = config.fallback_addr()?;
            tracing::warn!("cannot bind {}: {}. Trying fallback {}", addr, e, fallback);
            tokio::net::TcpListener::bind(fallback)
                .await
                .with_context(|| format!("cannot bind fallback {}", fallback))?
        }
    };

    tracing::info!("swipedeck listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
