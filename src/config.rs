//! Runtime configuration read from the environment (and `.env` via dotenvy).

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context};

use crate::deck::preload::DEFAULT_LOOK_AHEAD;
use crate::deck::DeckConfig;
use crate::services::match_service::MatchConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoSourceKind {
    Database,
    ImageApi,
}

impl FromStr for PhotoSourceKind {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "database" | "db" | "sqlite" => Ok(Self::Database),
            "image_api" | "image-api" => Ok(Self::ImageApi),
            other => Err(anyhow!("unknown photo source: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifierKind {
    /// Rows in the `notifications` table.
    Outbox,
    Log,
}

impl FromStr for NotifierKind {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "outbox" => Ok(Self::Outbox),
            "log" => Ok(Self::Log),
            other => Err(anyhow!("unknown notifier: {other}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub matching: MatchConfig,
    pub look_ahead: usize,
    pub deck: DeckConfig,
    pub image_api_url: String,
    pub image_api_host: Option<String>,
    pub photo_source: PhotoSourceKind,
    pub notifier: NotifierKind,
}

impl AppConfig {
    /// Reads the process environment. Only `DATABASE_URL` is required;
    /// anything unparseable falls back to its default.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL must be set")?;
        let defaults = MatchConfig::default();

        let matching = MatchConfig {
            initial_delay: parsed(&lookup, "MATCH_CHECK_DELAY_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.initial_delay),
            retries: parsed(&lookup, "MATCH_CHECK_RETRIES").unwrap_or(defaults.retries),
            retry_interval: parsed(&lookup, "MATCH_CHECK_RETRY_INTERVAL_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry_interval),
        };

        let photo_source = match lookup("PHOTO_SOURCE") {
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                tracing::warn!("{}, using database photos", e);
                PhotoSourceKind::Database
            }),
            None => PhotoSourceKind::Database,
        };

        let notifier = match lookup("NOTIFIER") {
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                tracing::warn!("{}, using the outbox", e);
                NotifierKind::Outbox
            }),
            None => NotifierKind::Outbox,
        };

        let deck_defaults = DeckConfig::default();
        let deck = DeckConfig {
            visible_cards: parsed(&lookup, "DECK_VISIBLE_CARDS")
                .filter(|n: &usize| *n > 0)
                .unwrap_or(deck_defaults.visible_cards),
            gesture: match parsed::<_, f64>(&lookup, "DECK_VIEWPORT_WIDTH") {
                Some(width) if width.is_finite() && width > 0.0 => {
                    deck_defaults.gesture.with_viewport_width(width)
                }
                _ => deck_defaults.gesture,
            },
            ..deck_defaults
        };

        Ok(Self {
            database_url,
            host: lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parsed(&lookup, "PORT").unwrap_or(3000),
            matching,
            look_ahead: parsed(&lookup, "PRELOAD_AHEAD")
                .filter(|n: &usize| *n > 0)
                .unwrap_or(DEFAULT_LOOK_AHEAD),
            deck,
            image_api_url: lookup("IMAGE_API_URL")
                .unwrap_or_else(|| "http://localhost:8004".to_string()),
            image_api_host: lookup("IMAGE_API_HOST").filter(|h| !h.trim().is_empty()),
            photo_source,
            notifier,
        })
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }

    /// Next port up, tried when the configured one is taken.
    pub fn fallback_addr(&self) -> anyhow::Result<SocketAddr> {
        let port = self
            .port
            .checked_add(1)
            .ok_or_else(|| anyhow!("no fallback port above {}", self.port))?;
        format!("{}:{}", self.host, port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, port))
    }
}

fn parsed<F, T>(lookup: &F, key: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    lookup(key).and_then(|v| v.trim().parse().ok())
}
