pub mod middleware;
pub mod routes;

use std::sync::Arc;

use axum::{
    extract::FromRef,
    middleware as axum_middleware,
    routing::{delete, get, post},
    Router,
};
use http::header::{HeaderValue, CACHE_CONTROL};
use sqlx::SqlitePool;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::services::match_service::{MatchConfig, MatchService};
use crate::services::sqlite_store::SqliteStore;
use crate::services::store::{Notifier, PhotoSource, SwipeStore};
use crate::services::swipe_service::SwipeService;
use middleware::auth;
use routes::{candidates, health, matches, swipes};

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub store: SqliteStore,
    pub photos: Arc<dyn PhotoSource>,
    pub swipes: Arc<SwipeService>,
    pub matches: Arc<MatchService>,
}

impl AppState {
    pub fn new(
        pool: SqlitePool,
        photos: Arc<dyn PhotoSource>,
        notifier: Arc<dyn Notifier>,
        matching: MatchConfig,
    ) -> Self {
        let store = SqliteStore::new(pool.clone());
        let swipe_store: Arc<dyn SwipeStore> = Arc::new(store.clone());
        Self {
            swipes: Arc::new(SwipeService::new(
                Arc::clone(&swipe_store),
                Arc::clone(&notifier),
            )),
            matches: Arc::new(MatchService::new(swipe_store, notifier, matching)),
            pool,
            store,
            photos,
        }
    }
}

impl FromRef<AppState> for SqlitePool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

pub fn router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/api/candidates", get(candidates::list_candidates))
        .route(
            "/api/profiles/:profile_id/photos",
            get(candidates::profile_photos),
        )
        .route("/api/swipes", post(swipes::record_swipe))
        .route("/api/likes/:liked_id", delete(swipes::undo_like))
        .route("/api/matches", get(matches::list_matches))
        .layer(axum_middleware::from_fn_with_state(
            state.pool.clone(),
            auth::require_auth,
        ));

    Router::new()
        .route("/health", get(health::health_handler))
        .merge(protected_routes)
        .layer(SetResponseHeaderLayer::if_not_present(
            CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::new())
        .with_state(state)
}
