use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use tracing::error;

use memeplayers_db::Database;

use crate::error::ApiError;
use crate::throttle::Throttle;

pub type AppState = Arc<AppStateInner>;

/// Runtime knobs the server binary reads from its environment.
#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub jwt_secret: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub vote_rate_per_min: NonZeroU32,
    pub post_rate_per_min: NonZeroU32,
}

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub vote_throttle: Throttle,
    pub post_throttle: Throttle,
}

impl AppStateInner {
    pub fn new(db: Database, settings: ApiSettings) -> AppState {
        Arc::new(Self {
            db,
            jwt_secret: settings.jwt_secret,
            access_ttl: settings.access_ttl,
            refresh_ttl: settings.refresh_ttl,
            vote_throttle: Throttle::per_minute("votes", settings.vote_rate_per_min),
            post_throttle: Throttle::per_minute("posts", settings.post_rate_per_min),
        })
    }
}

/// Run CPU-bound or blocking work off the async runtime.
pub async fn run_blocking<F, T>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::Internal
    })?
}

/// Run blocking DB work off the async runtime.
pub async fn run_db<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> memeplayers_db::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    run_blocking(move || f(&state.db).map_err(ApiError::from)).await
}
