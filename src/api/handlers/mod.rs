use axum::http::{header, HeaderMap, StatusCode};

use crate::api::models::ApiError;
use crate::config::settings::AppConfig;
use crate::database::DbPool;
use crate::services::pools::PoolService;
use crate::services::scoring::ScoringService;

pub mod admin;
pub mod pools;

pub struct AppState {
    pub pool: DbPool,
    pub config: AppConfig,
    pub scoring: ScoringService,
    pub pools: PoolService,
}

impl AppState {
    pub fn new(pool: DbPool, config: AppConfig) -> Self {
        Self {
            scoring: ScoringService::new(pool.clone(), config.scoring.clone()),
            pools: PoolService::new(pool.clone()),
            pool,
            config,
        }
    }

    /// Admin routes require `Authorization: Bearer {ADMIN_TOKEN}`
    pub fn authorize(&self, headers: &HeaderMap) -> Result<(), ApiError> {
        let expected = format!("Bearer {}", self.config.server.admin_token);
        let provided = headers.get(header::AUTHORIZATION).and_then(|h| h.to_str().ok());
        if provided == Some(expected.as_str()) {
            Ok(())
        } else {
            Err(ApiError::unauthorized())
        }
    }
}

/// Run synchronous database work off the async workers
pub async fn blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, format!("Task failed: {}", e)))?
        .map_err(ApiError::from)
}
