use anyhow::{Context, Result};
use log::{info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::handlers::AppState;
use crate::api::routes::create_router;
use crate::config::settings::AppConfig;
use crate::database::{self, setup::initialize_schema};
use crate::services::poller::ScorePoller;

pub struct ServerService {
    port: u16,
    config: AppConfig,
    poll: bool,
}

impl ServerService {
    pub fn new(port: u16, config: AppConfig, poll: bool) -> Self {
        Self { port, config, poll }
    }

    pub async fn run(&self) -> Result<()> {
        let pool = database::create_pool(&self.config.database.path)?;
        initialize_schema(&*database::get_connection(&pool)?)?;

        if self.poll {
            let poller = ScorePoller::new(pool.clone(), &self.config)?;
            tokio::spawn(poller.run());
        } else {
            warn!("Score polling disabled; use /api/admin/refresh to ingest");
        }

        let state = Arc::new(AppState::new(pool, self.config.clone()));
        let app = create_router(state).layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        );

        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        info!("Server listening on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}
