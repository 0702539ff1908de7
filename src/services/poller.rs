use std::time::Duration;

use anyhow::Result;
use log::{error, info};
use tokio::time::{interval, MissedTickBehavior};

use crate::config::settings::AppConfig;
use crate::database::DbPool;
use crate::services::ingestion::{IngestionReport, IngestionService};

/// Polls the current ESPN scoreboard on a fixed interval. A failed tick is
/// logged and the next tick simply tries again.
pub struct ScorePoller {
    ingestion: IngestionService,
    period: Duration,
}

impl ScorePoller {
    pub fn new(db: DbPool, config: &AppConfig) -> Result<Self> {
        Ok(Self {
            ingestion: IngestionService::new(db, config)?,
            period: config.poller.interval(),
        })
    }

    pub async fn tick(&mut self) -> Result<IngestionReport> {
        self.ingestion.ingest_current().await
    }

    pub async fn run(mut self) {
        info!("Score poller started, polling every {}s", self.period.as_secs());
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            match self.tick().await {
                Ok(report) if !report.newly_final.is_empty() => info!(
                    "Poll: {} games went final in season {} week {}",
                    report.newly_final.len(),
                    report.season,
                    report.week
                ),
                Ok(_) => {}
                Err(e) => error!("Poll failed, retrying next tick: {:?}", e),
            }
        }
    }
}
