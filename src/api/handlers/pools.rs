use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use super::{blocking, AppState};
use crate::api::models::{ok, ApiResult, HealthStatus, SurvivorPickRequest};
use crate::domain::{ConfidencePickSheet, Week};
use crate::scoring::WeekScore;
use crate::services::pools::SurvivorSubmission;
use crate::services::scoring::Standings;

pub async fn health() -> ApiResult<HealthStatus> {
    ok(HealthStatus {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn get_standings(
    State(state): State<Arc<AppState>>,
    Path(pool_id): Path<String>,
) -> ApiResult<Standings> {
    let scoring = state.scoring.clone();
    ok(blocking(move || scoring.standings(&pool_id)).await?)
}

pub async fn get_week_scores(
    State(state): State<Arc<AppState>>,
    Path((pool_id, week)): Path<(String, Week)>,
) -> ApiResult<Vec<WeekScore>> {
    let scoring = state.scoring.clone();
    ok(blocking(move || scoring.week_scores(&pool_id, week)).await?)
}

pub async fn put_confidence_picks(
    State(state): State<Arc<AppState>>,
    Path((pool_id, week, user_id)): Path<(String, Week, String)>,
    Json(sheet): Json<ConfidencePickSheet>,
) -> ApiResult<ConfidencePickSheet> {
    let pools = state.pools.clone();
    ok(blocking(move || pools.submit_confidence_picks(&pool_id, week, &user_id, sheet)).await?)
}

pub async fn put_survivor_pick(
    State(state): State<Arc<AppState>>,
    Path((pool_id, week, user_id)): Path<(String, Week, String)>,
    Json(request): Json<SurvivorPickRequest>,
) -> ApiResult<SurvivorSubmission> {
    let pools = state.pools.clone();
    ok(blocking(move || pools.submit_survivor_pick(&pool_id, week, &user_id, &request.team)).await?)
}
