use axum::{
    extract::{Path, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
    Json,
};
use log::info;
use std::sync::Arc;

use super::{blocking, AppState};
use crate::api::models::{ok, ApiError, ApiResult, OverrideResult, RefreshRequest};
use crate::database;
use crate::domain::{Member, Pool, ScheduledGame, ScoringTrigger, Season, Week};
use crate::scoring::AuditReport;
use crate::services::export::export_pool_csv_string;
use crate::services::ingestion::{IngestionReport, IngestionService};
use crate::services::pools::{NewPool, OverrideRequest, ScheduleImport};
use crate::services::scoring::ScoringSummary;

pub async fn admin_refresh(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Option<Json<RefreshRequest>>,
) -> ApiResult<IngestionReport> {
    state.authorize(&headers)?;
    let request = body.map(|Json(r)| r).unwrap_or_default();
    info!("Admin triggered refresh: {:?}", request);

    let mut service = IngestionService::new(state.pool.clone(), &state.config)?;
    let report = match (request.season, request.week) {
        (Some(season), Some(week)) => service.ingest_week(season, week).await?,
        (None, None) => service.ingest_current().await?,
        _ => return Err(ApiError::bad_request("Provide both season and week, or neither")),
    };
    ok(report)
}

pub async fn create_pool(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<NewPool>,
) -> ApiResult<Pool> {
    state.authorize(&headers)?;
    let pools = state.pools.clone();
    ok(blocking(move || pools.create_pool(&request)).await?)
}

pub async fn put_member(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path((pool_id, user_id)): Path<(String, String)>,
    Json(member): Json<Member>,
) -> ApiResult<Pool> {
    state.authorize(&headers)?;
    let pools = state.pools.clone();
    ok(blocking(move || pools.upsert_member(&pool_id, &user_id, member)).await?)
}

pub async fn delete_member(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path((pool_id, user_id)): Path<(String, String)>,
) -> ApiResult<String> {
    state.authorize(&headers)?;
    let pools = state.pools.clone();
    let removed = user_id.clone();
    blocking(move || pools.remove_member(&pool_id, &user_id)).await?;
    ok(removed)
}

pub async fn import_games(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path((season, week)): Path<(Season, Week)>,
    Json(games): Json<Vec<ScheduledGame>>,
) -> ApiResult<ScheduleImport> {
    state.authorize(&headers)?;
    let pools = state.pools.clone();
    ok(blocking(move || pools.import_schedule(season, week, games)).await?)
}

pub async fn score_week(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path((pool_id, week)): Path<(String, Week)>,
) -> ApiResult<ScoringSummary> {
    state.authorize(&headers)?;
    let scoring = state.scoring.clone();
    ok(blocking(move || scoring.score_week(&pool_id, week, ScoringTrigger::Admin)).await?)
}

pub async fn verify_week(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path((pool_id, week)): Path<(String, Week)>,
) -> ApiResult<AuditReport> {
    state.authorize(&headers)?;
    let scoring = state.scoring.clone();
    ok(blocking(move || scoring.verify_week(&pool_id, week)).await?)
}

/// Record an override and rescore its week so the change shows at once
pub async fn survivor_override(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path((pool_id, user_id)): Path<(String, String)>,
    Json(request): Json<OverrideRequest>,
) -> ApiResult<OverrideResult<ScoringSummary>> {
    state.authorize(&headers)?;
    let pools = state.pools.clone();
    let scoring = state.scoring.clone();

    let result = blocking(move || {
        let week = request.week;
        let override_id = pools.record_override(&pool_id, &user_id, request)?;
        let summary = scoring.score_week(&pool_id, week, ScoringTrigger::Admin)?;
        Ok(OverrideResult {
            override_id,
            scoring: summary,
        })
    })
    .await?;
    ok(result)
}

pub async fn export_csv(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(pool_id): Path<String>,
) -> Result<Response, ApiError> {
    state.authorize(&headers)?;
    let db = state.pool.clone();
    let filename = format!("attachment; filename=\"{}.csv\"", pool_id);

    let csv = blocking(move || {
        let conn = database::get_connection(&db)?;
        export_pool_csv_string(&conn, &pool_id)
    })
    .await?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, filename),
        ],
        csv,
    )
        .into_response())
}
