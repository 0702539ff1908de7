use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

use crate::api::handlers::{
    admin::{
        admin_refresh, create_pool, delete_member, export_csv, import_games, put_member, score_week,
        survivor_override, verify_week,
    },
    pools::{get_standings, get_week_scores, health, put_confidence_picks, put_survivor_pick},
    AppState,
};

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/pools/:pool/standings", get(get_standings))
        .route("/api/pools/:pool/weeks/:week/scores", get(get_week_scores))
        .route("/api/pools/:pool/weeks/:week/confidence/:user", put(put_confidence_picks))
        .route("/api/pools/:pool/weeks/:week/survivor/:user", put(put_survivor_pick))
        .route("/api/admin/refresh", post(admin_refresh))
        .route("/api/admin/pools", post(create_pool))
        .route("/api/admin/pools/:pool/members/:user", put(put_member).delete(delete_member))
        .route("/api/admin/seasons/:season/weeks/:week/games", post(import_games))
        .route("/api/admin/pools/:pool/weeks/:week/score", post(score_week))
        .route("/api/admin/pools/:pool/weeks/:week/verify", get(verify_week))
        .route("/api/admin/pools/:pool/survivor/:user/override", post(survivor_override))
        .route("/api/admin/pools/:pool/export.csv", get(export_csv))
        .with_state(state)
}
