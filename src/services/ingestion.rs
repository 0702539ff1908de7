use anyhow::{Context, Result};
use chrono::Utc;
use log::{error, info, warn};
use rusqlite::Connection;
use serde::Serialize;

use crate::api::parsers::{FetchedGame, Scoreboard};
use crate::api::EspnClient;
use crate::cache::SnapshotCache;
use crate::config::settings::AppConfig;
use crate::database::{self, games, pools, DbPool};
use crate::domain::{GameId, GameRecord, GameStatus, ScoringTrigger, Season, Week};
use crate::errors::check_week;
use crate::services::scoring::{ScoringService, ScoringSummary};

/// What one ingestion pass changed
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestionReport {
    pub season: Season,
    pub week: Week,
    pub fetched: usize,
    pub matched: usize,
    pub updated: usize,
    pub unmatched: Vec<String>,
    pub newly_final: Vec<GameId>,
    pub rescored: Vec<ScoringSummary>,
    /// Set when the board was fetched but not applied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<String>,
}

pub struct IngestionService {
    db: DbPool,
    client: EspnClient,
    cache: SnapshotCache,
    scoring: ScoringService,
}

impl IngestionService {
    pub fn new(db: DbPool, config: &AppConfig) -> Result<Self> {
        Ok(Self {
            client: EspnClient::new(&config.espn)?,
            cache: SnapshotCache::new(&config.espn.cache_dir)?,
            scoring: ScoringService::new(db.clone(), config.scoring.clone()),
            db,
        })
    }

    /// Fetch and apply one regular season week
    pub async fn ingest_week(&mut self, season: Season, week: Week) -> Result<IngestionReport> {
        check_week(week)?;
        info!("=== Ingesting season {} week {} ===", season, week);
        let (raw, scoreboard) = self.client.fetch_scoreboard(Some((season, week))).await?;
        self.snapshot(season, week, &raw);
        self.apply(season, week, scoreboard).await
    }

    /// Fetch the current scoreboard; season and week come from the response
    pub async fn ingest_current(&mut self) -> Result<IngestionReport> {
        let (raw, scoreboard) = self.client.fetch_scoreboard(None).await?;
        let (Some(season), Some(week)) = (scoreboard.season, scoreboard.week) else {
            anyhow::bail!("Scoreboard response did not include a season and week");
        };
        if !scoreboard.is_regular_season() {
            let reason = format!(
                "season type {} is not the regular season",
                scoreboard.season_type.unwrap_or_default()
            );
            info!("Skipping current scoreboard for season {} week {}: {}", season, week, reason);
            return Ok(IngestionReport {
                season,
                week,
                fetched: scoreboard.games.len(),
                skipped: Some(reason),
                ..Default::default()
            });
        }
        info!("=== Ingesting current scoreboard: season {} week {} ===", season, week);
        self.snapshot(season, week, &raw);
        self.apply(season, week, scoreboard).await
    }

    fn snapshot(&self, season: Season, week: Week, raw: &serde_json::Value) {
        let key = SnapshotCache::scoreboard_key(season, week);
        if let Err(e) = self.cache.save_raw(&key, raw) {
            warn!("Failed to save scoreboard snapshot {}: {:?}", key, e);
        }
    }

    async fn apply(&self, season: Season, week: Week, scoreboard: Scoreboard) -> Result<IngestionReport> {
        let db = self.db.clone();
        let scoring = self.scoring.clone();

        tokio::task::spawn_blocking(move || -> Result<IngestionReport> {
            let mut conn = database::get_connection(&db)?;
            let mut report = apply_scoreboard(&mut conn, season, week, &scoreboard)?;
            drop(conn);

            if !report.newly_final.is_empty() {
                report.rescored = rescore_season_week(&db, &scoring, season, week)?;
            }
            Ok(report)
        })
        .await
        .context("Ingestion task panicked")?
    }
}

/// Match fetched games to stored ones and write every change in one
/// transaction. Games are never created here; unmatched ESPN games are
/// reported and skipped.
pub fn apply_scoreboard(
    conn: &mut Connection,
    season: Season,
    week: Week,
    scoreboard: &Scoreboard,
) -> Result<IngestionReport> {
    let stored = games::list_week_games(conn, season, week)?;
    let mut report = IngestionReport {
        season,
        week,
        fetched: scoreboard.games.len(),
        ..Default::default()
    };
    let mut changed = Vec::new();

    for fetched in &scoreboard.games {
        let Some((game, swapped)) = stored.iter().find_map(|g| orientation(g, fetched).map(|s| (g, s))) else {
            warn!("No stored game for ESPN {} ({}), skipping", fetched.espn_id, fetched.label());
            report.unmatched.push(fetched.label());
            continue;
        };
        report.matched += 1;

        let updated = merge(game, fetched, swapped);
        if updated == *game {
            continue;
        }
        if !game.is_final() && updated.is_final() {
            info!("Game {} is final: {:?}-{:?}", updated.id, updated.home_score, updated.away_score);
            report.newly_final.push(updated.id.clone());
        }
        changed.push(GameRecord {
            updated_at: Some(Utc::now()),
            ..updated
        });
    }

    database::run_transaction(conn, |tx| {
        for game in &changed {
            games::save_game(tx, season, week, game)?;
        }
        Ok(())
    })
    .with_context(|| format!("Failed to store ingested games for season {} week {}", season, week))?;
    report.updated = changed.len();

    info!(
        "Season {} week {}: {} fetched, {} matched, {} updated, {} newly final, {} unmatched",
        season,
        week,
        report.fetched,
        report.matched,
        report.updated,
        report.newly_final.len(),
        report.unmatched.len()
    );
    Ok(report)
}

/// `Some(false)` when ESPN lists the game as stored, `Some(true)` when home
/// and away are reversed
fn orientation(game: &GameRecord, fetched: &FetchedGame) -> Option<bool> {
    if fetched.is_home(&game.home_team) && fetched.is_away(&game.away_team) {
        Some(false)
    } else if fetched.is_home(&game.away_team) && fetched.is_away(&game.home_team) {
        Some(true)
    } else {
        None
    }
}

fn merge(game: &GameRecord, fetched: &FetchedGame, swapped: bool) -> GameRecord {
    let (home_score, away_score) = if swapped {
        (fetched.away_score, fetched.home_score)
    } else {
        (fetched.home_score, fetched.away_score)
    };

    let mut updated = game.clone();
    let other_event = game
        .espn_id
        .as_deref()
        .is_some_and(|id| !fetched.espn_id.is_empty() && id != fetched.espn_id);
    if game.is_final() && other_event {
        warn!(
            "ESPN {} ({}) matches final game {} from event {:?}, leaving it alone",
            fetched.espn_id,
            fetched.label(),
            game.id,
            game.espn_id
        );
        return updated;
    }
    if game.is_final() && fetched.status != GameStatus::Final {
        warn!(
            "ESPN reports {} as {} after it was final, keeping final result",
            game.id,
            fetched.status.as_str()
        );
    } else {
        updated.status = fetched.status;
        updated.home_score = home_score.or(game.home_score);
        updated.away_score = away_score.or(game.away_score);
    }
    updated.winner = if updated.is_final() { updated.derive_winner() } else { None };
    updated.espn_id = Some(fetched.espn_id.clone()).filter(|id| !id.is_empty()).or(updated.espn_id);
    updated.kickoff = updated.kickoff.or(fetched.kickoff);
    updated
}

/// Rescore a week in every pool of the season. One failing pool does not
/// stop the others.
fn rescore_season_week(
    db: &DbPool,
    scoring: &ScoringService,
    season: Season,
    week: Week,
) -> Result<Vec<ScoringSummary>> {
    let pool_ids: Vec<String> = {
        let conn = database::get_connection(db)?;
        pools::pools_for_season(&conn, season)?
            .into_iter()
            .map(|doc| doc.id)
            .collect()
    };

    let mut summaries = Vec::new();
    for pool_id in pool_ids {
        match scoring.score_week(&pool_id, week, ScoringTrigger::Ingestion) {
            Ok(summary) => summaries.push(summary),
            Err(e) => error!("Rescoring pool {} week {} failed: {:?}", pool_id, week, e),
        }
    }
    Ok(summaries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::parsers::scoreboard::tests::event;
    use crate::api::parsers::parse_scoreboard;
    use crate::config::settings::{EspnSettings, ScoringSettings};
    use crate::services::scoring::tests::{memory_db, seeded_db};
    use serde_json::json;

    fn board(events: Vec<serde_json::Value>) -> Scoreboard {
        parse_scoreboard(json!({"season": {"year": 2025}, "week": {"number": 2}, "events": events})).unwrap()
    }

    fn store_week_two(db: &DbPool) {
        let conn = database::get_connection(db).unwrap();
        games::save_game(&conn, 2025, 2, &GameRecord::new("den-at-kc", "Kansas City Chiefs", "Denver Broncos")).unwrap();
        games::save_game(&conn, 2025, 2, &GameRecord::new("nyj-at-ne", "NE", "NYJ")).unwrap();
    }

    #[test]
    fn test_apply_matches_both_orientations() {
        let db = memory_db();
        store_week_two(&db);
        let scoreboard = board(vec![
            event("1", ("KC", "Kansas City Chiefs", "21"), ("DEN", "Denver Broncos", "14"), "STATUS_FINAL", true),
            // ESPN lists this one the other way round
            event("2", ("NYJ", "New York Jets", "10"), ("NE", "New England Patriots", "3"), "STATUS_IN_PROGRESS", false),
            event("3", ("LAR", "Los Angeles Rams", "0"), ("SF", "San Francisco 49ers", "0"), "STATUS_SCHEDULED", false),
        ]);

        let mut conn = database::get_connection(&db).unwrap();
        let report = apply_scoreboard(&mut conn, 2025, 2, &scoreboard).unwrap();
        assert_eq!(report.fetched, 3);
        assert_eq!(report.matched, 2);
        assert_eq!(report.updated, 2);
        assert_eq!(report.newly_final, vec!["den-at-kc".to_string()]);
        assert_eq!(report.unmatched.len(), 1);

        let kc = games::get_game(&conn, 2025, 2, "den-at-kc").unwrap().unwrap();
        assert_eq!(kc.winner.as_deref(), Some("Kansas City Chiefs"));
        assert_eq!(kc.espn_id.as_deref(), Some("1"));
        let ne = games::get_game(&conn, 2025, 2, "nyj-at-ne").unwrap().unwrap();
        assert_eq!((ne.home_score, ne.away_score), (Some(3), Some(10)));
        assert_eq!(ne.status, GameStatus::InProgress);

        // Same data again changes nothing
        let again = apply_scoreboard(&mut conn, 2025, 2, &scoreboard).unwrap();
        assert_eq!(again.updated, 0);
        assert!(again.newly_final.is_empty());
        // No games were created for the unmatched event
        assert_eq!(games::list_week_games(&conn, 2025, 2).unwrap().len(), 2);
    }

    #[test]
    fn test_final_result_is_not_regressed() {
        let mut game = GameRecord::new("g", "KC", "DEN");
        game.status = GameStatus::Final;
        game.home_score = Some(21);
        game.away_score = Some(14);
        let scoreboard = board(vec![event("9", ("KC", "Chiefs", "0"), ("DEN", "Broncos", "0"), "STATUS_SCHEDULED", false)]);

        let merged = merge(&game, &scoreboard.games[0], false);
        assert!(merged.is_final());
        assert_eq!(merged.home_score, Some(21));
        assert_eq!(merged.winner.as_deref(), Some("KC"));
    }

    #[test]
    fn test_final_game_ignores_other_espn_event() {
        let mut game = GameRecord::new("lac-at-kc", "KC", "LAC");
        game.status = GameStatus::Final;
        game.home_score = Some(27);
        game.away_score = Some(21);
        game.winner = Some("KC".to_string());
        game.espn_id = Some("401".to_string());

        // Same teams, different event: a playoff rematch
        let rematch = board(vec![event("999", ("LAC", "Los Angeles Chargers", "30"), ("KC", "Kansas City Chiefs", "0"), "STATUS_FINAL", true)]);
        let merged = merge(&game, &rematch.games[0], true);
        assert_eq!(merged, game);

        // The original event may still correct its own score
        let correction = board(vec![event("401", ("KC", "Kansas City Chiefs", "28"), ("LAC", "Los Angeles Chargers", "21"), "STATUS_FINAL", true)]);
        let merged = merge(&game, &correction.games[0], false);
        assert_eq!(merged.home_score, Some(28));
    }

    fn mock_config(server: &mockito::Server, cache_dir: &tempfile::TempDir) -> AppConfig {
        AppConfig {
            espn: EspnSettings {
                base_url: server.url(),
                min_request_gap_ms: 0,
                cache_dir: cache_dir.path().to_string_lossy().to_string(),
                ..EspnSettings::default()
            },
            scoring: ScoringSettings::default(),
            ..AppConfig::default()
        }
    }

    #[tokio::test]
    async fn test_ingest_current_skips_postseason_board() {
        let db = seeded_db();
        let mut server = mockito::Server::new_async().await;
        let body = json!({
            "season": {"year": 2025, "type": 3},
            "week": {"number": 1},
            "events": [event("777", ("LV", "Las Vegas Raiders", "30"), ("KC", "Kansas City Chiefs", "0"), "STATUS_FINAL", true)]
        });
        let _mock = server
            .mock("GET", "/apis/site/v2/sports/football/nfl/scoreboard")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create_async()
            .await;

        let cache_dir = tempfile::tempdir().unwrap();
        let mut service = IngestionService::new(db.clone(), &mock_config(&server, &cache_dir)).unwrap();
        let report = service.ingest_current().await.unwrap();
        assert!(report.skipped.is_some());
        assert_eq!(report.matched, 0);
        assert!(report.rescored.is_empty());

        let conn = database::get_connection(&db).unwrap();
        let kc = games::get_game(&conn, 2025, 1, "lv-at-kc").unwrap().unwrap();
        assert_eq!((kc.home_score, kc.away_score), (Some(27), Some(10)));
    }

    #[tokio::test]
    async fn test_ingest_week_rescores_pools_on_final() {
        let db = seeded_db();
        store_week_two(&db);

        let mut server = mockito::Server::new_async().await;
        let body = json!({
            "season": {"year": 2025},
            "week": {"number": 2},
            "events": [event("1", ("KC", "Kansas City Chiefs", "21"), ("DEN", "Denver Broncos", "14"), "STATUS_FINAL", true)]
        });
        let _mock = server
            .mock("GET", "/apis/site/v2/sports/football/nfl/scoreboard")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create_async()
            .await;

        let cache_dir = tempfile::tempdir().unwrap();
        let mut service = IngestionService::new(db.clone(), &mock_config(&server, &cache_dir)).unwrap();
        let report = service.ingest_week(2025, 2).await.unwrap();
        assert_eq!(report.newly_final, vec!["den-at-kc".to_string()]);
        assert_eq!(report.rescored.len(), 1);
        assert_eq!(report.rescored[0].pool_id, "office");
        assert_eq!(report.rescored[0].week, 2);

        let snapshot = SnapshotCache::new(cache_dir.path()).unwrap();
        assert!(snapshot.load_raw("scoreboard-2025-w02").unwrap().is_some());
    }
}
