use std::collections::BTreeMap;

use anyhow::{Context, Result};
use log::{info, warn};
use rusqlite::Connection;
use serde::Serialize;

use crate::config::settings::ScoringSettings;
use crate::database::{self, games, picks, pools, records, results, DbPool};
use crate::domain::{AuditRecord, ConfidencePickSheet, GameRecord, GameStatus, Pool, ScoringTrigger, UserId, Week};
use crate::errors::check_week;
use crate::scoring::verify::{compare, compare_survivor, recompute_week};
use crate::scoring::{
    evaluate_survivor, reconcile, score_confidence_week, season_totals, AuditReport, SeasonTotal,
    SurvivorInput, SurvivorStatus, WeekScore,
};

/// What one scoring run wrote
#[derive(Debug, Clone, Serialize)]
pub struct ScoringSummary {
    pub run_id: String,
    pub pool_id: String,
    pub week: Week,
    pub confidence_scored: usize,
    pub survivor_evaluated: usize,
    pub survivors_alive: usize,
    pub newly_eliminated: Vec<UserId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfidenceStanding {
    pub rank: usize,
    pub user_id: UserId,
    pub display_name: String,
    pub points: u32,
    pub correct: u32,
    pub weeks_scored: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SurvivorStanding {
    pub user_id: UserId,
    pub display_name: String,
    pub alive: bool,
    pub eliminated_week: Option<Week>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Standings {
    pub pool_id: String,
    pub name: String,
    pub season: i32,
    pub confidence: Vec<ConfidenceStanding>,
    pub survivor: Vec<SurvivorStanding>,
}

/// Scoring orchestration: loads a pool week, runs the calculators and
/// persists results with an audit record in one transaction
#[derive(Clone)]
pub struct ScoringService {
    db: DbPool,
    settings: ScoringSettings,
}

impl ScoringService {
    pub fn new(db: DbPool, settings: ScoringSettings) -> Self {
        Self { db, settings }
    }

    pub fn score_week(&self, pool_id: &str, week: Week, trigger: ScoringTrigger) -> Result<ScoringSummary> {
        check_week(week)?;
        let mut conn = database::get_connection(&self.db)?;
        let mut audit = AuditRecord::start(pool_id, week, trigger);
        info!("Scoring pool {} week {} ({:?})", pool_id, week, trigger);

        let pool = pools::require_pool(&conn, pool_id)?;
        let season_games = games::list_season_games(&conn, pool.season)?;
        let week_games = season_games.get(&week).map(Vec::as_slice).unwrap_or(&[]);
        audit.step(format!(
            "loaded {} games for season {} week {} ({} final)",
            week_games.len(),
            pool.season,
            week,
            week_games.iter().filter(|g| g.is_final()).count()
        ));
        if week_games.is_empty() {
            warn!("Pool {} week {}: no games imported", pool_id, week);
        }

        let week_scores = self.score_confidence(&conn, pool_id, &pool, week, week_games, &mut audit)?;

        let previous = results::list_survivor_statuses(&conn, pool_id)?;
        let statuses = self.replay_survivors(&conn, pool_id, &pool, &season_games, week, &previous)?;
        let newly_eliminated: Vec<UserId> = statuses
            .iter()
            .filter(|s| !s.alive && previous.get(&s.user_id).is_none_or(|p| p.alive))
            .map(|s| s.user_id.clone())
            .collect();
        audit.step(format!(
            "evaluated {} survivor entrants, {} alive, eliminated now: [{}]",
            statuses.len(),
            statuses.iter().filter(|s| s.alive).count(),
            newly_eliminated.join(", ")
        ));

        audit.finish();
        database::run_transaction(&mut conn, |tx| {
            for score in &week_scores {
                results::save_week_score(tx, pool_id, score)?;
            }
            for status in &statuses {
                results::save_survivor_status(tx, pool_id, status)?;
            }
            records::append_audit_record(tx, &audit)
        })
        .with_context(|| format!("Failed to store scoring results for pool {} week {}", pool_id, week))?;

        info!(
            "Scored pool {} week {}: {} confidence, {} survivor (run {})",
            pool_id,
            week,
            week_scores.len(),
            statuses.len(),
            audit.run_id
        );

        Ok(ScoringSummary {
            run_id: audit.run_id,
            pool_id: pool_id.to_string(),
            week,
            confidence_scored: week_scores.len(),
            survivor_evaluated: statuses.len(),
            survivors_alive: statuses.iter().filter(|s| s.alive).count(),
            newly_eliminated,
        })
    }

    fn score_confidence(
        &self,
        conn: &Connection,
        pool_id: &str,
        pool: &Pool,
        week: Week,
        week_games: &[GameRecord],
        audit: &mut AuditRecord,
    ) -> Result<Vec<WeekScore>> {
        let sheets = picks::list_confidence_sheets(conn, pool_id, week)?;
        let empty = ConfidencePickSheet::default();

        let scores: Vec<WeekScore> = pool
            .confidence_members()
            .map(|(user_id, _)| {
                let sheet = sheets.get(user_id).unwrap_or(&empty);
                score_confidence_week(user_id, week, week_games, sheet)
            })
            .collect();

        let flagged = scores.iter().filter(|s| !s.flags.is_empty()).count();
        audit.step(format!(
            "scored {} confidence sheets ({} submitted, {} flagged)",
            scores.len(),
            sheets.len(),
            flagged
        ));
        Ok(scores)
    }

    /// Replay every survivor entrant and merge with their stored status
    fn replay_survivors(
        &self,
        conn: &Connection,
        pool_id: &str,
        pool: &Pool,
        season_games: &BTreeMap<Week, Vec<GameRecord>>,
        week: Week,
        previous: &BTreeMap<UserId, SurvivorStatus>,
    ) -> Result<Vec<SurvivorStatus>> {
        let picks_by_user = picks::survivor_picks_by_user(conn, pool_id)?;
        let overrides = records::list_overrides(conn, pool_id)?;
        let through_week = latest_started_week(season_games).max(week);
        let no_picks = BTreeMap::new();

        let statuses = pool
            .survivor_members()
            .map(|(user_id, _)| {
                let input = SurvivorInput {
                    user_id,
                    picks: picks_by_user.get(user_id).unwrap_or(&no_picks),
                    games: season_games,
                    through_week,
                    overrides: &overrides,
                    policy: self.settings.missing_pick_policy,
                };
                reconcile(previous.get(user_id), evaluate_survivor(&input), &overrides)
            })
            .collect();
        Ok(statuses)
    }

    pub fn week_scores(&self, pool_id: &str, week: Week) -> Result<Vec<WeekScore>> {
        check_week(week)?;
        let conn = database::get_connection(&self.db)?;
        pools::require_pool(&conn, pool_id)?;
        Ok(results::list_week_scores(&conn, pool_id, week)?.into_values().collect())
    }

    pub fn standings(&self, pool_id: &str) -> Result<Standings> {
        let conn = database::get_connection(&self.db)?;
        let pool = pools::require_pool(&conn, pool_id)?;

        let scores: Vec<WeekScore> = results::list_all_week_scores(&conn, pool_id)?
            .into_iter()
            .filter(|s| pool.members.contains_key(&s.user_id))
            .collect();
        let mut totals = season_totals(&scores);
        for (user_id, _) in pool.confidence_members() {
            if !totals.iter().any(|t| &t.user_id == user_id) {
                totals.push(SeasonTotal {
                    user_id: user_id.clone(),
                    points: 0,
                    correct: 0,
                    weeks_scored: 0,
                });
            }
        }

        let confidence = totals
            .into_iter()
            .enumerate()
            .map(|(idx, total)| ConfidenceStanding {
                rank: idx + 1,
                display_name: pool.display_name(&total.user_id),
                user_id: total.user_id,
                points: total.points,
                correct: total.correct,
                weeks_scored: total.weeks_scored,
            })
            .collect();

        let statuses = results::list_survivor_statuses(&conn, pool_id)?;
        let mut survivor: Vec<SurvivorStanding> = pool
            .survivor_members()
            .map(|(user_id, member)| {
                let status = statuses.get(user_id);
                SurvivorStanding {
                    user_id: user_id.clone(),
                    display_name: member.display_name.clone(),
                    alive: status.is_none_or(|s| s.alive),
                    eliminated_week: status.and_then(|s| s.eliminated_week),
                    reason: status.and_then(|s| s.reason.as_ref()).map(|r| r.describe()),
                }
            })
            .collect();
        // Alive first, then those who lasted longest
        survivor.sort_by(|a, b| {
            b.alive
                .cmp(&a.alive)
                .then_with(|| b.eliminated_week.cmp(&a.eliminated_week))
                .then_with(|| a.user_id.cmp(&b.user_id))
        });

        Ok(Standings {
            pool_id: pool_id.to_string(),
            name: pool.name.clone(),
            season: pool.season,
            confidence,
            survivor,
        })
    }

    /// Recompute a week through the independent path and report where the
    /// stored results disagree
    pub fn verify_week(&self, pool_id: &str, week: Week) -> Result<AuditReport> {
        check_week(week)?;
        let conn = database::get_connection(&self.db)?;
        let pool = pools::require_pool(&conn, pool_id)?;
        let season_games = games::list_season_games(&conn, pool.season)?;
        let week_games = season_games.get(&week).map(Vec::as_slice).unwrap_or(&[]);

        let sheets: BTreeMap<UserId, _> = picks::list_confidence_sheets(&conn, pool_id, week)?
            .into_iter()
            .filter(|(user_id, _)| pool.members.get(user_id).is_some_and(|m| m.confidence_enabled))
            .collect();
        let stored = results::list_week_scores(&conn, pool_id, week)?;
        let confidence = compare(&stored, &recompute_week(week_games, &sheets));

        let previous = results::list_survivor_statuses(&conn, pool_id)?;
        let replayed = self.replay_survivors(&conn, pool_id, &pool, &season_games, week, &previous)?;
        let survivor = compare_survivor(&previous, &replayed);

        let report = AuditReport { confidence, survivor };
        if report.is_clean() {
            info!("Pool {} week {}: stored results verified", pool_id, week);
        } else {
            warn!(
                "Pool {} week {}: {} confidence and {} survivor discrepancies",
                pool_id,
                week,
                report.confidence.len(),
                report.survivor.len()
            );
        }
        Ok(report)
    }
}

/// Last week with a game that has kicked off
fn latest_started_week(season_games: &BTreeMap<Week, Vec<GameRecord>>) -> Week {
    season_games
        .iter()
        .filter(|(_, games)| games.iter().any(|g| g.status != GameStatus::Scheduled))
        .map(|(week, _)| *week)
        .max()
        .unwrap_or(0)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::database::setup::initialize_schema;
    use crate::domain::{ConfidencePick, Member, SurvivorPick};
    use serde_json::json;

    pub(crate) fn memory_db() -> DbPool {
        let db = database::create_memory_pool().unwrap();
        initialize_schema(&database::get_connection(&db).unwrap()).unwrap();
        db
    }

    pub(crate) fn final_game(id: &str, home: &str, away: &str, home_score: u32, away_score: u32) -> GameRecord {
        let mut game = GameRecord::new(id, home, away);
        game.home_score = Some(home_score);
        game.away_score = Some(away_score);
        game.status = GameStatus::Final;
        game
    }

    /// Pool "office" (2025) with ann and bob in both games, one week of
    /// final results: KC beat LV, BUF lost to MIA
    pub(crate) fn seeded_db() -> DbPool {
        let db = memory_db();
        let conn = database::get_connection(&db).unwrap();
        let mut pool = Pool::new("Office", 2025);
        for (id, name) in [("ann", "Ann"), ("bob", "Bob")] {
            pool.members.insert(
                id.to_string(),
                Member {
                    display_name: name.to_string(),
                    confidence_enabled: true,
                    survivor_enabled: true,
                },
            );
        }
        pools::create_pool(&conn, "office", &pool).unwrap();

        games::save_game(&conn, 2025, 1, &final_game("lv-at-kc", "KC", "LV", 27, 10)).unwrap();
        games::save_game(&conn, 2025, 1, &final_game("mia-at-buf", "BUF", "MIA", 20, 23)).unwrap();

        let sheet = |picks: &[(&str, &str, serde_json::Value)]| ConfidencePickSheet {
            picks: picks
                .iter()
                .map(|(g, t, c)| (g.to_string(), ConfidencePick { team: t.to_string(), confidence: c.clone() }))
                .collect(),
            submitted_at: None,
        };
        picks::save_confidence_sheet(&conn, "office", 1, "ann", &sheet(&[("lv-at-kc", "Chiefs", json!(2)), ("mia-at-buf", "MIA", json!(1))])).unwrap();
        picks::save_confidence_sheet(&conn, "office", 1, "bob", &sheet(&[("lv-at-kc", "Raiders", json!(1)), ("mia-at-buf", "Bills", json!("2"))])).unwrap();

        let pick = |team: &str| SurvivorPick { team: team.to_string(), submitted_at: None };
        picks::save_survivor_pick(&conn, "office", 1, "ann", &pick("Kansas City Chiefs")).unwrap();
        picks::save_survivor_pick(&conn, "office", 1, "bob", &pick("Buffalo Bills")).unwrap();
        db
    }

    fn service(db: &DbPool) -> ScoringService {
        ScoringService::new(db.clone(), ScoringSettings::default())
    }

    #[test]
    fn test_score_week_persists_results_and_audit() {
        let db = seeded_db();
        let summary = service(&db).score_week("office", 1, ScoringTrigger::Cli).unwrap();

        assert_eq!(summary.confidence_scored, 2);
        assert_eq!(summary.survivor_evaluated, 2);
        assert_eq!(summary.survivors_alive, 1);
        assert_eq!(summary.newly_eliminated, vec!["bob".to_string()]);

        let conn = database::get_connection(&db).unwrap();
        let scores = results::list_week_scores(&conn, "office", 1).unwrap();
        assert_eq!(scores["ann"].points, 3);
        assert_eq!(scores["bob"].points, 0);

        let audit = records::list_audit_records(&conn, "office").unwrap();
        assert_eq!(audit.len(), 1);
        assert_eq!(audit[0].run_id, summary.run_id);
        assert!(audit[0].finished_at.is_some());
    }

    #[test]
    fn test_rescoring_is_idempotent_and_keeps_eliminations() {
        let db = seeded_db();
        let scoring = service(&db);
        scoring.score_week("office", 1, ScoringTrigger::Cli).unwrap();
        let again = scoring.score_week("office", 1, ScoringTrigger::Admin).unwrap();
        assert!(again.newly_eliminated.is_empty());

        let standings = scoring.standings("office").unwrap();
        assert_eq!(standings.confidence[0].user_id, "ann");
        assert_eq!(standings.confidence[0].points, 3);
        assert_eq!(standings.survivor[0].user_id, "ann");
        assert!(!standings.survivor[1].alive);
        assert_eq!(standings.survivor[1].eliminated_week, Some(1));

        let conn = database::get_connection(&db).unwrap();
        assert_eq!(records::list_audit_records(&conn, "office").unwrap().len(), 2);
    }

    #[test]
    fn test_verify_week_detects_tampering() {
        let db = seeded_db();
        let scoring = service(&db);
        scoring.score_week("office", 1, ScoringTrigger::Cli).unwrap();
        assert!(scoring.verify_week("office", 1).unwrap().is_clean());

        let conn = database::get_connection(&db).unwrap();
        let mut tampered = results::list_week_scores(&conn, "office", 1).unwrap()["bob"].clone();
        tampered.points = 12;
        results::save_week_score(&conn, "office", &tampered).unwrap();
        drop(conn);

        let report = scoring.verify_week("office", 1).unwrap();
        assert_eq!(report.confidence.len(), 1);
        assert_eq!(report.confidence[0].user_id, "bob");
        assert_eq!(report.confidence[0].recomputed.points, 0);
    }

    #[test]
    fn test_missing_pool_is_not_found() {
        let db = memory_db();
        let err = service(&db).score_week("nope", 1, ScoringTrigger::Cli).unwrap_err();
        assert!(matches!(
            crate::errors::find_pool_error(&err),
            Some(crate::errors::PoolError::NotFound(_))
        ));
    }

    #[test]
    fn test_week_outside_season_is_rejected() {
        let db = seeded_db();
        for week in [0, u32::MAX] {
            let err = service(&db).score_week("office", week, ScoringTrigger::Admin).unwrap_err();
            assert!(matches!(
                crate::errors::find_pool_error(&err),
                Some(crate::errors::PoolError::InvalidInput(_))
            ));
            assert!(service(&db).verify_week("office", week).is_err());
        }
    }

    #[test]
    fn test_latest_started_week() {
        let mut season = BTreeMap::new();
        season.insert(1, vec![final_game("a", "KC", "LV", 1, 0)]);
        season.insert(2, vec![GameRecord::new("b", "KC", "DEN")]);
        assert_eq!(latest_started_week(&season), 1);
        assert_eq!(latest_started_week(&BTreeMap::new()), 0);
    }
}
