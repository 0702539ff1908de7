use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use log::{info, warn};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::database::{self, games, picks, pools, records, results, DbPool};
use crate::domain::{
    ConfidencePickSheet, GameRecord, Member, OverrideAction, Pool, ScheduledGame, Season, SurvivorOverride,
    SurvivorPick, Week,
};
use crate::errors::{check_week, PoolError};
use crate::normalize::{is_known_team, normalize_team_name, teams_match};

#[derive(Debug, Clone, Deserialize)]
pub struct NewPool {
    pub id: String,
    pub name: String,
    pub season: Season,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OverrideRequest {
    pub action: OverrideAction,
    pub week: Week,
    pub reason: String,
}

/// A survivor pick that was stored, with anything odd about it
#[derive(Debug, Clone, Serialize)]
pub struct SurvivorSubmission {
    pub week: Week,
    pub team: String,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScheduleImport {
    pub season: Season,
    pub week: Week,
    pub created: usize,
    pub updated: usize,
}

/// Pool membership, pick submission and schedule management
#[derive(Clone)]
pub struct PoolService {
    db: DbPool,
}

impl PoolService {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    pub fn create_pool(&self, request: &NewPool) -> Result<Pool> {
        let mut conn = database::get_connection(&self.db)?;
        let pool = Pool::new(&request.name, request.season);
        database::run_transaction(&mut conn, |tx| pools::create_pool(tx, &request.id, &pool))?;
        info!("Created pool {} ({}) for season {}", request.id, request.name, request.season);
        Ok(pool)
    }

    pub fn upsert_member(&self, pool_id: &str, user_id: &str, member: Member) -> Result<Pool> {
        let mut conn = database::get_connection(&self.db)?;
        let pool = database::run_transaction(&mut conn, |tx| pools::upsert_member(tx, pool_id, user_id, member))?;
        info!("Pool {}: member {} saved", pool_id, user_id);
        Ok(pool)
    }

    pub fn remove_member(&self, pool_id: &str, user_id: &str) -> Result<()> {
        let mut conn = database::get_connection(&self.db)?;
        if !database::run_transaction(&mut conn, |tx| pools::remove_member(tx, pool_id, user_id))? {
            return Err(PoolError::NotFound(format!("Member {} of pool {}", user_id, pool_id)).into());
        }
        info!("Pool {}: member {} removed", pool_id, user_id);
        Ok(())
    }

    /// Store a user's confidence sheet for a week, replacing any earlier one.
    /// Malformed confidence values are kept as sent and flagged at scoring.
    pub fn submit_confidence_picks(
        &self,
        pool_id: &str,
        week: Week,
        user_id: &str,
        mut sheet: ConfidencePickSheet,
    ) -> Result<ConfidencePickSheet> {
        check_week(week)?;
        let mut conn = database::get_connection(&self.db)?;
        sheet.submitted_at = Some(Utc::now());

        database::run_transaction(&mut conn, |tx| {
            let pool = pools::require_pool(tx, pool_id)?;
            require_member(&pool, pool_id, user_id, |m| m.confidence_enabled, "confidence")?;
            picks::save_confidence_sheet(tx, pool_id, week, user_id, &sheet)
        })?;

        info!(
            "Pool {} week {}: {} submitted {} confidence picks",
            pool_id,
            week,
            user_id,
            sheet.picks.len()
        );
        Ok(sheet)
    }

    /// Store a survivor pick. Questionable picks are accepted with warnings;
    /// scoring decides what they mean.
    pub fn submit_survivor_pick(&self, pool_id: &str, week: Week, user_id: &str, team: &str) -> Result<SurvivorSubmission> {
        check_week(week)?;
        if team.trim().is_empty() {
            return Err(PoolError::InvalidInput("Survivor pick needs a team".to_string()).into());
        }
        let mut conn = database::get_connection(&self.db)?;
        let pick = SurvivorPick {
            team: team.trim().to_string(),
            submitted_at: Some(Utc::now()),
        };

        let warnings = database::run_transaction(&mut conn, |tx| {
            let pool = pools::require_pool(tx, pool_id)?;
            require_member(&pool, pool_id, user_id, |m| m.survivor_enabled, "survivor")?;
            let warnings = survivor_warnings(tx, &pool, pool_id, week, user_id, &pick.team)?;
            picks::save_survivor_pick(tx, pool_id, week, user_id, &pick)?;
            Ok(warnings)
        })?;

        for warning in &warnings {
            warn!("Pool {} week {} survivor pick by {}: {}", pool_id, week, user_id, warning);
        }
        Ok(SurvivorSubmission {
            week,
            team: pick.team,
            warnings,
        })
    }

    pub fn record_override(&self, pool_id: &str, user_id: &str, request: OverrideRequest) -> Result<String> {
        check_week(request.week)?;
        let conn = database::get_connection(&self.db)?;
        let pool = pools::require_pool(&conn, pool_id)?;
        require_member(&pool, pool_id, user_id, |m| m.survivor_enabled, "survivor")?;

        let record = SurvivorOverride {
            user_id: user_id.to_string(),
            action: request.action,
            week: request.week,
            reason: request.reason,
            created_at: Utc::now(),
        };
        let id = records::append_override(&conn, pool_id, &record)?;
        info!(
            "Pool {}: {:?} override for {} at week {} ({})",
            pool_id, record.action, user_id, record.week, record.reason
        );
        Ok(id)
    }

    /// Create or refresh a week's games. Existing records keep their scores
    /// and status; only teams and kickoff are taken from the import.
    pub fn import_schedule(&self, season: Season, week: Week, scheduled: Vec<ScheduledGame>) -> Result<ScheduleImport> {
        check_week(week)?;
        let mut conn = database::get_connection(&self.db)?;
        let mut report = ScheduleImport {
            season,
            week,
            created: 0,
            updated: 0,
        };

        database::run_transaction(&mut conn, |tx| {
            for game in scheduled {
                let incoming = game.into_record();
                database::paths::validate_id(&incoming.id)?;
                let record = match games::get_game(tx, season, week, &incoming.id)? {
                    Some(existing) => {
                        report.updated += 1;
                        GameRecord {
                            home_team: incoming.home_team,
                            away_team: incoming.away_team,
                            kickoff: incoming.kickoff.or(existing.kickoff),
                            ..existing
                        }
                    }
                    None => {
                        report.created += 1;
                        incoming
                    }
                };
                games::save_game(tx, season, week, &record)?;
            }
            Ok(())
        })?;

        info!(
            "Imported season {} week {} schedule: {} created, {} updated",
            season, week, report.created, report.updated
        );
        Ok(report)
    }

    pub fn import_schedule_file(&self, season: Season, week: Week, path: &Path) -> Result<ScheduleImport> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read schedule file {}", path.display()))?;
        let scheduled: Vec<ScheduledGame> = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse schedule file {}", path.display()))?;
        self.import_schedule(season, week, scheduled)
    }
}

fn require_member(
    pool: &Pool,
    pool_id: &str,
    user_id: &str,
    plays: impl Fn(&Member) -> bool,
    game: &str,
) -> Result<()> {
    match pool.members.get(user_id) {
        Some(member) if plays(member) => Ok(()),
        Some(_) => Err(PoolError::InvalidInput(format!(
            "{} does not play {} in pool {}",
            user_id, game, pool_id
        ))
        .into()),
        None => Err(PoolError::NotFound(format!("Member {} of pool {}", user_id, pool_id)).into()),
    }
}

fn survivor_warnings(
    conn: &Connection,
    pool: &Pool,
    pool_id: &str,
    week: Week,
    user_id: &str,
    team: &str,
) -> Result<Vec<String>> {
    let mut warnings = Vec::new();

    if !is_known_team(team) {
        warnings.push(format!("{} is not a recognised team name", team));
    }

    let earlier = picks::survivor_picks_by_user(conn, pool_id)?
        .remove(user_id)
        .unwrap_or_default();
    if let Some((used_week, _)) = earlier
        .iter()
        .find(|(w, t)| **w < week && teams_match(t, team))
    {
        warnings.push(format!(
            "{} was already picked in week {}",
            normalize_team_name(team),
            used_week
        ));
    }

    if let Some(status) = results::get_survivor_status(conn, pool_id, user_id)? {
        if !status.alive {
            let since = status.eliminated_week.map(|w| format!(" in week {}", w)).unwrap_or_default();
            warnings.push(format!("{} was eliminated{}", user_id, since));
        }
    }

    let week_games = games::list_week_games(conn, pool.season, week)?;
    if !week_games.is_empty() && !week_games.iter().any(|g| g.involves(team)) {
        warnings.push(format!("{} has no game in week {}", team, week));
    }

    Ok(warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::scoring::tests::{final_game, memory_db, seeded_db};
    use crate::domain::ConfidencePick;
    use serde_json::json;

    fn scheduled(home: &str, away: &str) -> ScheduledGame {
        ScheduledGame {
            id: None,
            home_team: home.to_string(),
            away_team: away.to_string(),
            kickoff: None,
        }
    }

    #[test]
    fn test_create_pool_and_members() {
        let service = PoolService::new(memory_db());
        let request = NewPool {
            id: "family".to_string(),
            name: "Family".to_string(),
            season: 2025,
        };
        service.create_pool(&request).unwrap();
        let err = service.create_pool(&request).unwrap_err();
        assert!(matches!(crate::errors::find_pool_error(&err), Some(PoolError::AlreadyExists(_))));

        let member = Member {
            display_name: "Cy".to_string(),
            confidence_enabled: true,
            survivor_enabled: false,
        };
        let pool = service.upsert_member("family", "cy", member).unwrap();
        assert_eq!(pool.members.len(), 1);

        let err = service
            .submit_survivor_pick("family", 1, "cy", "KC")
            .unwrap_err();
        assert!(matches!(crate::errors::find_pool_error(&err), Some(PoolError::InvalidInput(_))));

        service.remove_member("family", "cy").unwrap();
        assert!(service.remove_member("family", "cy").is_err());
    }

    #[test]
    fn test_concurrent_member_edits_are_all_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pools.db");
        let db = database::create_pool(&path.to_string_lossy()).unwrap();
        crate::database::setup::initialize_schema(&*database::get_connection(&db).unwrap()).unwrap();

        let service = PoolService::new(db.clone());
        service
            .create_pool(&NewPool {
                id: "league".to_string(),
                name: "League".to_string(),
                season: 2025,
            })
            .unwrap();

        std::thread::scope(|scope| {
            for i in 0..8 {
                let service = service.clone();
                scope.spawn(move || {
                    let member = Member {
                        display_name: format!("Player {}", i),
                        confidence_enabled: true,
                        survivor_enabled: true,
                    };
                    service.upsert_member("league", &format!("p{}", i), member).unwrap();
                });
            }
        });

        let conn = database::get_connection(&db).unwrap();
        assert_eq!(pools::require_pool(&conn, "league").unwrap().members.len(), 8);
    }

    #[test]
    fn test_confidence_submission_requires_membership() {
        let service = PoolService::new(seeded_db());
        let mut sheet = ConfidencePickSheet::default();
        sheet.picks.insert(
            "lv-at-kc".to_string(),
            ConfidencePick {
                team: "KC".to_string(),
                confidence: json!("abc"),
            },
        );

        let stored = service.submit_confidence_picks("office", 2, "ann", sheet.clone()).unwrap();
        assert!(stored.submitted_at.is_some());
        assert!(service.submit_confidence_picks("office", 2, "zed", sheet).is_err());
    }

    #[test]
    fn test_survivor_submission_warns_but_stores() {
        let db = seeded_db();
        let service = PoolService::new(db.clone());
        {
            let conn = database::get_connection(&db).unwrap();
            games::save_game(&conn, 2025, 2, &final_game("kc-at-den", "DEN", "KC", 0, 0)).unwrap();
        }

        let fine = service.submit_survivor_pick("office", 2, "bob", "Broncos").unwrap();
        assert!(fine.warnings.is_empty());

        let repeat = service.submit_survivor_pick("office", 2, "ann", "Chiefs").unwrap();
        assert_eq!(repeat.warnings, vec!["KC was already picked in week 1".to_string()]);

        let odd = service.submit_survivor_pick("office", 2, "ann", "Gotham Rogues").unwrap();
        assert_eq!(odd.warnings.len(), 2);

        let conn = database::get_connection(&db).unwrap();
        let stored = picks::get_survivor_pick(&conn, "office", 2, "ann").unwrap().unwrap();
        assert_eq!(stored.team, "Gotham Rogues");
    }

    #[test]
    fn test_later_pick_of_same_team_is_not_a_repeat() {
        let service = PoolService::new(seeded_db());
        service.submit_survivor_pick("office", 4, "ann", "Broncos").unwrap();

        let earlier = service.submit_survivor_pick("office", 3, "ann", "Denver Broncos").unwrap();
        assert!(earlier.warnings.iter().all(|w| !w.contains("already picked")));

        let later = service.submit_survivor_pick("office", 5, "ann", "DEN").unwrap();
        assert_eq!(later.warnings, vec!["DEN was already picked in week 3".to_string()]);
    }

    #[test]
    fn test_weeks_out_of_range_are_rejected() {
        let service = PoolService::new(seeded_db());
        for week in [0, 23, u32::MAX] {
            let err = service.submit_survivor_pick("office", week, "ann", "KC").unwrap_err();
            assert!(matches!(crate::errors::find_pool_error(&err), Some(PoolError::InvalidInput(_))));
            let err = service
                .submit_confidence_picks("office", week, "ann", ConfidencePickSheet::default())
                .unwrap_err();
            assert!(matches!(crate::errors::find_pool_error(&err), Some(PoolError::InvalidInput(_))));
        }
        assert!(service.import_schedule(2025, 0, vec![scheduled("KC", "BAL")]).is_err());
    }

    #[test]
    fn test_import_schedule_keeps_results() {
        let db = memory_db();
        let service = PoolService::new(db.clone());
        let report = service
            .import_schedule(2025, 3, vec![scheduled("KC", "BAL"), scheduled("Green Bay Packers", "Chicago Bears")])
            .unwrap();
        assert_eq!((report.created, report.updated), (2, 0));

        {
            let conn = database::get_connection(&db).unwrap();
            let mut game = games::get_game(&conn, 2025, 3, "bal-at-kc").unwrap().unwrap();
            game.home_score = Some(20);
            game.away_score = Some(17);
            games::save_game(&conn, 2025, 3, &game).unwrap();
        }

        let report = service.import_schedule(2025, 3, vec![scheduled("KC", "BAL")]).unwrap();
        assert_eq!((report.created, report.updated), (0, 1));

        let conn = database::get_connection(&db).unwrap();
        let games = games::list_week_games(&conn, 2025, 3).unwrap();
        assert_eq!(games.len(), 2);
        let kc = games.iter().find(|g| g.id == "bal-at-kc").unwrap();
        assert_eq!(kc.home_score, Some(20));
    }

    #[test]
    fn test_record_override() {
        let service = PoolService::new(seeded_db());
        let request = OverrideRequest {
            action: OverrideAction::Reinstate,
            week: 1,
            reason: "pick lost in outage".to_string(),
        };
        let id = service.record_override("office", "bob", request).unwrap();
        assert!(id.ends_with("-bob"));
    }
}
