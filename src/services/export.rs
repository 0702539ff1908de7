use std::collections::BTreeMap;
use std::io::Write;

use anyhow::{Context, Result};
use rusqlite::Connection;
use serde::Serialize;

use crate::database::{picks, pools, results};
use crate::domain::{UserId, Week};
use crate::scoring::{PickOutcome, SurvivorStatus, WeekScore};

#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    user: &'a str,
    week: Week,
    pick: &'a str,
    result: &'a str,
    points_or_status: String,
}

/// Write every confidence pick (with points) and every survivor week (with
/// alive/eliminated) of a pool as CSV. Returns the number of rows written.
pub fn export_pool_csv<W: Write>(conn: &Connection, pool_id: &str, writer: W) -> Result<usize> {
    let pool = pools::require_pool(conn, pool_id)?;
    let sheets = picks::list_all_confidence_sheets(conn, pool_id)?;
    let scores: BTreeMap<(Week, UserId), WeekScore> = results::list_all_week_scores(conn, pool_id)?
        .into_iter()
        .map(|s| ((s.week, s.user_id.clone()), s))
        .collect();
    let statuses = results::list_survivor_statuses(conn, pool_id)?;

    let mut csv = csv::Writer::from_writer(writer);
    let mut rows = 0;

    for (week, users) in &sheets {
        for (user_id, sheet) in users.iter().filter(|(u, _)| pool.members.contains_key(*u)) {
            let score = scores.get(&(*week, user_id.clone()));
            for (game_id, pick) in &sheet.picks {
                let outcome = score.and_then(|s| s.outcomes.get(game_id));
                csv.serialize(ExportRow {
                    user: user_id,
                    week: *week,
                    pick: &pick.team,
                    result: outcome.map(PickOutcome::as_str).unwrap_or("unscored"),
                    points_or_status: outcome.map(PickOutcome::points).unwrap_or(0).to_string(),
                })?;
                rows += 1;
            }
        }
    }

    for status in statuses.values().filter(|s| pool.members.contains_key(&s.user_id)) {
        for week in &status.weeks {
            csv.serialize(ExportRow {
                user: &status.user_id,
                week: week.week,
                pick: week.team.as_deref().unwrap_or(""),
                result: week.outcome.as_str(),
                points_or_status: survivor_state(status, week.week).to_string(),
            })?;
            rows += 1;
        }
    }

    csv.flush().context("Failed to flush CSV export")?;
    Ok(rows)
}

pub fn export_pool_csv_string(conn: &Connection, pool_id: &str) -> Result<String> {
    let mut buffer = Vec::new();
    export_pool_csv(conn, pool_id, &mut buffer)?;
    String::from_utf8(buffer).context("CSV export was not valid UTF-8")
}

fn survivor_state(status: &SurvivorStatus, week: Week) -> &'static str {
    match status.eliminated_week {
        Some(out) if week >= out => "eliminated",
        _ => "alive",
    }
}
