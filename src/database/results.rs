use std::collections::BTreeMap;

use anyhow::Result;
use rusqlite::Connection;

use super::documents;
use super::paths;
use crate::domain::{UserId, Week};
use crate::scoring::{SurvivorStatus, WeekScore};

pub fn save_week_score(conn: &Connection, pool_id: &str, score: &WeekScore) -> Result<()> {
    documents::set_document(conn, &paths::week_score(pool_id, score.week, &score.user_id), score)
}

pub fn list_week_scores(conn: &Connection, pool_id: &str, week: Week) -> Result<BTreeMap<UserId, WeekScore>> {
    let docs = documents::list_collection(conn, &paths::week_scores(pool_id, week))?;
    Ok(docs.into_iter().map(|d| (d.id, d.data)).collect())
}

/// Every stored week score of a pool
pub fn list_all_week_scores(conn: &Connection, pool_id: &str) -> Result<Vec<WeekScore>> {
    let prefix = paths::pool_weeks_prefix(pool_id);
    let mut scores = Vec::new();

    for (path, json) in documents::list_raw_by_prefix(conn, &prefix)? {
        if let Some((_, paths::SCORES, _)) = paths::parse_week_path(&prefix, &path) {
            scores.push(documents::decode::<WeekScore>(&path, &json)?);
        }
    }

    scores.sort_by(|a, b| a.week.cmp(&b.week).then_with(|| a.user_id.cmp(&b.user_id)));
    Ok(scores)
}

pub fn get_survivor_status(conn: &Connection, pool_id: &str, user_id: &str) -> Result<Option<SurvivorStatus>> {
    documents::get_document(conn, &paths::survivor_status(pool_id, user_id))
}

pub fn save_survivor_status(conn: &Connection, pool_id: &str, status: &SurvivorStatus) -> Result<()> {
    documents::set_document(conn, &paths::survivor_status(pool_id, &status.user_id), status)
}

pub fn list_survivor_statuses(conn: &Connection, pool_id: &str) -> Result<BTreeMap<UserId, SurvivorStatus>> {
    let docs = documents::list_collection(conn, &paths::survivor_statuses(pool_id))?;
    Ok(docs.into_iter().map(|d| (d.id, d.data)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_support::memory_conn;
    use crate::scoring::PickOutcome;

    #[test]
    fn test_week_scores_sorted_numerically() {
        let conn = memory_conn();
        for (user, week) in [("bob", 10), ("ann", 2), ("ann", 10)] {
            let mut score = WeekScore::new(user, week);
            score.record("g1", PickOutcome::Correct(week));
            save_week_score(&conn, "p1", &score).unwrap();
        }

        let all = list_all_week_scores(&conn, "p1").unwrap();
        let order: Vec<_> = all.iter().map(|s| (s.week, s.user_id.as_str())).collect();
        assert_eq!(order, vec![(2, "ann"), (10, "ann"), (10, "bob")]);
        assert_eq!(list_week_scores(&conn, "p1", 10).unwrap().len(), 2);
    }

    #[test]
    fn test_survivor_status_round_trip() {
        let conn = memory_conn();
        let status = SurvivorStatus::alive("ann");
        save_survivor_status(&conn, "p1", &status).unwrap();
        assert_eq!(get_survivor_status(&conn, "p1", "ann").unwrap(), Some(status));
        assert_eq!(list_survivor_statuses(&conn, "p1").unwrap().len(), 1);
    }
}
