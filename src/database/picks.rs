use std::collections::BTreeMap;

use anyhow::Result;
use rusqlite::Connection;

use super::documents;
use super::paths;
use crate::domain::{ConfidencePickSheet, SurvivorPick, UserId, Week};

pub fn save_confidence_sheet(
    conn: &Connection,
    pool_id: &str,
    week: Week,
    user_id: &str,
    sheet: &ConfidencePickSheet,
) -> Result<()> {
    paths::validate_id(user_id)?;
    documents::set_document(conn, &paths::confidence_sheet(pool_id, week, user_id), sheet)
}

/// Confidence sheets for one week keyed by user
pub fn list_confidence_sheets(
    conn: &Connection,
    pool_id: &str,
    week: Week,
) -> Result<BTreeMap<UserId, ConfidencePickSheet>> {
    let docs = documents::list_collection(conn, &paths::confidence_sheets(pool_id, week))?;
    Ok(docs.into_iter().map(|d| (d.id, d.data)).collect())
}

pub fn get_survivor_pick(conn: &Connection, pool_id: &str, week: Week, user_id: &str) -> Result<Option<SurvivorPick>> {
    documents::get_document(conn, &paths::survivor_pick(pool_id, week, user_id))
}

pub fn save_survivor_pick(conn: &Connection, pool_id: &str, week: Week, user_id: &str, pick: &SurvivorPick) -> Result<()> {
    paths::validate_id(user_id)?;
    documents::set_document(conn, &paths::survivor_pick(pool_id, week, user_id), pick)
}

/// Every week's picks of one kind, grouped by week then user
fn list_week_documents<T: serde::de::DeserializeOwned>(
    conn: &Connection,
    pool_id: &str,
    kind: &str,
) -> Result<BTreeMap<Week, BTreeMap<UserId, T>>> {
    let prefix = paths::pool_weeks_prefix(pool_id);
    let mut grouped: BTreeMap<Week, BTreeMap<UserId, T>> = BTreeMap::new();

    for (path, json) in documents::list_raw_by_prefix(conn, &prefix)? {
        match paths::parse_week_path(&prefix, &path) {
            Some((week, k, user_id)) if k == kind => {
                grouped
                    .entry(week)
                    .or_default()
                    .insert(user_id.to_string(), documents::decode(&path, &json)?);
            }
            _ => continue,
        }
    }

    Ok(grouped)
}

pub fn list_all_confidence_sheets(
    conn: &Connection,
    pool_id: &str,
) -> Result<BTreeMap<Week, BTreeMap<UserId, ConfidencePickSheet>>> {
    list_week_documents(conn, pool_id, paths::CONFIDENCE)
}

/// Survivor picks per user, keyed by week
pub fn survivor_picks_by_user(conn: &Connection, pool_id: &str) -> Result<BTreeMap<UserId, BTreeMap<Week, String>>> {
    let by_week: BTreeMap<Week, BTreeMap<UserId, SurvivorPick>> =
        list_week_documents(conn, pool_id, paths::SURVIVOR)?;

    let mut by_user: BTreeMap<UserId, BTreeMap<Week, String>> = BTreeMap::new();
    for (week, picks) in by_week {
        for (user_id, pick) in picks {
            by_user.entry(user_id).or_default().insert(week, pick.team);
        }
    }
    Ok(by_user)
}
