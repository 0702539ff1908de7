//! Document path layout.
//!
//! ```text
//! pools/{pool}
//! pools/{pool}/weeks/{week}/confidence/{user}
//! pools/{pool}/weeks/{week}/survivor/{user}
//! pools/{pool}/weeks/{week}/scores/{user}
//! pools/{pool}/survivor_status/{user}
//! pools/{pool}/overrides/{id}
//! pools/{pool}/audit/{run_id}
//! seasons/{season}/weeks/{week}/games/{game}
//! ```

use anyhow::{bail, Result};

use crate::domain::{Season, Week};
use crate::errors::PoolError;

pub const POOLS: &str = "pools";
pub const CONFIDENCE: &str = "confidence";
pub const SURVIVOR: &str = "survivor";
pub const SCORES: &str = "scores";
pub const GAMES: &str = "games";

/// Reject ids that would break the path layout
pub fn validate_id(id: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(PoolError::InvalidInput("Identifier must not be empty".to_string()).into());
    }
    if id.contains('/') {
        return Err(PoolError::InvalidInput(format!("Identifier must not contain '/': {}", id)).into());
    }
    Ok(())
}

/// Collection part and document id of a document path
pub fn split_path(path: &str) -> Result<(&str, &str)> {
    let segments: Vec<&str> = path.split('/').collect();
    if segments.len() % 2 != 0 || segments.iter().any(|s| s.is_empty()) {
        bail!("Not a document path: {}", path);
    }
    match path.rsplit_once('/') {
        Some(parts) => Ok(parts),
        None => bail!("Not a document path: {}", path),
    }
}

pub fn pool(pool_id: &str) -> String {
    format!("{}/{}", POOLS, pool_id)
}

pub fn pool_weeks_prefix(pool_id: &str) -> String {
    format!("{}/weeks/", pool(pool_id))
}

fn pool_week_collection(pool_id: &str, week: Week, kind: &str) -> String {
    format!("{}{}/{}", pool_weeks_prefix(pool_id), week, kind)
}

pub fn confidence_sheets(pool_id: &str, week: Week) -> String {
    pool_week_collection(pool_id, week, CONFIDENCE)
}

pub fn confidence_sheet(pool_id: &str, week: Week, user_id: &str) -> String {
    format!("{}/{}", confidence_sheets(pool_id, week), user_id)
}

pub fn survivor_picks(pool_id: &str, week: Week) -> String {
    pool_week_collection(pool_id, week, SURVIVOR)
}

pub fn survivor_pick(pool_id: &str, week: Week, user_id: &str) -> String {
    format!("{}/{}", survivor_picks(pool_id, week), user_id)
}

pub fn week_scores(pool_id: &str, week: Week) -> String {
    pool_week_collection(pool_id, week, SCORES)
}

pub fn week_score(pool_id: &str, week: Week, user_id: &str) -> String {
    format!("{}/{}", week_scores(pool_id, week), user_id)
}

pub fn survivor_statuses(pool_id: &str) -> String {
    format!("{}/survivor_status", pool(pool_id))
}

pub fn survivor_status(pool_id: &str, user_id: &str) -> String {
    format!("{}/{}", survivor_statuses(pool_id), user_id)
}

pub fn overrides(pool_id: &str) -> String {
    format!("{}/overrides", pool(pool_id))
}

pub fn audit_records(pool_id: &str) -> String {
    format!("{}/audit", pool(pool_id))
}

pub fn season_weeks_prefix(season: Season) -> String {
    format!("seasons/{}/weeks/", season)
}

pub fn games(season: Season, week: Week) -> String {
    format!("{}{}/{}", season_weeks_prefix(season), week, GAMES)
}

pub fn game(season: Season, week: Week, game_id: &str) -> String {
    format!("{}/{}", games(season, week), game_id)
}

/// Split the tail of a `.../weeks/{week}/{kind}/{id}` path found under `prefix`
pub fn parse_week_path<'a>(prefix: &str, path: &'a str) -> Option<(Week, &'a str, &'a str)> {
    let rest = path.strip_prefix(prefix)?;
    let mut parts = rest.splitn(3, '/');
    let week = parts.next()?.parse().ok()?;
    let kind = parts.next()?;
    let id = parts.next()?;
    if id.contains('/') {
        return None;
    }
    Some((week, kind, id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_builders() {
        assert_eq!(confidence_sheet("p1", 3, "u1"), "pools/p1/weeks/3/confidence/u1");
        assert_eq!(survivor_status("p1", "u1"), "pools/p1/survivor_status/u1");
        assert_eq!(game(2025, 7, "kc-at-lv"), "seasons/2025/weeks/7/games/kc-at-lv");
    }

    #[test]
    fn test_split_path() {
        assert_eq!(split_path("pools/p1").unwrap(), ("pools", "p1"));
        assert_eq!(
            split_path("pools/p1/weeks/3/scores/u1").unwrap(),
            ("pools/p1/weeks/3/scores", "u1")
        );
        assert!(split_path("pools").is_err());
        assert!(split_path("pools/p1/weeks").is_err());
        assert!(split_path("pools//x/y").is_err());
    }

    #[test]
    fn test_parse_week_path() {
        let prefix = pool_weeks_prefix("p1");
        assert_eq!(
            parse_week_path(&prefix, "pools/p1/weeks/12/survivor/u9"),
            Some((12, "survivor", "u9"))
        );
        assert_eq!(parse_week_path(&prefix, "pools/p1/overrides/x"), None);
        assert_eq!(parse_week_path(&prefix, "pools/p1/weeks/x/survivor/u9"), None);
    }

    #[test]
    fn test_validate_id() {
        assert!(validate_id("user-1").is_ok());
        assert!(validate_id("").is_err());
        assert!(validate_id("a/b").is_err());
    }
}
