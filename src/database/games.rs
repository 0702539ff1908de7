use std::collections::BTreeMap;

use anyhow::Result;
use rusqlite::Connection;

use super::documents;
use super::paths;
use crate::domain::{GameRecord, Season, Week};

pub fn get_game(conn: &Connection, season: Season, week: Week, game_id: &str) -> Result<Option<GameRecord>> {
    documents::get_document(conn, &paths::game(season, week, game_id))
}

pub fn save_game(conn: &Connection, season: Season, week: Week, game: &GameRecord) -> Result<()> {
    paths::validate_id(&game.id)?;
    documents::set_document(conn, &paths::game(season, week, &game.id), game)
}

pub fn list_week_games(conn: &Connection, season: Season, week: Week) -> Result<Vec<GameRecord>> {
    let docs = documents::list_collection(conn, &paths::games(season, week))?;
    Ok(docs.into_iter().map(|d| d.data).collect())
}

/// All stored games of a season grouped by week
pub fn list_season_games(conn: &Connection, season: Season) -> Result<BTreeMap<Week, Vec<GameRecord>>> {
    let prefix = paths::season_weeks_prefix(season);
    let mut by_week: BTreeMap<Week, Vec<GameRecord>> = BTreeMap::new();

    for (path, json) in documents::list_raw_by_prefix(conn, &prefix)? {
        if let Some((week, paths::GAMES, _)) = paths::parse_week_path(&prefix, &path) {
            by_week.entry(week).or_default().push(documents::decode(&path, &json)?);
        }
    }

    Ok(by_week)
}
