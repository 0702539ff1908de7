//! ESPN NFL scoreboard wire format and its mapping onto fetched games.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use log::warn;
use serde::Deserialize;
use serde_json::Value;

use crate::domain::{GameStatus, Season, Week};
use crate::normalize::teams_match;

/// ESPN `season.type`: 1 preseason, 2 regular season, 3 postseason
pub const REGULAR_SEASON: u8 = 2;

#[derive(Debug, Deserialize, Default)]
struct ScoreboardResponse {
    season: Option<EspnSeason>,
    week: Option<EspnWeek>,
    events: Option<Vec<EspnEvent>>,
}

#[derive(Debug, Deserialize)]
struct EspnSeason {
    year: Option<Season>,
    #[serde(rename = "type")]
    season_type: Option<u8>,
}

#[derive(Debug, Deserialize)]
struct EspnWeek {
    number: Option<Week>,
}

#[derive(Debug, Deserialize)]
struct EspnEvent {
    id: Option<String>,
    date: Option<String>,
    status: Option<EspnStatus>,
    competitions: Option<Vec<EspnCompetition>>,
}

#[derive(Debug, Deserialize)]
struct EspnStatus {
    #[serde(rename = "type")]
    status_type: Option<EspnStatusType>,
}

#[derive(Debug, Deserialize)]
struct EspnStatusType {
    name: Option<String>, // "STATUS_SCHEDULED", "STATUS_IN_PROGRESS", "STATUS_FINAL"
    completed: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct EspnCompetition {
    competitors: Option<Vec<EspnCompetitor>>,
    status: Option<EspnStatus>,
}

#[derive(Debug, Deserialize)]
struct EspnCompetitor {
    #[serde(rename = "homeAway")]
    home_away: Option<String>,
    team: Option<EspnTeam>,
    score: Option<String>, // ESPN sends scores as strings
}

#[derive(Debug, Deserialize)]
struct EspnTeam {
    abbreviation: Option<String>,
    #[serde(rename = "displayName")]
    display_name: Option<String>,
}

/// One game as reported by ESPN
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedGame {
    pub espn_id: String,
    pub home_team: String,
    pub home_abbreviation: String,
    pub away_team: String,
    pub away_abbreviation: String,
    pub home_score: Option<u32>,
    pub away_score: Option<u32>,
    pub status: GameStatus,
    pub kickoff: Option<DateTime<Utc>>,
}

impl FetchedGame {
    pub fn is_home(&self, team: &str) -> bool {
        teams_match(team, &self.home_abbreviation) || teams_match(team, &self.home_team)
    }

    pub fn is_away(&self, team: &str) -> bool {
        teams_match(team, &self.away_abbreviation) || teams_match(team, &self.away_team)
    }

    pub fn label(&self) -> String {
        format!("{} @ {}", self.away_team, self.home_team)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Scoreboard {
    pub season: Option<Season>,
    pub season_type: Option<u8>,
    pub week: Option<Week>,
    pub games: Vec<FetchedGame>,
}

impl Scoreboard {
    /// Boards without a season type are taken as regular season
    pub fn is_regular_season(&self) -> bool {
        self.season_type.is_none_or(|t| t == REGULAR_SEASON)
    }
}

pub fn parse_scoreboard(data: Value) -> Result<Scoreboard> {
    let response: ScoreboardResponse =
        serde_json::from_value(data).context("Failed to map JSON to scoreboard response")?;

    let games = response
        .events
        .unwrap_or_default()
        .into_iter()
        .filter_map(|event| {
            let id = event.id.clone().unwrap_or_default();
            let game = map_event(event);
            if game.is_none() {
                warn!("Skipping ESPN event {:?}: missing competitors", id);
            }
            game
        })
        .collect();

    let (season, season_type) = match response.season {
        Some(s) => (s.year, s.season_type),
        None => (None, None),
    };

    Ok(Scoreboard {
        season,
        season_type,
        week: response.week.and_then(|w| w.number),
        games,
    })
}

fn map_event(event: EspnEvent) -> Option<FetchedGame> {
    let competition = event.competitions?.into_iter().next()?;
    let competitors = competition.competitors?;

    let home = competitors.iter().find(|c| c.home_away.as_deref() == Some("home"))?;
    let away = competitors.iter().find(|c| c.home_away.as_deref() == Some("away"))?;

    let status = competition
        .status
        .as_ref()
        .or(event.status.as_ref())
        .map(map_status)
        .unwrap_or_default();

    Some(FetchedGame {
        espn_id: event.id.unwrap_or_default(),
        home_team: team_name(home),
        home_abbreviation: team_abbreviation(home),
        away_team: team_name(away),
        away_abbreviation: team_abbreviation(away),
        home_score: parse_score(home),
        away_score: parse_score(away),
        status,
        kickoff: event.date.as_deref().and_then(parse_kickoff),
    })
}

fn team_name(competitor: &EspnCompetitor) -> String {
    competitor
        .team
        .as_ref()
        .and_then(|t| t.display_name.clone())
        .unwrap_or_default()
}

fn team_abbreviation(competitor: &EspnCompetitor) -> String {
    competitor
        .team
        .as_ref()
        .and_then(|t| t.abbreviation.clone())
        .unwrap_or_default()
}

fn parse_score(competitor: &EspnCompetitor) -> Option<u32> {
    competitor.score.as_deref()?.trim().parse().ok()
}

fn map_status(status: &EspnStatus) -> GameStatus {
    let Some(status_type) = &status.status_type else {
        return GameStatus::Scheduled;
    };
    if status_type.completed == Some(true) {
        return GameStatus::Final;
    }
    parse_status(status_type.name.as_deref().unwrap_or_default())
}

pub fn parse_status(name: &str) -> GameStatus {
    match name {
        s if s.starts_with("STATUS_FINAL") => GameStatus::Final,
        "STATUS_IN_PROGRESS" | "STATUS_HALFTIME" | "STATUS_END_PERIOD" => GameStatus::InProgress,
        _ => GameStatus::Scheduled,
    }
}

/// ESPN dates come as "2025-09-07T17:00Z" (no seconds) or full RFC 3339
fn parse_kickoff(date: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(date) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(date, "%Y-%m-%dT%H:%MZ")
        .ok()
        .map(|dt| dt.and_utc())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    pub(crate) fn event(id: &str, home: (&str, &str, &str), away: (&str, &str, &str), status: &str, completed: bool) -> Value {
        json!({
            "id": id,
            "date": "2025-09-07T17:00Z",
            "status": {"type": {"name": status, "completed": completed}},
            "competitions": [{
                "competitors": [
                    {"homeAway": "home", "score": home.2, "team": {"abbreviation": home.0, "displayName": home.1}},
                    {"homeAway": "away", "score": away.2, "team": {"abbreviation": away.0, "displayName": away.1}}
                ]
            }]
        })
    }

    #[test]
    fn test_parse_scoreboard() {
        let data = json!({
            "season": {"year": 2025, "type": 2},
            "week": {"number": 1},
            "events": [
                event("1", ("KC", "Kansas City Chiefs", "27"), ("BAL", "Baltimore Ravens", "20"), "STATUS_FINAL", true),
                event("2", ("PHI", "Philadelphia Eagles", "7"), ("DAL", "Dallas Cowboys", "3"), "STATUS_IN_PROGRESS", false),
                {"id": "3", "competitions": []}
            ]
        });

        let board = parse_scoreboard(data).unwrap();
        assert_eq!(board.season, Some(2025));
        assert_eq!(board.season_type, Some(REGULAR_SEASON));
        assert!(board.is_regular_season());
        assert_eq!(board.week, Some(1));
        assert_eq!(board.games.len(), 2);

        let first = &board.games[0];
        assert_eq!(first.status, GameStatus::Final);
        assert_eq!((first.home_score, first.away_score), (Some(27), Some(20)));
        assert_eq!(first.kickoff.unwrap().to_rfc3339(), "2025-09-07T17:00:00+00:00");
        assert!(first.is_home("Chiefs"));
        assert!(first.is_away("Ravens"));
        assert_eq!(board.games[1].status, GameStatus::InProgress);
    }

    #[test]
    fn test_parse_status() {
        assert_eq!(parse_status("STATUS_FINAL"), GameStatus::Final);
        assert_eq!(parse_status("STATUS_FINAL_OVERTIME"), GameStatus::Final);
        assert_eq!(parse_status("STATUS_HALFTIME"), GameStatus::InProgress);
        assert_eq!(parse_status("STATUS_SCHEDULED"), GameStatus::Scheduled);
        assert_eq!(parse_status("STATUS_POSTPONED"), GameStatus::Scheduled);
    }

    #[test]
    fn test_unparsable_scores_are_absent() {
        let data = json!({"events": [event("1", ("KC", "Kansas City Chiefs", ""), ("LV", "Las Vegas Raiders", "x"), "STATUS_SCHEDULED", false)]});
        let board = parse_scoreboard(data).unwrap();
        assert_eq!(board.games[0].home_score, None);
        assert_eq!(board.games[0].away_score, None);
        assert_eq!(board.season, None);
        assert!(board.is_regular_season());
    }

    #[test]
    fn test_postseason_board_is_not_regular_season() {
        let data = json!({"season": {"year": 2025, "type": 3}, "week": {"number": 1}, "events": []});
        let board = parse_scoreboard(data).unwrap();
        assert_eq!(board.season_type, Some(3));
        assert!(!board.is_regular_season());
    }
}
