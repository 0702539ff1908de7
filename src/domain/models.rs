use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::normalize::{normalize_team_name, teams_match};

pub type PoolId = String;
pub type UserId = String;
pub type GameId = String;
pub type Season = i32;
pub type Week = u32;

/// Highest week accepted: 18 regular season weeks plus the playoffs
pub const MAX_WEEK: Week = 22;

/// A pool entrant and the games they take part in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub display_name: String,
    #[serde(default = "enabled")]
    pub confidence_enabled: bool,
    #[serde(default = "enabled")]
    pub survivor_enabled: bool,
}

fn enabled() -> bool {
    true
}

/// One competition instance, created once per season
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pool {
    pub name: String,
    pub season: Season,
    #[serde(default)]
    pub members: BTreeMap<UserId, Member>,
    pub created_at: DateTime<Utc>,
}

impl Pool {
    pub fn new(name: &str, season: Season) -> Self {
        Self {
            name: name.to_string(),
            season,
            members: BTreeMap::new(),
            created_at: Utc::now(),
        }
    }

    pub fn confidence_members(&self) -> impl Iterator<Item = (&UserId, &Member)> {
        self.members.iter().filter(|(_, m)| m.confidence_enabled)
    }

    pub fn survivor_members(&self) -> impl Iterator<Item = (&UserId, &Member)> {
        self.members.iter().filter(|(_, m)| m.survivor_enabled)
    }

    pub fn display_name(&self, user_id: &str) -> String {
        self.members
            .get(user_id)
            .map(|m| m.display_name.clone())
            .unwrap_or_else(|| user_id.to_string())
    }
}

/// A single confidence pick as stored.
///
/// `confidence` is kept as raw JSON: older clients wrote numbers, strings
/// and nulls, and scoring coerces whatever it finds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidencePick {
    pub team: String,
    #[serde(default)]
    pub confidence: serde_json::Value,
}

/// A user's confidence picks for one week, keyed by game id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfidencePickSheet {
    #[serde(default)]
    pub picks: BTreeMap<GameId, ConfidencePick>,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurvivorPick {
    pub team: String,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    #[default]
    Scheduled,
    InProgress,
    Final,
}

impl GameStatus {
    pub fn as_str(&self) -> &str {
        match self {
            GameStatus::Scheduled => "scheduled",
            GameStatus::InProgress => "in_progress",
            GameStatus::Final => "final",
        }
    }
}

/// Result of a game from a scorer's point of view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameOutcome {
    Pending,
    Tie,
    Winner(String),
}

/// A scheduled game. Created by schedule import, updated by ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    pub id: GameId,
    pub home_team: String,
    pub away_team: String,
    #[serde(default)]
    pub home_score: Option<u32>,
    #[serde(default)]
    pub away_score: Option<u32>,
    #[serde(default)]
    pub status: GameStatus,
    #[serde(default)]
    pub winner: Option<String>,
    #[serde(default)]
    pub espn_id: Option<String>,
    #[serde(default)]
    pub kickoff: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl GameRecord {
    pub fn new(id: &str, home_team: &str, away_team: &str) -> Self {
        Self {
            id: id.to_string(),
            home_team: home_team.to_string(),
            away_team: away_team.to_string(),
            home_score: None,
            away_score: None,
            status: GameStatus::Scheduled,
            winner: None,
            espn_id: None,
            kickoff: None,
            updated_at: None,
        }
    }

    pub fn is_final(&self) -> bool {
        self.status == GameStatus::Final
    }

    pub fn involves(&self, team: &str) -> bool {
        teams_match(team, &self.home_team) || teams_match(team, &self.away_team)
    }

    pub fn opponent_of(&self, team: &str) -> Option<&str> {
        if teams_match(team, &self.home_team) {
            Some(&self.away_team)
        } else if teams_match(team, &self.away_team) {
            Some(&self.home_team)
        } else {
            None
        }
    }

    /// Winner implied by the scores, `None` for ties or missing scores
    pub fn derive_winner(&self) -> Option<String> {
        match (self.home_score, self.away_score) {
            (Some(home), Some(away)) if home > away => Some(self.home_team.clone()),
            (Some(home), Some(away)) if away > home => Some(self.away_team.clone()),
            _ => None,
        }
    }

    pub fn outcome(&self) -> GameOutcome {
        if !self.is_final() {
            return GameOutcome::Pending;
        }
        match (self.home_score, self.away_score) {
            (Some(home), Some(away)) if home == away => GameOutcome::Tie,
            (Some(_), Some(_)) => self
                .derive_winner()
                .map(GameOutcome::Winner)
                .unwrap_or(GameOutcome::Tie),
            _ => match &self.winner {
                Some(winner) => GameOutcome::Winner(winner.clone()),
                None => GameOutcome::Pending,
            },
        }
    }

    /// "24-17" from the perspective of `team`
    pub fn score_line_for(&self, team: &str) -> Option<String> {
        let (home, away) = (self.home_score?, self.away_score?);
        if teams_match(team, &self.home_team) {
            Some(format!("{}-{}", home, away))
        } else if teams_match(team, &self.away_team) {
            Some(format!("{}-{}", away, home))
        } else {
            None
        }
    }
}

/// A game entry in a schedule import
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledGame {
    #[serde(default)]
    pub id: Option<GameId>,
    pub home_team: String,
    pub away_team: String,
    #[serde(default)]
    pub kickoff: Option<DateTime<Utc>>,
}

impl ScheduledGame {
    /// Stable id derived from the matchup when the import omits one
    pub fn game_id(&self) -> GameId {
        self.id.clone().unwrap_or_else(|| {
            format!(
                "{}-at-{}",
                normalize_team_name(&self.away_team).to_lowercase().replace(' ', "-"),
                normalize_team_name(&self.home_team).to_lowercase().replace(' ', "-")
            )
        })
    }

    pub fn into_record(self) -> GameRecord {
        let mut record = GameRecord::new(&self.game_id(), &self.home_team, &self.away_team);
        record.kickoff = self.kickoff;
        record
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideAction {
    Reinstate,
    Eliminate,
}

/// Manual survivor decision recorded by an admin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurvivorOverride {
    pub user_id: UserId,
    pub action: OverrideAction,
    pub week: Week,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringTrigger {
    Admin,
    Ingestion,
    Cli,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditStep {
    pub at: DateTime<Utc>,
    pub message: String,
}

/// Append-only trace of one scoring run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub run_id: String,
    pub pool_id: PoolId,
    pub week: Week,
    pub trigger: ScoringTrigger,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub steps: Vec<AuditStep>,
}

impl AuditRecord {
    pub fn start(pool_id: &str, week: Week, trigger: ScoringTrigger) -> Self {
        let started_at = Utc::now();
        Self {
            run_id: format!("{}-w{}", started_at.format("%Y%m%d%H%M%S%6f"), week),
            pool_id: pool_id.to_string(),
            week,
            trigger,
            started_at,
            finished_at: None,
            steps: Vec::new(),
        }
    }

    pub fn step(&mut self, message: impl Into<String>) {
        self.steps.push(AuditStep {
            at: Utc::now(),
            message: message.into(),
        });
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }
}
