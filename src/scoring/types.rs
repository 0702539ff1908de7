use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{GameId, UserId, Week};

/// How a single pick fared
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum PickOutcome {
    /// Pick won; carries the points awarded (always 0 in survivor)
    Correct(u32),
    Incorrect,
    /// Game not final yet, or data missing
    Pending,
    Invalid(String),
}

impl PickOutcome {
    pub fn points(&self) -> u32 {
        match self {
            PickOutcome::Correct(points) => *points,
            _ => 0,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            PickOutcome::Correct(_) => "correct",
            PickOutcome::Incorrect => "incorrect",
            PickOutcome::Pending => "pending",
            PickOutcome::Invalid(_) => "invalid",
        }
    }
}

/// Problems found in a pick sheet. Flagged for admins, never rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PickFlag {
    DuplicateConfidence { value: u32, game_ids: Vec<GameId> },
    ConfidenceOutOfRange { game_id: GameId, value: u32, max: u32 },
    InvalidConfidence { game_id: GameId, raw: String },
}

/// Confidence result for one user and week
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekScore {
    pub user_id: UserId,
    pub week: Week,
    pub points: u32,
    pub correct: u32,
    pub incorrect: u32,
    pub pending: u32,
    pub invalid: u32,
    pub outcomes: BTreeMap<GameId, PickOutcome>,
    #[serde(default)]
    pub flags: Vec<PickFlag>,
}

impl WeekScore {
    pub fn new(user_id: &str, week: Week) -> Self {
        Self {
            user_id: user_id.to_string(),
            week,
            ..Default::default()
        }
    }

    pub fn record(&mut self, game_id: &str, outcome: PickOutcome) {
        match &outcome {
            PickOutcome::Correct(points) => {
                self.correct += 1;
                self.points = self.points.saturating_add(*points);
            }
            PickOutcome::Incorrect => self.incorrect += 1,
            PickOutcome::Pending => self.pending += 1,
            PickOutcome::Invalid(_) => self.invalid += 1,
        }
        self.outcomes.insert(game_id.to_string(), outcome);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonTotal {
    pub user_id: UserId,
    pub points: u32,
    pub correct: u32,
    pub weeks_scored: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EliminationReason {
    Loss {
        team: String,
        opponent: String,
        score: Option<String>,
    },
    Tie {
        team: String,
        opponent: String,
    },
    NoPick,
    /// Pick named a team with no game in a concluded week
    NoValidPick {
        team: String,
    },
    RepeatPick {
        team: String,
        first_week: Week,
    },
    AdminDecision {
        reason: String,
    },
}

impl EliminationReason {
    pub fn describe(&self) -> String {
        match self {
            EliminationReason::Loss { team, opponent, score } => match score {
                Some(score) => format!("{} lost to {} ({})", team, opponent, score),
                None => format!("{} lost to {}", team, opponent),
            },
            EliminationReason::Tie { team, opponent } => format!("{} tied {}", team, opponent),
            EliminationReason::NoPick => "no pick submitted".to_string(),
            EliminationReason::NoValidPick { team } => format!("{} had no game that week", team),
            EliminationReason::RepeatPick { team, first_week } => {
                format!("{} already used in week {}", team, first_week)
            }
            EliminationReason::AdminDecision { reason } => format!("admin: {}", reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurvivorWeek {
    pub week: Week,
    pub team: Option<String>,
    pub outcome: PickOutcome,
}

/// Survivor state for one user. `alive -> eliminated` is terminal unless
/// an admin reinstate override exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurvivorStatus {
    pub user_id: UserId,
    pub alive: bool,
    pub eliminated_week: Option<Week>,
    pub reason: Option<EliminationReason>,
    #[serde(default)]
    pub weeks: Vec<SurvivorWeek>,
}

impl SurvivorStatus {
    pub fn alive(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            alive: true,
            eliminated_week: None,
            reason: None,
            weeks: Vec::new(),
        }
    }

    pub fn label(&self) -> &str {
        if self.alive { "alive" } else { "eliminated" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pick_outcome_serialization() {
        let json = serde_json::to_value(PickOutcome::Correct(16)).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "correct", "detail": 16}));

        let json = serde_json::to_value(PickOutcome::Pending).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "pending"}));

        let back: PickOutcome =
            serde_json::from_value(serde_json::json!({"kind": "invalid", "detail": "unknown game"}))
                .unwrap();
        assert_eq!(back, PickOutcome::Invalid("unknown game".to_string()));
    }

    #[test]
    fn test_week_score_record_tallies() {
        let mut score = WeekScore::new("u1", 1);
        score.record("g1", PickOutcome::Correct(10));
        score.record("g2", PickOutcome::Correct(3));
        score.record("g3", PickOutcome::Incorrect);
        score.record("g4", PickOutcome::Pending);
        score.record("g5", PickOutcome::Invalid("bad".to_string()));

        assert_eq!(score.points, 13);
        assert_eq!(
            (score.correct, score.incorrect, score.pending, score.invalid),
            (2, 1, 1, 1)
        );
    }
}
