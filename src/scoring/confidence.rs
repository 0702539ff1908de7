use std::collections::{BTreeMap, HashMap};

use log::warn;
use serde_json::Value;

use super::types::{PickFlag, PickOutcome, SeasonTotal, WeekScore};
use crate::domain::{ConfidencePickSheet, GameOutcome, GameRecord, Week};
use crate::normalize::teams_match;

/// Coerce a stored confidence value.
///
/// Missing values count as 0. `None` means the value could not be read at
/// all; callers score it as 0 and flag it.
pub fn parse_confidence(raw: &Value) -> Option<u32> {
    match raw {
        Value::Null => Some(0),
        Value::Number(n) => match n.as_u64() {
            Some(v) => Some(v.min(u32::MAX as u64) as u32),
            None => n.as_f64().and_then(truncate_non_negative),
        },
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return Some(0);
            }
            s.parse::<u32>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(truncate_non_negative))
        }
        _ => None,
    }
}

fn truncate_non_negative(v: f64) -> Option<u32> {
    if v.is_finite() && v >= 0.0 {
        Some(v.trunc().min(u32::MAX as f64) as u32)
    } else {
        None
    }
}

/// Outcome of one confidence pick against its game
pub fn score_pick(game: Option<&GameRecord>, game_id: &str, team: &str, confidence: u32) -> PickOutcome {
    let Some(game) = game else {
        return PickOutcome::Invalid(format!("unknown game {}", game_id));
    };
    if !game.involves(team) {
        return PickOutcome::Invalid(format!("team {} not in game {}", team, game_id));
    }

    match game.outcome() {
        GameOutcome::Pending => PickOutcome::Pending,
        GameOutcome::Tie => PickOutcome::Incorrect,
        GameOutcome::Winner(winner) if teams_match(&winner, team) => PickOutcome::Correct(confidence),
        GameOutcome::Winner(_) => PickOutcome::Incorrect,
    }
}

/// Score one user's week from scratch. Pure, so re-running it on the same
/// inputs gives the same result.
pub fn score_confidence_week(
    user_id: &str,
    week: Week,
    games: &[GameRecord],
    sheet: &ConfidencePickSheet,
) -> WeekScore {
    let game_map: HashMap<&str, &GameRecord> = games.iter().map(|g| (g.id.as_str(), g)).collect();
    let max = games.len() as u32;

    let mut score = WeekScore::new(user_id, week);
    let mut games_by_value: BTreeMap<u32, Vec<String>> = BTreeMap::new();

    for (game_id, pick) in &sheet.picks {
        let confidence = match parse_confidence(&pick.confidence) {
            Some(value) => value,
            None => {
                warn!(
                    "User {} week {} game {}: unreadable confidence {}, using 0",
                    user_id, week, game_id, pick.confidence
                );
                score.flags.push(PickFlag::InvalidConfidence {
                    game_id: game_id.clone(),
                    raw: pick.confidence.to_string(),
                });
                0
            }
        };

        if max > 0 && confidence > max {
            score.flags.push(PickFlag::ConfidenceOutOfRange {
                game_id: game_id.clone(),
                value: confidence,
                max,
            });
        }
        if confidence > 0 {
            games_by_value.entry(confidence).or_default().push(game_id.clone());
        }

        let outcome = score_pick(game_map.get(game_id.as_str()).copied(), game_id, &pick.team, confidence);
        score.record(game_id, outcome);
    }

    for (value, game_ids) in games_by_value {
        if game_ids.len() > 1 {
            warn!("User {} week {}: confidence {} used {} times", user_id, week, value, game_ids.len());
            score.flags.push(PickFlag::DuplicateConfidence { value, game_ids });
        }
    }

    score
}

/// Sum week scores per user, best first
pub fn season_totals(scores: &[WeekScore]) -> Vec<SeasonTotal> {
    let mut totals: BTreeMap<&str, SeasonTotal> = BTreeMap::new();

    for score in scores {
        let total = totals.entry(score.user_id.as_str()).or_insert_with(|| SeasonTotal {
            user_id: score.user_id.clone(),
            points: 0,
            correct: 0,
            weeks_scored: 0,
        });
        total.points = total.points.saturating_add(score.points);
        total.correct += score.correct;
        total.weeks_scored += 1;
    }

    let mut totals: Vec<SeasonTotal> = totals.into_values().collect();
    totals.sort_by(|a, b| b.points.cmp(&a.points).then_with(|| a.user_id.cmp(&b.user_id)));
    totals
}
