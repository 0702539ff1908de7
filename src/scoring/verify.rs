//! Independent recomputation used by the accuracy audit.
//!
//! The primary path walks each user's pick sheet; this one walks the
//! week's games and looks up every user's pick for each game. Both must
//! agree on points and correct-pick counts.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::confidence::parse_confidence;
use super::types::{SurvivorStatus, WeekScore};
use crate::domain::{ConfidencePickSheet, GameOutcome, GameRecord, UserId, Week};
use crate::normalize::teams_match;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub points: u32,
    pub correct: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discrepancy {
    pub user_id: UserId,
    pub stored: Option<Tally>,
    pub recomputed: Tally,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurvivorDiscrepancy {
    pub user_id: UserId,
    pub stored_alive: Option<bool>,
    pub recomputed_alive: bool,
    pub stored_week: Option<Week>,
    pub recomputed_week: Option<Week>,
}

/// Result of auditing one pool week
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditReport {
    pub confidence: Vec<Discrepancy>,
    pub survivor: Vec<SurvivorDiscrepancy>,
}

impl AuditReport {
    pub fn is_clean(&self) -> bool {
        self.confidence.is_empty() && self.survivor.is_empty()
    }
}

/// Game-first recomputation of every user's points for one week
pub fn recompute_week(
    games: &[GameRecord],
    sheets: &BTreeMap<UserId, ConfidencePickSheet>,
) -> BTreeMap<UserId, Tally> {
    let mut tallies: BTreeMap<UserId, Tally> =
        sheets.keys().map(|user| (user.clone(), Tally::default())).collect();

    for game in games {
        let GameOutcome::Winner(winner) = game.outcome() else {
            continue;
        };

        for (user_id, sheet) in sheets {
            let Some(pick) = sheet.picks.get(&game.id) else {
                continue;
            };
            if !teams_match(&pick.team, &winner) {
                continue;
            }
            let tally = tallies.entry(user_id.clone()).or_default();
            tally.correct += 1;
            tally.points = tally
                .points
                .saturating_add(parse_confidence(&pick.confidence).unwrap_or(0));
        }
    }

    tallies
}

/// Compare stored week scores with a recomputation
pub fn compare(
    stored: &BTreeMap<UserId, WeekScore>,
    recomputed: &BTreeMap<UserId, Tally>,
) -> Vec<Discrepancy> {
    recomputed
        .iter()
        .filter_map(|(user_id, tally)| {
            let stored_tally = stored.get(user_id).map(|s| Tally {
                points: s.points,
                correct: s.correct,
            });
            match stored_tally {
                Some(s) if s == *tally => None,
                // Nothing stored and nothing earned yet is not a discrepancy
                None if *tally == Tally::default() => None,
                _ => Some(Discrepancy {
                    user_id: user_id.clone(),
                    stored: stored_tally,
                    recomputed: *tally,
                }),
            }
        })
        .collect()
}

/// Compare stored survivor statuses with replayed ones. Only the
/// alive flag and elimination week count; per-week history may differ in
/// wording without being wrong.
pub fn compare_survivor(
    stored: &BTreeMap<UserId, SurvivorStatus>,
    recomputed: &[SurvivorStatus],
) -> Vec<SurvivorDiscrepancy> {
    recomputed
        .iter()
        .filter_map(|status| {
            let previous = stored.get(&status.user_id);
            let agrees = previous.is_some_and(|p| {
                p.alive == status.alive && p.eliminated_week == status.eliminated_week
            });
            // Never scored and still alive is the initial state
            let untouched = previous.is_none() && status.alive;
            if agrees || untouched {
                return None;
            }
            Some(SurvivorDiscrepancy {
                user_id: status.user_id.clone(),
                stored_alive: previous.map(|p| p.alive),
                recomputed_alive: status.alive,
                stored_week: previous.and_then(|p| p.eliminated_week),
                recomputed_week: status.eliminated_week,
            })
        })
        .collect()
}
