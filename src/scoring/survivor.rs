use std::collections::{BTreeMap, HashMap};

use log::{info, warn};

use super::types::{EliminationReason, PickOutcome, SurvivorStatus, SurvivorWeek};
use crate::config::MissingPickPolicy;
use crate::domain::{GameOutcome, GameRecord, OverrideAction, SurvivorOverride, Week};
use crate::normalize::{normalize_team_name, teams_match};

/// Everything needed to replay one user's survivor season
pub struct SurvivorInput<'a> {
    pub user_id: &'a str,
    pub picks: &'a BTreeMap<Week, String>,
    pub games: &'a BTreeMap<Week, Vec<GameRecord>>,
    pub through_week: Week,
    pub overrides: &'a [SurvivorOverride],
    pub policy: MissingPickPolicy,
}

struct Tracker {
    status: SurvivorStatus,
    used_teams: HashMap<String, Week>,
}

impl Tracker {
    fn new(user_id: &str) -> Self {
        Self {
            status: SurvivorStatus::alive(user_id),
            used_teams: HashMap::new(),
        }
    }

    fn record(&mut self, week: Week, team: Option<&str>, outcome: PickOutcome) {
        self.status.weeks.push(SurvivorWeek {
            week,
            team: team.map(str::to_string),
            outcome,
        });
    }

    fn eliminate(&mut self, week: Week, reason: EliminationReason) {
        if !self.status.alive {
            return;
        }
        info!(
            "Survivor {} eliminated in week {}: {}",
            self.status.user_id,
            week,
            reason.describe()
        );
        self.status.alive = false;
        self.status.eliminated_week = Some(week);
        self.status.reason = Some(reason);
    }

    fn reinstate(&mut self, week: Week) {
        if self.status.alive {
            return;
        }
        info!("Survivor {} reinstated by override at week {}", self.status.user_id, week);
        self.status.alive = true;
        self.status.eliminated_week = None;
        self.status.reason = None;
    }
}

/// Replay a user's survivor picks from week 1 through `through_week`.
///
/// Recomputed from scratch on every call; [`reconcile`] keeps earlier
/// eliminations from being undone by the replay.
pub fn evaluate_survivor(input: &SurvivorInput) -> SurvivorStatus {
    let mut tracker = Tracker::new(input.user_id);
    let overrides = overrides_for(input.user_id, input.overrides);

    for week in 1..=input.through_week {
        let games = input.games.get(&week).map(Vec::as_slice).unwrap_or(&[]);
        let pick = input.picks.get(&week).map(String::as_str);

        evaluate_week(&mut tracker, week, games, pick, input.policy);

        for o in overrides.iter().filter(|o| o.week == week) {
            match o.action {
                OverrideAction::Reinstate => tracker.reinstate(week),
                OverrideAction::Eliminate => tracker.eliminate(
                    week,
                    EliminationReason::AdminDecision {
                        reason: o.reason.clone(),
                    },
                ),
            }
        }
    }

    tracker.status
}

fn overrides_for<'a>(user_id: &str, overrides: &'a [SurvivorOverride]) -> Vec<&'a SurvivorOverride> {
    let mut mine: Vec<_> = overrides.iter().filter(|o| o.user_id == user_id).collect();
    mine.sort_by_key(|o| o.created_at);
    mine
}

fn evaluate_week(
    tracker: &mut Tracker,
    week: Week,
    games: &[GameRecord],
    pick: Option<&str>,
    policy: MissingPickPolicy,
) {
    if !tracker.status.alive {
        if let Some(team) = pick {
            tracker.record(week, Some(team), PickOutcome::Invalid("entrant already eliminated".to_string()));
        }
        return;
    }

    let Some(team) = pick else {
        evaluate_missing_pick(tracker, week, games, policy);
        return;
    };

    let key = normalize_team_name(team);
    if let Some(&first_week) = tracker.used_teams.get(&key) {
        warn!(
            "Survivor {} picked {} in week {} after using it in week {}",
            tracker.status.user_id, team, week, first_week
        );
        tracker.record(
            week,
            Some(team),
            PickOutcome::Invalid(format!("{} already used in week {}", team, first_week)),
        );
        tracker.eliminate(
            week,
            EliminationReason::RepeatPick {
                team: team.to_string(),
                first_week,
            },
        );
        return;
    }

    let Some(game) = games.iter().find(|g| g.involves(team)) else {
        warn!(
            "Survivor {} week {}: no game found for pick {:?}",
            tracker.status.user_id, week, team
        );
        tracker.record(
            week,
            Some(team),
            PickOutcome::Invalid(format!("no game for {} in week {}", team, week)),
        );
        // An unusable pick counts as no pick once the week is over
        if week_concluded(games) && policy == MissingPickPolicy::Eliminate {
            tracker.eliminate(
                week,
                EliminationReason::NoValidPick {
                    team: team.to_string(),
                },
            );
        }
        return;
    };

    tracker.used_teams.insert(key, week);
    let opponent = game.opponent_of(team).unwrap_or_default().to_string();

    match game.outcome() {
        GameOutcome::Pending => tracker.record(week, Some(team), PickOutcome::Pending),
        GameOutcome::Winner(winner) if teams_match(&winner, team) => {
            tracker.record(week, Some(team), PickOutcome::Correct(0))
        }
        GameOutcome::Winner(_) => {
            tracker.record(week, Some(team), PickOutcome::Incorrect);
            tracker.eliminate(
                week,
                EliminationReason::Loss {
                    team: team.to_string(),
                    opponent,
                    score: game.score_line_for(team),
                },
            );
        }
        GameOutcome::Tie => {
            tracker.record(week, Some(team), PickOutcome::Incorrect);
            tracker.eliminate(
                week,
                EliminationReason::Tie {
                    team: team.to_string(),
                    opponent,
                },
            );
        }
    }
}

/// A week is concluded once it has games and all of them are final
fn week_concluded(games: &[GameRecord]) -> bool {
    !games.is_empty() && games.iter().all(GameRecord::is_final)
}

fn evaluate_missing_pick(tracker: &mut Tracker, week: Week, games: &[GameRecord], policy: MissingPickPolicy) {
    if games.is_empty() {
        return;
    }

    if week_concluded(games) && policy == MissingPickPolicy::Eliminate {
        tracker.record(week, None, PickOutcome::Incorrect);
        tracker.eliminate(week, EliminationReason::NoPick);
    } else {
        tracker.record(week, None, PickOutcome::Pending);
    }
}

/// Merge a freshly computed status with the stored one.
///
/// A stored elimination survives a replay that says "alive" (or one that
/// eliminates later) unless a reinstate override at or after that week
/// exists.
pub fn reconcile(
    previous: Option<&SurvivorStatus>,
    mut computed: SurvivorStatus,
    overrides: &[SurvivorOverride],
) -> SurvivorStatus {
    let Some(previous) = previous.filter(|p| !p.alive) else {
        return computed;
    };
    let previous_week = previous.eliminated_week.unwrap_or(0);

    let reinstated = overrides.iter().any(|o| {
        o.user_id == computed.user_id && o.action == OverrideAction::Reinstate && o.week >= previous_week
    });
    if reinstated {
        return computed;
    }

    let later_or_alive = computed.alive || computed.eliminated_week.is_some_and(|w| w > previous_week);
    if later_or_alive {
        warn!(
            "Survivor {}: keeping stored week {} elimination over recomputed status",
            computed.user_id, previous_week
        );
        computed.alive = false;
        computed.eliminated_week = previous.eliminated_week;
        computed.reason = previous.reason.clone();
        computed.weeks = after_elimination(computed.weeks, previous_week);
    }
    computed
}

/// Weeks after `eliminated_week` keep only the picks, marked as ignored
fn after_elimination(weeks: Vec<SurvivorWeek>, eliminated_week: Week) -> Vec<SurvivorWeek> {
    weeks
        .into_iter()
        .filter(|w| w.week <= eliminated_week || w.team.is_some())
        .map(|mut w| {
            if w.week > eliminated_week {
                w.outcome = PickOutcome::Invalid("entrant already eliminated".to_string());
            }
            w
        })
        .collect()
}
