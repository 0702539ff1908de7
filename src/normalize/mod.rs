//! Team name normalization.
//!
//! Picks, schedules and the ESPN feed all spell teams differently
//! ("Chiefs", "Kansas City Chiefs", "KC", "Oakland Raiders"). Everything is
//! compared through [`normalize_team_name`], which maps any known variant to
//! the franchise's canonical abbreviation.

use std::collections::HashMap;
use std::sync::OnceLock;

use log::debug;
use regex::Regex;

use crate::config::teams::{get_teams, TeamConfig};

type AliasMap = HashMap<String, &'static str>;

static ALIASES: OnceLock<AliasMap> = OnceLock::new();
static NON_ALPHANUMERIC: OnceLock<Regex> = OnceLock::new();

fn aliases() -> &'static AliasMap {
    ALIASES.get_or_init(build_alias_map)
}

fn build_alias_map() -> AliasMap {
    let teams = get_teams();
    let mut map = HashMap::new();

    for team in teams {
        for variant in team_variants(team) {
            map.insert(clean_key(&variant), team.abbreviation);
        }
        // A bare city only identifies a team when no other franchise shares it
        if is_unique_city(teams, team.city) {
            map.insert(clean_key(team.city), team.abbreviation);
        }
    }

    map
}

fn team_variants(team: &TeamConfig) -> Vec<String> {
    let mut variants = vec![
        team.abbreviation.to_string(),
        team.nickname.to_string(),
        team.full_name(),
    ];
    variants.extend(team.aliases.iter().map(|a| a.to_string()));
    variants
}

fn is_unique_city(teams: &[TeamConfig], city: &str) -> bool {
    teams.iter().filter(|t| t.city == city).count() == 1
}

/// Lowercase, turn punctuation into spaces and collapse whitespace
fn clean_key(name: &str) -> String {
    let pattern = NON_ALPHANUMERIC
        .get_or_init(|| Regex::new(r"[^a-z0-9]+").expect("static pattern is valid"));
    pattern
        .replace_all(&name.to_lowercase(), " ")
        .trim()
        .to_string()
}

/// Map a free-form team name to its canonical abbreviation.
///
/// Unknown inputs come back unchanged. Matching quality degrades instead of
/// failing, so callers must treat a non-canonical result as "unmapped".
pub fn normalize_team_name(name: &str) -> String {
    match lookup(name) {
        Some(abbreviation) => abbreviation.to_string(),
        None => {
            debug!("Unmapped team name: {:?}", name);
            name.to_string()
        }
    }
}

/// Canonical abbreviation if the name is a known variant
pub fn lookup(name: &str) -> Option<&'static str> {
    aliases().get(&clean_key(name)).copied()
}

pub fn is_known_team(name: &str) -> bool {
    lookup(name).is_some()
}

/// True when both names normalize to the same token.
///
/// Unmapped names still compare equal to themselves (case and punctuation
/// insensitive), which keeps hand-entered schedules usable.
pub fn teams_match(a: &str, b: &str) -> bool {
    match (lookup(a), lookup(b)) {
        (Some(x), Some(y)) => x == y,
        (None, None) => {
            let (ka, kb) = (clean_key(a), clean_key(b));
            !ka.is_empty() && ka == kb
        }
        _ => false,
    }
}
