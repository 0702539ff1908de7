/// Canonical NFL franchise table used for team name normalization
///
/// The canonical token for a team is its ESPN abbreviation. Every other
/// spelling the pool has ever stored (relocated cities, retired names,
/// legacy abbreviations, nicknames) is listed as an alias.
#[derive(Debug, Clone)]
pub struct TeamConfig {
    pub abbreviation: &'static str,
    pub city: &'static str,
    pub nickname: &'static str,
    pub aliases: &'static [&'static str],
}

impl TeamConfig {
    pub const fn new(
        abbreviation: &'static str,
        city: &'static str,
        nickname: &'static str,
        aliases: &'static [&'static str],
    ) -> Self {
        Self {
            abbreviation,
            city,
            nickname,
            aliases,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.city, self.nickname)
    }
}

const TEAMS: [TeamConfig; 32] = [
    TeamConfig::new("ARI", "Arizona", "Cardinals", &["ARZ", "Cards", "Phoenix Cardinals"]),
    TeamConfig::new("ATL", "Atlanta", "Falcons", &[]),
    TeamConfig::new("BAL", "Baltimore", "Ravens", &[]),
    TeamConfig::new("BUF", "Buffalo", "Bills", &[]),
    TeamConfig::new("CAR", "Carolina", "Panthers", &[]),
    TeamConfig::new("CHI", "Chicago", "Bears", &[]),
    TeamConfig::new("CIN", "Cincinnati", "Bengals", &[]),
    TeamConfig::new("CLE", "Cleveland", "Browns", &[]),
    TeamConfig::new("DAL", "Dallas", "Cowboys", &[]),
    TeamConfig::new("DEN", "Denver", "Broncos", &[]),
    TeamConfig::new("DET", "Detroit", "Lions", &[]),
    TeamConfig::new("GB", "Green Bay", "Packers", &["GNB", "Pack"]),
    TeamConfig::new("HOU", "Houston", "Texans", &[]),
    TeamConfig::new("IND", "Indianapolis", "Colts", &[]),
    TeamConfig::new("JAX", "Jacksonville", "Jaguars", &["JAC", "Jags"]),
    TeamConfig::new("KC", "Kansas City", "Chiefs", &["KAN"]),
    TeamConfig::new("LV", "Las Vegas", "Raiders", &["LVR", "OAK", "Oakland Raiders", "Oakland"]),
    TeamConfig::new("LAC", "Los Angeles", "Chargers", &["SD", "SDG", "San Diego Chargers", "San Diego", "LA Chargers"]),
    TeamConfig::new("LAR", "Los Angeles", "Rams", &["LA", "STL", "St Louis Rams", "LA Rams"]),
    TeamConfig::new("MIA", "Miami", "Dolphins", &["Fins", "Phins"]),
    TeamConfig::new("MIN", "Minnesota", "Vikings", &["Vikes"]),
    TeamConfig::new("NE", "New England", "Patriots", &["NWE", "Pats"]),
    TeamConfig::new("NO", "New Orleans", "Saints", &["NOR"]),
    TeamConfig::new("NYG", "New York", "Giants", &["NY Giants"]),
    TeamConfig::new("NYJ", "New York", "Jets", &["NY Jets"]),
    TeamConfig::new("PHI", "Philadelphia", "Eagles", &[]),
    TeamConfig::new("PIT", "Pittsburgh", "Steelers", &[]),
    TeamConfig::new("SF", "San Francisco", "49ers", &["SFO", "Niners", "Forty Niners"]),
    TeamConfig::new("SEA", "Seattle", "Seahawks", &[]),
    TeamConfig::new("TB", "Tampa Bay", "Buccaneers", &["TAM", "Bucs", "Tampa"]),
    TeamConfig::new("TEN", "Tennessee", "Titans", &[]),
    TeamConfig::new(
        "WSH",
        "Washington",
        "Commanders",
        &["WAS", "Redskins", "Football Team", "Washington Football Team", "Washington Redskins"],
    ),
];

/// Get the list of NFL franchises known to the pool
pub fn get_teams() -> &'static [TeamConfig] {
    &TEAMS
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_abbreviations_are_unique() {
        let abbreviations: HashSet<_> = get_teams().iter().map(|t| t.abbreviation).collect();
        assert_eq!(abbreviations.len(), 32);
    }

    #[test]
    fn test_full_name_joins_city_and_nickname() {
        let team = get_teams().iter().find(|t| t.abbreviation == "KC").unwrap();
        assert_eq!(team.full_name(), "Kansas City Chiefs");
    }
}
