use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// What happens to a survivor entrant who skipped a completed week
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingPickPolicy {
    Eliminate,
    Pending,
}

impl MissingPickPolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "eliminate" => Some(Self::Eliminate),
            "pending" => Some(Self::Pending),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub path: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: "nfl_pick_pool.db".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EspnSettings {
    pub base_url: String,
    pub user_agent: &'static str,
    pub timeout_secs: u64,
    pub min_request_gap_ms: u64,
    pub cache_dir: String,
}

impl Default for EspnSettings {
    fn default() -> Self {
        Self {
            base_url: "https://site.api.espn.com".to_string(),
            user_agent: "NflPickPool/1.0",
            timeout_secs: 30,
            min_request_gap_ms: 250,
            cache_dir: "cache".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PollerSettings {
    pub interval_secs: u64,
}

impl PollerSettings {
    pub const MIN_INTERVAL_SECS: u64 = 30;
    pub const MAX_INTERVAL_SECS: u64 = 120;

    pub fn interval(&self) -> Duration {
        let secs = self
            .interval_secs
            .clamp(Self::MIN_INTERVAL_SECS, Self::MAX_INTERVAL_SECS);
        Duration::from_secs(secs)
    }
}

impl Default for PollerSettings {
    fn default() -> Self {
        Self { interval_secs: 60 }
    }
}

#[derive(Debug, Clone)]
pub struct ScoringSettings {
    pub missing_pick_policy: MissingPickPolicy,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            missing_pick_policy: MissingPickPolicy::Eliminate,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub admin_token: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            admin_token: "change-me".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub database: DatabaseSettings,
    pub espn: EspnSettings,
    pub poller: PollerSettings,
    pub scoring: ScoringSettings,
    pub server: ServerSettings,
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults with environment overrides applied
    pub fn from_env() -> Self {
        let mut config = Self::new();
        config.apply_overrides(|key| env::var(key).ok());
        config
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("DATABASE_PATH") {
            self.database.path = path;
        }
        if let Some(token) = lookup("ADMIN_TOKEN") {
            self.server.admin_token = token;
        }
        if let Some(url) = lookup("ESPN_BASE_URL") {
            self.espn.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(dir) = lookup("CACHE_DIR") {
            self.espn.cache_dir = dir;
        }
        if let Some(secs) = lookup("POLL_INTERVAL_SECS") {
            match secs.parse() {
                Ok(secs) => self.poller.interval_secs = secs,
                Err(_) => log::warn!("Ignoring invalid POLL_INTERVAL_SECS: {}", secs),
            }
        }
        if let Some(policy) = lookup("MISSING_PICK_POLICY") {
            match MissingPickPolicy::parse(&policy) {
                Some(policy) => self.scoring.missing_pick_policy = policy,
                None => log::warn!("Ignoring invalid MISSING_PICK_POLICY: {}", policy),
            }
        }
    }
}
