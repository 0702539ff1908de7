pub mod settings;
pub mod teams;

pub use settings::{AppConfig, MissingPickPolicy};
pub use teams::{get_teams, TeamConfig};
