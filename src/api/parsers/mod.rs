pub mod scoreboard;

pub use scoreboard::{parse_scoreboard, FetchedGame, Scoreboard, REGULAR_SEASON};
