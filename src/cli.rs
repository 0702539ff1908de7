use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "NFL confidence and survivor pool backend")]
pub struct Cli {
    /// Command
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
#[clap(rename_all = "kebab-case")]
pub enum Command {
    /// Start the HTTP server
    Serve {
        /// Port number (optional, defaults to 3000)
        #[arg(short, long, default_value_t = 3000)]
        port: u16,
        /// Do not poll ESPN in the background
        #[arg(long)]
        no_poll: bool,
    },
    /// Poll the current ESPN scoreboard in the foreground
    Poll {
        /// Run a single poll and exit
        #[arg(long)]
        once: bool,
    },
    /// Fetch and apply one week of ESPN scores
    Ingest {
        #[arg(short, long)]
        season: i32,
        #[arg(short, long)]
        week: u32,
    },
    /// Import a week's schedule from a JSON file
    ImportSchedule {
        #[arg(short, long)]
        season: i32,
        #[arg(short, long)]
        week: u32,
        /// JSON array of {home_team, away_team, id?, kickoff?}
        file: PathBuf,
    },
    /// Score one week of a pool
    Score {
        #[arg(short, long)]
        pool: String,
        #[arg(short, long)]
        week: u32,
    },
    /// Recompute a week independently and report discrepancies
    Audit {
        #[arg(short, long)]
        pool: String,
        #[arg(short, long)]
        week: u32,
    },
    /// Export a pool's picks and results as CSV
    Export {
        #[arg(short, long)]
        pool: String,
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Create the database schema
    InitDb {
        /// Drop all existing documents first
        #[arg(long)]
        reset: bool,
    },
    /// Print shell completions
    Completions {
        shell: Shell,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        let cli = Cli::try_parse_from(["nfl_pick_pool", "serve", "--no-poll"]).unwrap();
        assert_eq!(cli.command, Command::Serve { port: 3000, no_poll: true });

        let cli = Cli::try_parse_from(["nfl_pick_pool", "score", "--pool", "office", "--week", "3"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Score {
                pool: "office".to_string(),
                week: 3
            }
        );

        let cli = Cli::try_parse_from(["nfl_pick_pool", "import-schedule", "-s", "2025", "-w", "1", "week1.json"]).unwrap();
        assert!(matches!(cli.command, Command::ImportSchedule { season: 2025, week: 1, .. }));

        assert!(Cli::try_parse_from(["nfl_pick_pool", "ingest", "--season", "2025"]).is_err());
    }
}
