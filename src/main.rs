use anyhow::Result;

use nfl_pick_pool::cli::Command;
use nfl_pick_pool::{
    handle_audit, handle_completions, handle_export, handle_import_schedule, handle_ingest, handle_init_db,
    handle_poll, handle_score, handle_serve, interpret,
};

fn main() {
    setup_logging();
    parse_and_execute().unwrap_or_else(|e| {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    });
}

fn setup_logging() {
    sensible_env_logger::init!();
}

fn parse_and_execute() -> Result<()> {
    let command = interpret();
    execute_command(&command)
}

fn execute_command(command: &Command) -> Result<()> {
    match command {
        Command::Serve { port, no_poll } => handle_serve(*port, *no_poll),
        Command::Poll { once } => handle_poll(*once),
        Command::Ingest { season, week } => handle_ingest(*season, *week),
        Command::ImportSchedule { season, week, file } => handle_import_schedule(*season, *week, file),
        Command::Score { pool, week } => handle_score(pool, *week),
        Command::Audit { pool, week } => handle_audit(pool, *week),
        Command::Export { pool, output } => handle_export(pool, output.as_deref()),
        Command::InitDb { reset } => handle_init_db(*reset),
        Command::Completions { shell } => handle_completions(*shell),
    }
}
