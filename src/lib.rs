pub mod api;
pub mod cache;
pub mod cli;
pub mod config;
pub mod database;
pub mod domain;
pub mod errors;
pub mod http;
pub mod normalize;
pub mod scoring;
pub mod services;

use std::fs::File;
use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use cli::Cli;
use colored::Colorize;

use crate::cli::Command;
use crate::config::settings::AppConfig;
use crate::database::{setup, DbPool};
use crate::domain::{ScoringTrigger, Season, Week};
use crate::services::export::export_pool_csv;
use crate::services::ingestion::{IngestionReport, IngestionService};
use crate::services::poller::ScorePoller;
use crate::services::pools::PoolService;
use crate::services::scoring::ScoringService;
use crate::services::server::ServerService;

pub fn interpret() -> Command {
    let cli = Cli::parse();
    cli.command
}

/// Open the configured database and make sure the schema exists
fn open_database(config: &AppConfig) -> Result<DbPool> {
    let pool = database::create_pool(&config.database.path)
        .with_context(|| format!("Failed to open database {}", config.database.path))?;
    setup::initialize_schema(&*database::get_connection(&pool)?)?;
    Ok(pool)
}

pub fn handle_serve(port: u16, no_poll: bool) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let config = AppConfig::from_env();
        let service = ServerService::new(port, config, !no_poll);
        service.run().await
    })
}

pub fn handle_poll(once: bool) -> Result<()> {
    let config = AppConfig::from_env();
    let pool = open_database(&config)?;
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let mut poller = ScorePoller::new(pool, &config)?;
        if once {
            let report = poller.tick().await?;
            print_ingestion(&report);
        } else {
            poller.run().await;
        }
        Ok::<(), anyhow::Error>(())
    })
}

pub fn handle_ingest(season: Season, week: Week) -> Result<()> {
    let config = AppConfig::from_env();
    let pool = open_database(&config)?;
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let mut service = IngestionService::new(pool, &config)?;
        let report = service.ingest_week(season, week).await?;
        print_ingestion(&report);
        Ok::<(), anyhow::Error>(())
    })
}

pub fn handle_import_schedule(season: Season, week: Week, file: &Path) -> Result<()> {
    let config = AppConfig::from_env();
    let service = PoolService::new(open_database(&config)?);
    let report = service.import_schedule_file(season, week, file)?;
    println!(
        "{} season {} week {}: {} created, {} updated",
        "Schedule imported".green().bold(),
        season,
        week,
        report.created,
        report.updated
    );
    Ok(())
}

pub fn handle_score(pool_id: &str, week: Week) -> Result<()> {
    let config = AppConfig::from_env();
    let service = ScoringService::new(open_database(&config)?, config.scoring.clone());
    let summary = service.score_week(pool_id, week, ScoringTrigger::Cli)?;

    println!("{} {} week {}", "Scored".green().bold(), pool_id, week);
    println!("  run:        {}", summary.run_id.dimmed());
    println!("  confidence: {} entrants", summary.confidence_scored);
    println!(
        "  survivor:   {} of {} alive",
        summary.survivors_alive, summary.survivor_evaluated
    );
    for user in &summary.newly_eliminated {
        println!("  {} {}", "eliminated".red(), user);
    }
    Ok(())
}

pub fn handle_audit(pool_id: &str, week: Week) -> Result<()> {
    let config = AppConfig::from_env();
    let service = ScoringService::new(open_database(&config)?, config.scoring.clone());
    let report = service.verify_week(pool_id, week)?;

    if report.is_clean() {
        println!("{} {} week {} matches recomputation", "OK".green().bold(), pool_id, week);
        return Ok(());
    }

    println!("{} {} week {}", "Discrepancies".red().bold(), pool_id, week);
    for d in &report.confidence {
        let stored = d
            .stored
            .map(|s| format!("{} pts / {} correct", s.points, s.correct))
            .unwrap_or_else(|| "nothing stored".to_string());
        println!(
            "  {} stored {}, recomputed {} pts / {} correct",
            d.user_id.yellow(),
            stored,
            d.recomputed.points,
            d.recomputed.correct
        );
    }
    for d in &report.survivor {
        println!(
            "  {} survivor stored alive={:?} (week {:?}), recomputed alive={} (week {:?})",
            d.user_id.yellow(),
            d.stored_alive,
            d.stored_week,
            d.recomputed_alive,
            d.recomputed_week
        );
    }
    Ok(())
}

pub fn handle_export(pool_id: &str, output: Option<&Path>) -> Result<()> {
    let config = AppConfig::from_env();
    let pool = open_database(&config)?;
    let conn = database::get_connection(&pool)?;

    match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            let rows = export_pool_csv(&conn, pool_id, file)?;
            eprintln!("{} {} rows to {}", "Exported".green().bold(), rows, path.display());
        }
        None => {
            export_pool_csv(&conn, pool_id, io::stdout().lock())?;
        }
    }
    Ok(())
}

pub fn handle_init_db(reset: bool) -> Result<()> {
    let config = AppConfig::from_env();
    let pool = database::create_pool(&config.database.path)?;
    let conn = database::get_connection(&pool)?;
    if reset {
        setup::reset_database(&conn)?;
    } else {
        setup::initialize_schema(&conn)?;
    }
    println!("{} {}", "Database ready:".green().bold(), config.database.path);
    Ok(())
}

pub fn handle_completions(shell: Shell) -> Result<()> {
    let mut command = Cli::command();
    let name = command.get_name().to_string();
    clap_complete::generate(shell, &mut command, name, &mut io::stdout());
    Ok(())
}

fn print_ingestion(report: &IngestionReport) {
    if let Some(reason) = &report.skipped {
        println!(
            "{} season {} week {}: {}",
            "Skipped".yellow().bold(),
            report.season,
            report.week,
            reason
        );
        return;
    }
    println!(
        "{} season {} week {}: {} fetched, {} matched, {} updated",
        "Ingested".green().bold(),
        report.season,
        report.week,
        report.fetched,
        report.matched,
        report.updated
    );
    if !report.newly_final.is_empty() {
        println!("  {} {}", "final:".cyan(), report.newly_final.join(", "));
    }
    for label in &report.unmatched {
        println!("  {} {}", "unmatched:".yellow(), label);
    }
    for summary in &report.rescored {
        println!("  rescored pool {} week {}", summary.pool_id, summary.week);
    }
}
