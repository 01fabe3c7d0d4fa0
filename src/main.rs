//! Chat Archive - export archived chat sessions from a local message store.
//!
//! Reads the archive database, exports selected sessions inside a time window
//! to JSON, HTML, Excel or SQL files (one file per session), exports the
//! friend list, and computes relationship statistics for one contact.
//!
//!   chat-archive sessions                         # List exportable sessions
//!   chat-archive export -s <id> -f html -o out    # Export one session
//!   chat-archive export --all --start 2024-01-01 --end 2024-12-31
//!   chat-archive contacts -o out                  # Friend list spreadsheet
//!   chat-archive report <id> --year 2024          # Relationship report

mod application;
mod cli;
mod domain;
mod infrastructure;

use std::collections::HashSet;
use std::path::PathBuf;

use chrono::{Datelike, NaiveDate, Utc};
use clap::Parser;
use colored::Colorize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use application::{
    export_contacts, format_contacts_summary, format_export_result, format_progress,
    format_report, format_sessions_table, ContactResolver, ExportCoordinator, MessageScanner,
    SessionCatalog, StatisticsAggregator,
};
use cli::{Cli, Commands, ConfigAction};
use domain::{AppConfig, AppError, ExportFormat, ExportJob, ExportPhase, TimeWindow};
use infrastructure::{ensure_config_exists, load_config, render_config, SqliteMessageStore};

fn main() {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

/// Main application logic.
fn run(cli: Cli) -> domain::Result<()> {
    let mut config = load_config()?;
    if let Some(database) = cli.database {
        config.store.database = Some(database);
    }

    match cli.command {
        Commands::Sessions { limit } => cmd_sessions(&config, limit),
        Commands::Export {
            format,
            sessions,
            all,
            start,
            end,
            all_time,
            out,
        } => {
            let window = match (start, end, all_time) {
                (Some(start), Some(end), false) => Some((start, end)),
                _ => None,
            };
            cmd_export(&config, format.as_deref(), sessions, all, window, out)
        }
        Commands::Contacts { out } => cmd_contacts(&config, out),
        Commands::Report {
            friend,
            me,
            year,
            json,
        } => cmd_report(&config, &friend, me, year, json),
        Commands::Config { action } => cmd_config(&config, action),
    }
}

fn open_store(config: &AppConfig) -> domain::Result<SqliteMessageStore> {
    SqliteMessageStore::open(&config.database_path())
}

fn runtime() -> domain::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| AppError::io("Failed to start async runtime", e))
}

/// List sessions command.
fn cmd_sessions(config: &AppConfig, limit: usize) -> domain::Result<()> {
    let store = open_store(config)?;
    let mut catalog = SessionCatalog::new(&store);
    let sessions = catalog.sessions()?;

    let shown = if limit == 0 {
        sessions
    } else {
        &sessions[..limit.min(sessions.len())]
    };

    println!("{}", format_sessions_table(shown));
    println!();
    println!("Total: {} session(s)", sessions.len());

    Ok(())
}

/// Export sessions command.
fn cmd_export(
    config: &AppConfig,
    format: Option<&str>,
    requested: Vec<String>,
    all: bool,
    window: Option<(NaiveDate, NaiveDate)>,
    out: Option<PathBuf>,
) -> domain::Result<()> {
    let format = match format {
        Some(f) => f.parse::<ExportFormat>().map_err(AppError::config)?,
        None => config.export.format,
    };
    let offset = config.report.offset();
    let window = match window {
        Some((start, end)) => TimeWindow::days(start, end, offset)?,
        None => TimeWindow::all_time(),
    };

    let store = open_store(config)?;
    let mut catalog = SessionCatalog::new(&store);
    let sessions = catalog.sessions()?.to_vec();

    let targets = if all {
        sessions.iter().map(|s| s.identifier.clone()).collect()
    } else {
        dedup_preserving_order(requested)
    };

    let job = ExportJob {
        targets,
        format,
        window,
        destination: Some(out.unwrap_or_else(|| config.exports_dir())),
    };

    let resolver = ContactResolver::from_store(&store);
    let scanner = MessageScanner::new(&store)
        .with_page_size(config.export.page_size)
        .with_yield_every(config.export.yield_every_pages);
    let cancel = CancellationToken::new();
    let (tx, mut rx) = mpsc::unbounded_channel();

    let mut coordinator = ExportCoordinator::new(&store, &sessions, &resolver, offset)
        .with_scanner(scanner)
        .with_scan_fault_policy(config.export.scan_fault_policy)
        .with_progress(tx)
        .with_cancellation(cancel.clone());

    let (outcome, result) = runtime()?.block_on(async {
        let interrupt = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted, stopping after the current step");
                interrupt.cancel();
            }
        });

        let export = async move {
            let outcome = coordinator.run(&job).await;
            // Dropping the coordinator closes the progress channel.
            (outcome, coordinator.result().clone())
        };

        let printer = async {
            let mut last = (ExportPhase::Idle, String::new());
            while let Some(progress) = rx.recv().await {
                let key = (progress.phase, progress.session_label.clone());
                if key != last {
                    eprintln!("{}", format_progress(&progress));
                    last = key;
                }
            }
        };

        let (exported, ()) = tokio::join!(export, printer);
        exported
    });

    println!("{}", format_export_result(&result));
    outcome.map(|_| ())
}

/// Export friend list command.
fn cmd_contacts(config: &AppConfig, out: Option<PathBuf>) -> domain::Result<()> {
    let store = open_store(config)?;
    let dir = out.unwrap_or_else(|| config.exports_dir());

    let summary = export_contacts(&store, &dir)?;
    println!("{}", format_contacts_summary(&summary));

    Ok(())
}

/// Relationship report command.
fn cmd_report(
    config: &AppConfig,
    friend: &str,
    me: Option<String>,
    year: Option<i32>,
    json: bool,
) -> domain::Result<()> {
    let me = me
        .or_else(|| config.report.my_identifier.clone())
        .ok_or_else(|| {
            AppError::config("Your identifier is unknown: pass --me or set report.my_identifier")
        })?;
    let offset = config.report.offset();
    let year = year.unwrap_or_else(|| Utc::now().with_timezone(&offset).year());

    let store = open_store(config)?;
    if !SessionCatalog::new(&store).is_known(friend)? {
        tracing::warn!(friend, "Contact not found in the archive");
    }

    let resolver = ContactResolver::from_store(&store);
    let scanner = MessageScanner::new(&store)
        .with_page_size(config.export.page_size)
        .with_yield_every(config.export.yield_every_pages);
    let stats = StatisticsAggregator::new(&store, &resolver, offset).with_scanner(scanner);

    let report = runtime()?.block_on(stats.dual_report(&me, friend, year));

    if json {
        let output = serde_json::to_string_pretty(&report).map_err(AppError::json)?;
        println!("{output}");
    } else {
        println!("{}", format_report(&report));
    }

    Ok(())
}

/// Configuration file command.
fn cmd_config(config: &AppConfig, action: ConfigAction) -> domain::Result<()> {
    match action {
        ConfigAction::Init => {
            let path = ensure_config_exists()?;
            println!("{} Configuration at {}", "✓".green().bold(), path.display());
        }
        ConfigAction::Show => {
            println!("{}", render_config(config)?);
        }
    }
    Ok(())
}

/// Drops repeated identifiers, keeping first occurrences in order.
fn dedup_preserving_order(ids: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
}

/// Setup tracing/logging based on verbosity level.
fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time())
        .with(filter)
        .init();
}
