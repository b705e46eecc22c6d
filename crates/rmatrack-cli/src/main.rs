use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::{Local, NaiveDate};
use clap::Parser;
use rmatrack_core::model::Snapshot;
use tracing_subscriber::EnvFilter;

mod commands;
use commands::archive::{handle_catch_up, handle_eod};
use commands::import::handle_import;
use commands::mark::{handle_mark_command, MarkCommands};
use commands::overdue::handle_overdue;
use commands::report::handle_report;
use commands::search::handle_search;
use commands::{connect_store, load_config, load_snapshot, snapshot_from_csv};

/// A CLI for the RMA service-order tracker.
#[derive(Parser, Debug)]
#[command(author, version, about = "RMA service-order tracking", long_about = None)]
struct Cli {
    /// Optional TOML settings file (thresholds, deep links, catch-up cap).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Scan the record table for overdue estimates, reminders, and shipments.
    Overdue {
        /// Read records from a CSV export instead of the database.
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Generate one day's task report without archiving it.
    Report {
        /// Report date; defaults to today.
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Read records from a CSV export instead of the database.
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Bring the daily report archive up to date, one day at a time.
    CatchUp {
        /// Treat this date as today; defaults to the current date.
        #[arg(long)]
        today: Option<NaiveDate>,
        /// Read records from a CSV export; the archive stays in Postgres.
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Reconcile an archived report against live state and archive the summary.
    Eod {
        /// Summary date; defaults to today.
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Read records from a CSV export; the archive stays in Postgres.
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Record a stage completion on one record.
    Mark {
        #[command(subcommand)]
        command: MarkCommands,
    },
    /// Search records by RMA or serial substring.
    Search {
        query: String,
        /// Read records from a CSV export instead of the database.
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Replace the database record table with a CSV export.
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
}

async fn snapshot_source(csv: Option<&Path>) -> Result<Snapshot> {
    match csv {
        Some(path) => snapshot_from_csv(path),
        None => load_snapshot(&connect_store().await?).await,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    let today = Local::now().date_naive();

    match cli.command {
        Commands::Overdue { csv } => {
            let snapshot = snapshot_source(csv.as_deref()).await?;
            handle_overdue(&snapshot, &config)?;
        }
        Commands::Report { date, csv } => {
            let snapshot = snapshot_source(csv.as_deref()).await?;
            handle_report(&snapshot, date.unwrap_or(today))?;
        }
        Commands::CatchUp { today: as_of, csv } => {
            let store = connect_store().await?;
            let snapshot = match csv.as_deref() {
                Some(path) => snapshot_from_csv(path)?,
                None => load_snapshot(&store).await?,
            };
            handle_catch_up(&store, &snapshot, &config, as_of.unwrap_or(today)).await?;
        }
        Commands::Eod { date, csv } => {
            let store = connect_store().await?;
            let snapshot = match csv.as_deref() {
                Some(path) => snapshot_from_csv(path)?,
                None => load_snapshot(&store).await?,
            };
            handle_eod(&store, &snapshot, date.unwrap_or(today)).await?;
        }
        Commands::Mark { command } => {
            let store = connect_store().await?;
            handle_mark_command(command, &store).await?;
        }
        Commands::Search { query, csv } => {
            let snapshot = snapshot_source(csv.as_deref()).await?;
            handle_search(&snapshot, &query, &config)?;
        }
        Commands::Import { csv } => {
            let store = connect_store().await?;
            handle_import(&store, &csv).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn read_only_commands_accept_a_csv_source() {
        let cli = Cli::try_parse_from(["rmatrack", "overdue", "--csv", "records.csv"]).unwrap();
        assert!(matches!(cli.command, Commands::Overdue { csv: Some(_) }));

        let cli = Cli::try_parse_from(["rmatrack", "search", "SN1", "--csv", "records.csv"]).unwrap();
        assert!(matches!(cli.command, Commands::Search { csv: Some(_), .. }));
    }

    #[test]
    fn write_commands_reject_a_csv_source() {
        assert!(Cli::try_parse_from([
            "rmatrack", "mark", "shipped", "--rma", "5001", "--serial", "SN1", "--csv", "x.csv",
        ])
        .is_err());
    }
}
