pub mod config;
pub mod dashboard;
pub mod report;
#[cfg(feature = "server")]
pub mod serve;

use std::path::Path;

use clap::{Parser, Subcommand};

use crate::error::Result;
use crate::loader::load_ledger;
use crate::presentation::Overview;
use crate::settings::Settings;

/// Load a file and build every view from it, warning on stderr about rows
/// that were left out.
pub(crate) fn load_overview(file: &str, settings: &Settings) -> Result<Overview> {
    let ledger = load_ledger(Path::new(file), settings)?;
    let overview = Overview::from_ledger(ledger);
    if !overview.skipped.is_empty() {
        eprintln!(
            "{} row(s) skipped (run with RUST_LOG=warn for details)",
            overview.skipped.len()
        );
    }
    Ok(overview)
}

#[derive(Parser)]
#[command(
    name = "ledgerlens",
    version,
    about = "Monthly revenue, expenses and profit/loss from a transaction spreadsheet."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Open the interactive dashboard (Revenue, Expenses, Result tabs).
    Dashboard {
        /// Path to an XLSX/XLS/ODS/CSV file
        file: String,
    },
    /// Print a report as a text table.
    Report {
        #[command(subcommand)]
        command: ReportCommands,
    },
    /// Serve the upload endpoint over HTTP.
    #[cfg(feature = "server")]
    Serve {
        /// Address to bind (default from settings)
        #[arg(long, env = "HOST")]
        host: Option<String>,
        /// Port to listen on (default from settings)
        #[arg(long, env = "PORT")]
        port: Option<u16>,
    },
    /// Inspect or create the settings file.
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ReportCommands {
    /// Gross revenue per month.
    Revenue { file: String },
    /// Expenses per month and category.
    Expenses { file: String },
    /// Revenue, expenses and profit/loss per month, with totals.
    Result { file: String },
    /// The HTTP upload response body for a local file, as JSON.
    Json { file: String },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the settings file location and effective settings.
    Show,
    /// Write a settings file with default values.
    Init {
        /// Overwrite an existing settings file
        #[arg(long)]
        force: bool,
    },
}
