mod aggregator;
mod cli;
mod error;
mod fmt;
mod loader;
mod models;
mod presentation;
#[cfg(feature = "server")]
mod server;
mod settings;
mod tui;
mod upload;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, ConfigCommands, ReportCommands};

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();

    // The dashboard owns the terminal, so keep logging quiet there.
    let default_level = match cli.command {
        #[cfg(feature = "server")]
        Commands::Serve { .. } => "info",
        Commands::Dashboard { .. } => "error",
        _ => "warn",
    };
    init_tracing(default_level);

    let result = match cli.command {
        Commands::Dashboard { file } => cli::dashboard::run(&file),
        Commands::Report { command } => match command {
            ReportCommands::Revenue { file } => cli::report::revenue(&file),
            ReportCommands::Expenses { file } => cli::report::expenses(&file),
            ReportCommands::Result { file } => cli::report::result(&file),
            ReportCommands::Json { file } => cli::report::json(&file),
        },
        #[cfg(feature = "server")]
        Commands::Serve { host, port } => cli::serve::run(host, port),
        Commands::Config { command } => match command {
            ConfigCommands::Show => cli::config::show(),
            ConfigCommands::Init { force } => cli::config::init(force),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
