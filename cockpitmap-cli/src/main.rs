//! CockpitMap CLI
//!
//! Replays recorded drives through the follow-mode controller and shows
//! the effective configuration.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;
mod error;

use commands::simulate::SimulateArgs;
use error::CliError;

#[derive(Parser)]
#[command(name = "cockpitmap")]
#[command(version, about = "Cockpit map camera follow mode", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a recorded track through the feed and the follow controller
    Simulate(SimulateArgs),

    /// Print the effective configuration
    Config {
        /// Configuration file (default: ~/.cockpitmap/config.ini)
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let result: Result<(), CliError> = match cli.command {
        Commands::Simulate(args) => commands::simulate::run(args),
        Commands::Config { path } => commands::config::run(path),
    };

    if let Err(e) = result {
        e.exit();
    }
}
