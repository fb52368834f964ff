//! CLI error handling with user-facing messages and exit codes.

use std::fmt;
use std::path::PathBuf;
use std::process;

use cockpitmap::config::ConfigFileError;

/// CLI errors.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration could not be loaded or is invalid
    Config(String),
    /// Track file missing or malformed
    TrackFile { path: PathBuf, reason: String },
    /// Invalid command-line argument
    InvalidArgument(String),
    /// Async runtime failure
    Runtime(String),
}

impl CliError {
    /// Print the error and exit with status 1.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::TrackFile { .. } => {
                eprintln!();
                eprintln!("A track file is a JSON array of fixes, for example:");
                eprintln!(
                    "  [{{\"offset_ms\": 0, \"latitude\": 39.90, \"longitude\": 116.40, \"bearing\": 0}}]"
                );
            }
            CliError::Config(_) => {
                eprintln!();
                eprintln!("Check the file with: cockpitmap config");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::TrackFile { path, reason } => {
                write!(f, "Failed to read track '{}': {}", path.display(), reason)
            }
            CliError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            CliError::Runtime(msg) => write!(f, "Runtime error: {}", msg),
        }
    }
}

impl std::error::Error for CliError {}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e.to_string())
    }
}
