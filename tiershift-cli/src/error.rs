//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;

use tiershift::config::SettingsError;
use tiershift::service::ServiceError;
use tiershift::tracker::TrackerError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(SettingsError),
    /// Failed to read an input list file
    InputList { path: String, error: std::io::Error },
    /// Service-level failure
    Service(ServiceError),
    /// Tracker migration failure
    Migration(TrackerError),
    /// A pass finished with per-file errors
    PassErrors(u64),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        // Print additional help for specific errors
        match self {
            CliError::Config(_) => {
                eprintln!();
                eprintln!("Check ~/.tiershift/config.ini; every [mapping:<name>] section");
                eprintln!("needs at least media_path and array_path.");
            }
            CliError::PassErrors(_) => {
                eprintln!();
                eprintln!("Per-file errors are logged above with their paths. Failed files");
                eprintln!("were left in a safe state and will be retried on the next run.");
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
            CliError::Config(e) => write!(f, "Configuration error: {}", e),
            CliError::InputList { path, error } => {
                write!(f, "Failed to read input list '{}': {}", path, error)
            }
            CliError::Service(e) => write!(f, "Relocation service error: {}", e),
            CliError::Migration(e) => write!(f, "Tracker migration failed: {}", e),
            CliError::PassErrors(count) => {
                write!(f, "Relocation pass finished with {} file error(s)", count)
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::InputList { error, .. } => Some(error),
            CliError::Service(e) => Some(e),
            CliError::Migration(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ServiceError> for CliError {
    fn from(e: ServiceError) -> Self {
        CliError::Service(e)
    }
}

impl From<SettingsError> for CliError {
    fn from(e: SettingsError) -> Self {
        CliError::Config(e)
    }
}
