//! CLI command implementations.
//!
//! Each subcommand has its own module with a single `execute` entry point.
//!
//! - [`run`] - One relocation pass
//! - [`restore`] - Restore everything to the array
//! - [`status`] - Tracker and cache occupancy
//! - [`migrate`] - One-time tracker migration

pub mod migrate;
pub mod restore;
pub mod run;
pub mod status;

use std::path::Path;

use tiershift::config::Settings;

use crate::error::CliError;

/// Load settings from the given path or the default location.
pub(crate) fn load_settings(config: Option<&Path>) -> Result<Settings, CliError> {
    let settings = match config {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load()?,
    };
    Ok(settings)
}
