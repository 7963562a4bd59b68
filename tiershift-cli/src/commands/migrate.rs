//! The `migrate` command: run the one-time tracker migration by hand.
//!
//! The service runs this automatically at startup; the command exists for
//! inspecting the result before a first scheduled run.

use std::path::Path;

use tiershift::tracker::migrate_cache_tracker;

use crate::error::CliError;

use super::load_settings;

pub fn execute(config: Option<&Path>) -> Result<(), CliError> {
    let settings = load_settings(config)?;
    let tracker_path = settings.general.tracker_directory.join("cache_tracker.json");

    let result = migrate_cache_tracker(&tracker_path).map_err(CliError::Migration)?;

    if result.skipped {
        println!("Migration already complete, nothing to do");
    } else {
        println!(
            "Upgraded {} entr(ies), {} already structured, {} error(s)",
            result.upgraded, result.already_structured, result.errors
        );
        if result.errors > 0 {
            println!("Migration will retry on the next run");
        }
    }

    Ok(())
}
