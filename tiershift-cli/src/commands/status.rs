//! The `status` command: tracker and cache occupancy.

use std::path::Path;

use tiershift::config::format_size;
use tiershift::service::TierShiftService;

use crate::error::CliError;

use super::load_settings;

pub fn execute(config: Option<&Path>) -> Result<(), CliError> {
    let settings = load_settings(config)?;
    let max_size = settings.cache.max_size;
    let service = TierShiftService::new(settings)?;

    let status = service.status();

    println!(
        "Cache:     {} file(s), {} of {}",
        status.cached_files,
        format_size(status.cache_bytes),
        format_size(max_size)
    );
    println!("Excluded:  {} path(s)", status.exclusion_entries);
    println!("Watchlist: {} item(s)", status.watchlist_entries);
    println!("On-deck:   {} item(s)", status.ondeck_entries);

    Ok(())
}
