//! The `run` command: one relocation pass.

use std::path::Path;

use tiershift::config::format_size;
use tiershift::service::{read_media_list, MediaItem, TierShiftService};

use crate::error::CliError;

use super::load_settings;

pub async fn execute(
    config: Option<&Path>,
    on_deck: Option<&Path>,
    watchlist: Option<&Path>,
) -> Result<(), CliError> {
    let settings = load_settings(config)?;
    let service = TierShiftService::new(settings)?;

    let on_deck = read_list(on_deck)?;
    let watchlist = read_list(watchlist)?;

    let report = service.run_pass(on_deck, watchlist).await?;

    println!(
        "To cache:  {} file(s), {}",
        report.batch.files_to_cache,
        format_size(report.batch.bytes_to_cache)
    );
    println!(
        "To array:  {} file(s), {}",
        report.batch.files_to_array,
        format_size(report.batch.bytes_to_array)
    );
    if report.eviction.files_to_array > 0 {
        println!(
            "Evicted:   {} file(s), {}",
            report.eviction.files_to_array,
            format_size(report.eviction.bytes_to_array)
        );
    }
    if report.held > 0 {
        println!("Held back: {} file(s) inside the retention window", report.held);
    }

    if report.error_count() > 0 {
        return Err(CliError::PassErrors(report.error_count()));
    }
    Ok(())
}

fn read_list(path: Option<&Path>) -> Result<Vec<MediaItem>, CliError> {
    match path {
        Some(path) => read_media_list(path).map_err(|error| CliError::InputList {
            path: path.display().to_string(),
            error,
        }),
        None => Ok(Vec::new()),
    }
}
