//! The `restore-all` command: empty the cache back to the array.

use std::path::Path;

use tiershift::config::format_size;
use tiershift::service::TierShiftService;

use crate::error::CliError;

use super::load_settings;

pub async fn execute(config: Option<&Path>) -> Result<(), CliError> {
    let settings = load_settings(config)?;
    let service = TierShiftService::new(settings)?;

    let report = service.restore_all().await?;

    println!(
        "Restored {} file(s), {}",
        report.files_to_array,
        format_size(report.bytes_to_array)
    );
    if report.skipped > 0 {
        println!("Skipped {} already-restored file(s)", report.skipped);
    }

    if report.errors > 0 {
        return Err(CliError::PassErrors(report.errors));
    }
    Ok(())
}
