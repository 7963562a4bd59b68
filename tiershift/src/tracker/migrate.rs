//! One-time migration of legacy cache-tracker files.
//!
//! Early releases persisted the cache tracker as a flat `path → epoch
//! seconds` object. Loading upgrades entries transparently, but the file on
//! disk stays legacy until this migration rewrites it in the structured
//! record shape.
//!
//! Running it twice is safe (idempotent). The completion marker is written
//! only when the error count is exactly zero, so a partial failure retries
//! automatically on the next run.

use std::collections::HashMap;
use std::path::Path;

use serde_json::Value;
use tracing::{info, warn};

use super::record::{CachedFileRecord, CachedFileShape};
use super::store::{write_map, TrackerError};

/// Name of the marker file written next to the tracker once migration
/// completes cleanly.
const MIGRATED_MARKER: &str = ".cache_tracker_migrated";

/// Result of migrating a legacy cache-tracker file.
#[derive(Debug, Default)]
pub struct MigrateResult {
    /// Entries rewritten from the bare-timestamp shape.
    pub upgraded: u64,
    /// Entries already in the structured shape.
    pub already_structured: u64,
    /// Entries that could not be interpreted and were dropped.
    pub errors: u64,
    /// Whether the migration was skipped because it already completed.
    pub skipped: bool,
}

/// Rewrite a legacy cache-tracker file in the structured record shape.
///
/// No-op when the completion marker exists or the tracker file is absent.
pub fn migrate_cache_tracker(tracker_path: &Path) -> Result<MigrateResult, TrackerError> {
    let mut result = MigrateResult::default();

    let marker_path = match tracker_path.parent() {
        Some(parent) => parent.join(MIGRATED_MARKER),
        None => return Ok(result),
    };

    if marker_path.exists() {
        result.skipped = true;
        return Ok(result);
    }

    if !tracker_path.exists() {
        // Nothing to migrate; future files are born structured
        write_marker(&marker_path, tracker_path)?;
        return Ok(result);
    }

    let raw = std::fs::read_to_string(tracker_path).map_err(|source| TrackerError::Io {
        path: tracker_path.to_path_buf(),
        source,
    })?;

    let values: HashMap<String, Value> = if raw.trim().is_empty() {
        HashMap::new()
    } else {
        serde_json::from_str(&raw).map_err(|source| TrackerError::Corrupt {
            path: tracker_path.to_path_buf(),
            source,
        })?
    };

    let mut entries: HashMap<String, CachedFileRecord> = HashMap::new();
    for (key, value) in values {
        match serde_json::from_value::<CachedFileShape>(value) {
            Ok(shape) => {
                if shape.is_legacy() {
                    result.upgraded += 1;
                } else {
                    result.already_structured += 1;
                }
                entries.insert(key, shape.normalize());
            }
            Err(error) => {
                warn!(path = %key, %error, "Unreadable cache tracker entry dropped");
                result.errors += 1;
            }
        }
    }

    write_map(tracker_path, &entries)?;

    // Only a clean pass marks itself complete; otherwise retry next run
    if result.errors == 0 {
        write_marker(&marker_path, tracker_path)?;
        info!(
            upgraded = result.upgraded,
            already_structured = result.already_structured,
            "Cache tracker migration complete"
        );
    } else {
        warn!(
            errors = result.errors,
            "Cache tracker migration finished with errors, will retry next run"
        );
    }

    Ok(result)
}

fn write_marker(marker_path: &Path, tracker_path: &Path) -> Result<(), TrackerError> {
    if let Some(parent) = marker_path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| TrackerError::Io {
            path: tracker_path.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(marker_path, b"").map_err(|source| TrackerError::Io {
        path: tracker_path.to_path_buf(),
        source,
    })
}
