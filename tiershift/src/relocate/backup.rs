//! Backup marker naming and defensive existence probing.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::identity::media_identity;

/// Suffix appended to an array original when its content moves to cache.
///
/// A fixed literal distinct from any media extension, so markers are
/// trivially enumerable by suffix match.
pub const BACKUP_SUFFIX: &str = ".tsbak";

/// Existence probes before declaring a file absent.
///
/// Overlay and network filesystems can lag a rename; re-checking a few
/// times avoids declaring failure on a cache that just hasn't settled.
const PROBE_ATTEMPTS: u32 = 3;
const PROBE_DELAY: Duration = Duration::from_millis(100);

/// The backup-marker path for an array file.
pub fn backup_path(array_path: &Path) -> PathBuf {
    let mut name = array_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(BACKUP_SUFFIX);
    array_path.with_file_name(name)
}

/// Whether a path is a backup marker.
pub fn is_backup_marker(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(BACKUP_SUFFIX))
}

/// The original array path a marker stands in for.
pub fn original_path(marker: &Path) -> Option<PathBuf> {
    let name = marker.file_name()?.to_str()?;
    let original = name.strip_suffix(BACKUP_SUFFIX)?;
    if original.is_empty() {
        return None;
    }
    Some(marker.with_file_name(original))
}

/// Probe for existence, re-checking a few times before giving up.
pub(super) fn probe_exists(path: &Path) -> bool {
    for attempt in 0..PROBE_ATTEMPTS {
        if path.exists() {
            return true;
        }
        if attempt + 1 < PROBE_ATTEMPTS {
            std::thread::sleep(PROBE_DELAY);
        }
    }
    false
}

/// Probe for absence, re-checking a few times before giving up.
pub(super) fn probe_absent(path: &Path) -> bool {
    for attempt in 0..PROBE_ATTEMPTS {
        if !path.exists() {
            return true;
        }
        if attempt + 1 < PROBE_ATTEMPTS {
            std::thread::sleep(PROBE_DELAY);
        }
    }
    false
}

/// Find a marker in `dir` covering the same logical identity as `filename`.
///
/// Used by upgrade detection: a quality/codec variant leaves a marker under
/// its old filename, which still matches by identity.
pub(super) fn find_marker_by_identity(dir: &Path, filename: &Path) -> Option<PathBuf> {
    let wanted = media_identity(filename);
    if wanted.is_empty() {
        return None;
    }

    let entries = std::fs::read_dir(dir).ok()?;
    for entry in entries.flatten() {
        let path = entry.path();
        if !is_backup_marker(&path) {
            continue;
        }
        if let Some(original) = original_path(&path) {
            if media_identity(&original) == wanted {
                return Some(path);
            }
        }
    }
    None
}
