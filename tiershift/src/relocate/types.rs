//! Relocation types and error taxonomy.

use std::path::PathBuf;

use thiserror::Error;

use crate::exclusion::ExclusionError;
use crate::tracker::TrackerError;

/// Which way a file is moving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Array → cache.
    ToCache,
    /// Cache → array.
    ToArray,
}

/// How a restore reached the array, decided by the backup-marker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreCase {
    /// Exact marker with matching size: rename back, no copy.
    FastRename,
    /// Exact marker with differing size: the cache copy supersedes it.
    InPlaceUpgrade,
    /// A marker under the same logical identity but another filename.
    IdentityUpgrade,
    /// No marker at all: plain copy back.
    NoMarker,
}

/// Result of one successful unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The file was relocated; `bytes` crossed tiers.
    Moved {
        direction: Direction,
        bytes: u64,
    },
    /// The file was left where it is (not cacheable, already moved, ...).
    Skipped,
}

impl MoveOutcome {
    /// Bytes physically moved by this unit.
    pub fn bytes(&self) -> u64 {
        match self {
            MoveOutcome::Moved { bytes, .. } => *bytes,
            MoveOutcome::Skipped => 0,
        }
    }
}

/// Per-file relocation errors.
///
/// All of these are caught at the unit-of-work boundary, logged with the
/// offending path, counted, and never abort the batch.
#[derive(Debug, Error)]
pub enum RelocateError {
    /// The freshly written destination copy could not be verified
    #[error("copy verification failed for {path}")]
    CopyVerificationFailed { path: PathBuf },

    /// A rename finished but the filesystem does not show the expected state
    #[error("rename verification failed for {path}")]
    RenameVerificationFailed { path: PathBuf },

    /// The destination copy has the wrong size; the source copy was kept
    #[error("size mismatch for {path}: expected {expected} bytes, found {actual}")]
    SizeMismatch {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },

    /// The operating system denied access
    #[error("permission denied for {path}")]
    PermissionDenied { path: PathBuf },

    /// A tracker or exclusion entry refers to a vanished file
    #[error("stale state: {0}")]
    StaleState(String),

    /// Unexpected filesystem error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Tracker persistence failed
    #[error(transparent)]
    Tracker(#[from] TrackerError),

    /// Exclusion list persistence failed
    #[error(transparent)]
    Exclusion(#[from] ExclusionError),
}

impl RelocateError {
    /// Wrap an I/O error, promoting permission failures to their own
    /// variant.
    pub(super) fn from_io(error: std::io::Error, path: &std::path::Path) -> Self {
        if error.kind() == std::io::ErrorKind::PermissionDenied {
            RelocateError::PermissionDenied {
                path: path.to_path_buf(),
            }
        } else {
            RelocateError::Io(error)
        }
    }
}
