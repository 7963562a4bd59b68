//! Batch progress reporting.
//!
//! An explicit reporter object handed to the worker pool; counters are
//! atomics inside it, not process-wide singletons. Byte counts stand in
//! for liveness detection by the caller.

use std::sync::atomic::{AtomicU64, Ordering};

use super::types::Direction;

/// Shared progress counters for one batch.
#[derive(Debug, Default)]
pub struct ProgressReporter {
    files_to_cache: AtomicU64,
    files_to_array: AtomicU64,
    bytes_to_cache: AtomicU64,
    bytes_to_array: AtomicU64,
    skipped: AtomicU64,
    errors: AtomicU64,
}

/// A point-in-time copy of the counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub files_to_cache: u64,
    pub files_to_array: u64,
    pub bytes_to_cache: u64,
    pub bytes_to_array: u64,
    pub skipped: u64,
    pub errors: u64,
}

impl ProgressReporter {
    /// Create a reporter with zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed move.
    pub fn record_moved(&self, direction: Direction, bytes: u64) {
        match direction {
            Direction::ToCache => {
                self.files_to_cache.fetch_add(1, Ordering::Relaxed);
                self.bytes_to_cache.fetch_add(bytes, Ordering::Relaxed);
            }
            Direction::ToArray => {
                self.files_to_array.fetch_add(1, Ordering::Relaxed);
                self.bytes_to_array.fetch_add(bytes, Ordering::Relaxed);
            }
        }
    }

    /// Record a unit that completed without moving anything.
    pub fn record_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed unit.
    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Errors recorded so far.
    pub fn error_count(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }

    /// Snapshot all counters.
    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            files_to_cache: self.files_to_cache.load(Ordering::Relaxed),
            files_to_array: self.files_to_array.load(Ordering::Relaxed),
            bytes_to_cache: self.bytes_to_cache.load(Ordering::Relaxed),
            bytes_to_array: self.bytes_to_array.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}
