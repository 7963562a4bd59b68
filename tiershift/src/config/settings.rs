//! Settings structs and defaults.

use std::path::PathBuf;

use crate::mapping::PathMapping;

/// Default retention window before an unneeded cached file may leave.
pub const DEFAULT_RETENTION_HOURS: u64 = 12;

/// Default watchlist staleness window.
pub const DEFAULT_WATCHLIST_STALE_DAYS: u64 = 30;

/// Default number of episodes the query layer pre-fetches.
pub const DEFAULT_PREFETCH_COUNT: u32 = 5;

/// Default maximum cache occupancy (512 GB).
pub const DEFAULT_MAX_CACHE_SIZE: u64 = 512 * 1024 * 1024 * 1024;

/// Default minimum priority protected from eviction.
pub const DEFAULT_MIN_PRIORITY: u8 = 50;

/// Default cache-direction worker count.
pub const DEFAULT_CACHE_WORKERS: usize = 4;

/// Default array-direction worker count.
pub const DEFAULT_ARRAY_WORKERS: usize = 2;

/// `[general]` section.
#[derive(Debug, Clone)]
pub struct GeneralSettings {
    /// Directory holding the tracker files.
    pub tracker_directory: PathBuf,
    /// Path of the exclusion list file.
    pub exclusion_file: PathBuf,
    /// Hours a freshly cached file is held regardless of need.
    pub retention_hours: u64,
    /// Days before an unseen watchlist entry ages out.
    pub watchlist_stale_days: u64,
    /// Episodes the query layer pre-fetches ahead of the current one.
    pub prefetch_count: u32,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        let tracker_directory = super::config_directory();
        let exclusion_file = tracker_directory.join("exclusions.txt");
        Self {
            tracker_directory,
            exclusion_file,
            retention_hours: DEFAULT_RETENTION_HOURS,
            watchlist_stale_days: DEFAULT_WATCHLIST_STALE_DAYS,
            prefetch_count: DEFAULT_PREFETCH_COUNT,
        }
    }
}

/// `[cache]` section.
#[derive(Debug, Clone)]
pub struct CacheSettings {
    /// Maximum bytes the tracked cache working set may occupy.
    pub max_size: u64,
    /// Files scoring at or above this are never evicted.
    pub min_priority: u8,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_CACHE_SIZE,
            min_priority: DEFAULT_MIN_PRIORITY,
        }
    }
}

/// `[workers]` section.
///
/// Sized independently per direction: array writes and cache writes
/// typically contend for different physical devices.
#[derive(Debug, Clone)]
pub struct WorkerSettings {
    /// Concurrent cache-direction moves.
    pub cache: usize,
    /// Concurrent array-direction moves.
    pub array: usize,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            cache: DEFAULT_CACHE_WORKERS,
            array: DEFAULT_ARRAY_WORKERS,
        }
    }
}

/// Complete application settings.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub cache: CacheSettings,
    pub workers: WorkerSettings,
    /// Ordered path mapping rules from `[mapping:<name>]` sections.
    pub mappings: Vec<PathMapping>,
}

impl Settings {
    /// Set the tracker directory (and the exclusion file under it, if it
    /// was at its default location).
    pub fn with_tracker_directory(mut self, dir: PathBuf) -> Self {
        self.general.exclusion_file = dir.join("exclusions.txt");
        self.general.tracker_directory = dir;
        self
    }

    /// Add a mapping rule.
    pub fn with_mapping(mut self, mapping: PathMapping) -> Self {
        self.mappings.push(mapping);
        self
    }
}
