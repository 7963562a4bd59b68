//! Watchlist membership tracker.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use super::record::WatchlistRecord;
use super::store::{key_string, JsonStore, TrackerError};

/// Tracks which media paths are on user watchlists, keyed by media path.
///
/// Unlike on-deck state, watchlist membership persists across runs; entries
/// age out via the staleness sweep when the media server stops reporting
/// them.
pub struct WatchlistTracker {
    store: JsonStore<WatchlistRecord>,
}

impl WatchlistTracker {
    /// Load the tracker from its backing file.
    pub fn load(path: PathBuf) -> Result<Self, TrackerError> {
        Ok(Self {
            store: JsonStore::load(path)?,
        })
    }

    /// Record an observation of `media_path` on `user`'s watchlist.
    ///
    /// Creates the record on first observation. On later observations the
    /// user set accumulates, `last_seen` always updates, and
    /// `watchlisted_at` only moves forward (a later timestamp wins).
    pub fn observe(
        &self,
        media_path: &Path,
        user: &str,
        now: DateTime<Utc>,
    ) -> Result<(), TrackerError> {
        let key = key_string(media_path);
        self.store.update(|entries| {
            let record = entries.entry(key).or_insert_with(|| WatchlistRecord {
                watchlisted_at: now,
                users: Default::default(),
                last_seen: now,
            });
            record.users.insert(user.to_string());
            record.last_seen = now;
            if now > record.watchlisted_at {
                record.watchlisted_at = now;
            }
        })
    }

    /// Look up a record, falling back to filename-only matching.
    pub fn get(&self, path: &Path) -> Option<WatchlistRecord> {
        self.store.get(path)
    }

    /// Remove a record after the file is relocated.
    pub fn remove(&self, media_path: &Path) -> Result<Option<WatchlistRecord>, TrackerError> {
        let key = key_string(media_path);
        self.store.update(|entries| entries.remove(&key))
    }

    /// All tracked media paths.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.store
            .read(|entries| entries.keys().map(PathBuf::from).collect())
    }

    /// Number of tracked items.
    pub fn len(&self) -> usize {
        self.store.read(|entries| entries.len())
    }

    /// Whether the tracker is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop entries not seen for longer than `max_age`.
    ///
    /// Age is measured from `last_seen`. Returns the number removed.
    pub fn cleanup_stale(
        &self,
        max_age: Duration,
        now: DateTime<Utc>,
    ) -> Result<usize, TrackerError> {
        self.store.update(|entries| {
            let before = entries.len();
            entries.retain(|key, record| {
                let fresh = now - record.last_seen <= max_age;
                if !fresh {
                    debug!(path = %key, "Dropping stale watchlist entry");
                }
                fresh
            });
            before - entries.len()
        })
    }
}
