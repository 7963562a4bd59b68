//! On-deck membership tracker.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};

use super::record::{EpisodeInfo, OnDeckRecord};
use super::store::{key_string, JsonStore, TrackerError};

/// Tracks which media paths are on-deck, keyed by media path.
///
/// On-deck membership has no meaning across runs: the whole map is cleared
/// at the start of every run before being repopulated from the media
/// server's current answer.
pub struct OnDeckTracker {
    store: JsonStore<OnDeckRecord>,
}

impl OnDeckTracker {
    /// Load the tracker from its backing file.
    pub fn load(path: PathBuf) -> Result<Self, TrackerError> {
        Ok(Self {
            store: JsonStore::load(path)?,
        })
    }

    /// Clear all records. Called at the start of every run.
    pub fn clear(&self) -> Result<(), TrackerError> {
        self.store.update(|entries| entries.clear())
    }

    /// Record an on-deck observation.
    ///
    /// `is_current` marks the user's current episode as opposed to one
    /// pre-fetched ahead of it; only current users enter `ondeck_users`.
    pub fn observe(
        &self,
        media_path: &Path,
        user: &str,
        is_current: bool,
        episode_info: Option<EpisodeInfo>,
        now: DateTime<Utc>,
    ) -> Result<(), TrackerError> {
        let key = key_string(media_path);
        self.store.update(|entries| {
            let record = entries.entry(key).or_insert_with(|| OnDeckRecord {
                users: Default::default(),
                ondeck_users: Default::default(),
                last_seen: now,
                episode_info: None,
            });
            record.users.insert(user.to_string());
            if is_current {
                record.ondeck_users.insert(user.to_string());
            }
            record.last_seen = now;
            if let Some(mut info) = episode_info {
                // Current-episode status sticks once any user holds it
                info.is_current_ondeck = info.is_current_ondeck
                    || record
                        .episode_info
                        .as_ref()
                        .is_some_and(|existing| existing.is_current_ondeck);
                record.episode_info = Some(info);
            }
        })
    }

    /// Look up a record, falling back to filename-only matching.
    pub fn get(&self, path: &Path) -> Option<OnDeckRecord> {
        self.store.get(path)
    }

    /// Remove a record after the file is relocated.
    pub fn remove(&self, media_path: &Path) -> Result<Option<OnDeckRecord>, TrackerError> {
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

    /// The current episode coordinates for a show, per its on-deck records.
    ///
    /// Scans for the record marked current for `show` and returns its
    /// season/episode, used to measure how far ahead a pre-fetched episode
    /// sits.
    pub fn current_episode(&self, show: &str) -> Option<(u32, u32)> {
        self.store.read(|entries| {
            entries
                .values()
                .filter_map(|record| record.episode_info.as_ref())
                .filter(|info| info.is_current_ondeck && info.show == show)
                .map(|info| (info.season, info.episode))
                .min()
        })
    }

    /// Drop entries not seen for longer than `max_age`, measured from
    /// `last_seen`. Returns the number removed.
    pub fn cleanup_stale(
        &self,
        max_age: Duration,
        now: DateTime<Utc>,
    ) -> Result<usize, TrackerError> {
        self.store.update(|entries| {
            let before = entries.len();
            entries.retain(|_, record| now - record.last_seen <= max_age);
            before - entries.len()
        })
    }
}
