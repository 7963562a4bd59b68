//! Cache timestamp tracker.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::debug;

use super::record::{CacheSource, CachedFileRecord, CachedFileShape};
use super::store::{key_string, read_map, JsonStore, TrackerError};

/// Records when and why each file landed on cache, keyed by cache path.
///
/// A key exists here iff the file currently also exists physically on cache
/// (modulo a bounded window during an in-flight move).
pub struct CacheTracker {
    store: JsonStore<CachedFileRecord>,
}

impl CacheTracker {
    /// Load the tracker, transparently upgrading legacy bare-timestamp
    /// entries to the structured record shape.
    pub fn load(path: PathBuf) -> Result<Self, TrackerError> {
        let shapes: HashMap<String, CachedFileShape> = read_map(&path)?;
        let entries = shapes
            .into_iter()
            .map(|(k, shape)| (k, shape.normalize()))
            .collect();

        Ok(Self {
            store: JsonStore::with_entries(path, entries),
        })
    }

    /// Backing file path.
    pub fn file_path(&self) -> &Path {
        self.store.path()
    }

    /// Record a file as cached.
    ///
    /// Re-caching an already-tracked path is a no-op for the timestamp: the
    /// original record is never overwritten. Returns `true` if a record was
    /// created.
    pub fn record(
        &self,
        cache_path: &Path,
        source: CacheSource,
        now: DateTime<Utc>,
    ) -> Result<bool, TrackerError> {
        let key = key_string(cache_path);
        self.store.update(|entries| {
            if entries.contains_key(&key) {
                return false;
            }
            entries.insert(
                key.clone(),
                CachedFileRecord {
                    cached_at: now,
                    source,
                },
            );
            true
        })
    }

    /// Look up a record, falling back to filename-only matching.
    pub fn get(&self, path: &Path) -> Option<CachedFileRecord> {
        self.store.get(path)
    }

    /// Remove a record after the file is relocated back to the array.
    pub fn remove(&self, cache_path: &Path) -> Result<Option<CachedFileRecord>, TrackerError> {
        let key = key_string(cache_path);
        self.store.update(|entries| entries.remove(&key))
    }

    /// All tracked cache paths.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.store
            .read(|entries| entries.keys().map(PathBuf::from).collect())
    }

    /// Number of tracked files.
    pub fn len(&self) -> usize {
        self.store.read(|entries| entries.len())
    }

    /// Whether the tracker is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop entries whose cache file has vanished.
    ///
    /// These are stale state: the tracker claims a cached copy that no
    /// longer exists. Returns the number of entries removed.
    pub fn cleanup_missing(&self) -> Result<usize, TrackerError> {
        self.store.update(|entries| {
            let before = entries.len();
            entries.retain(|key, _| {
                let exists = Path::new(key).exists();
                if !exists {
                    debug!(path = %key, "Dropping cache record for vanished file");
                }
                exists
            });
            before - entries.len()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn tracker(dir: &TempDir) -> CacheTracker {
        CacheTracker::load(dir.path().join("cache_tracker.json")).unwrap()
    }

    #[test]
    fn record_creates_entry_once() {
        let temp_dir = TempDir::new().unwrap();
        let t = tracker(&temp_dir);
        let path = Path::new("/mnt/cache/tv/Show - S01E01.mkv");
        let first = Utc::now();

        assert!(t.record(path, CacheSource::OnDeck, first).unwrap());

        // Second registration is a no-op for the timestamp
        let later = first + chrono::Duration::hours(6);
        assert!(!t.record(path, CacheSource::Watchlist, later).unwrap());

        let record = t.get(path).unwrap();
        assert_eq!(record.cached_at.timestamp(), first.timestamp());
        assert_eq!(record.source, CacheSource::OnDeck);
    }

    #[test]
    fn remove_deletes_entry() {
        let temp_dir = TempDir::new().unwrap();
        let t = tracker(&temp_dir);
        let path = Path::new("/mnt/cache/movies/Heat.mkv");

        t.record(path, CacheSource::Watchlist, Utc::now()).unwrap();
        assert_eq!(t.len(), 1);

        let removed = t.remove(path).unwrap();
        assert!(removed.is_some());
        assert!(t.is_empty());
        assert!(t.get(path).is_none());
    }

    #[test]
    fn survives_reload() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cache_tracker.json");

        {
            let t = CacheTracker::load(path.clone()).unwrap();
            t.record(
                Path::new("/mnt/cache/movies/Heat.mkv"),
                CacheSource::PreExisting,
                Utc::now(),
            )
            .unwrap();
        }

        let t = CacheTracker::load(path).unwrap();
        assert_eq!(t.len(), 1);
        let record = t.get(Path::new("/mnt/cache/movies/Heat.mkv")).unwrap();
        assert_eq!(record.source, CacheSource::PreExisting);
    }

    #[test]
    fn legacy_bare_timestamps_upgrade_on_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cache_tracker.json");
        std::fs::write(
            &path,
            r#"{"/mnt/cache/movies/Old.mkv": 1700000000,
                "/mnt/cache/movies/New.mkv": {"cached_at": 1710000000, "source": "ondeck"}}"#,
        )
        .unwrap();

        let t = CacheTracker::load(path).unwrap();

        let old = t.get(Path::new("/mnt/cache/movies/Old.mkv")).unwrap();
        assert_eq!(old.cached_at.timestamp(), 1_700_000_000);
        assert_eq!(old.source, CacheSource::Unknown);

        let new = t.get(Path::new("/mnt/cache/movies/New.mkv")).unwrap();
        assert_eq!(new.source, CacheSource::OnDeck);
    }

    #[test]
    fn cleanup_missing_drops_vanished_files() {
        let temp_dir = TempDir::new().unwrap();
        let t = tracker(&temp_dir);

        // One real file, one vanished
        let real = temp_dir.path().join("real.mkv");
        std::fs::write(&real, b"data").unwrap();

        t.record(&real, CacheSource::OnDeck, Utc::now()).unwrap();
        t.record(
            Path::new("/mnt/cache/tv/vanished.mkv"),
            CacheSource::OnDeck,
            Utc::now(),
        )
        .unwrap();

        let removed = t.cleanup_missing().unwrap();
        assert_eq!(removed, 1);
        assert_eq!(t.len(), 1);
        assert!(t.get(&real).is_some());
    }
}
