//! JSON-file-backed map shared by the three trackers.
//!
//! Loaded once at startup, rewritten after every mutation. All mutating
//! access holds one mutex across the whole read-modify-write cycle, so
//! concurrent relocation workers serialize only on tracker updates, not on
//! copy I/O.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Tracker persistence errors.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// Failed to read or write a tracker file
    #[error("tracker file I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Tracker file contents are not valid JSON for the expected shape
    #[error("tracker file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A key→record map persisted as one JSON object.
pub(super) struct JsonStore<T> {
    path: PathBuf,
    entries: Mutex<HashMap<String, T>>,
}

impl<T: Serialize + DeserializeOwned + Clone> JsonStore<T> {
    /// Load the store from `path`. A missing file yields an empty store.
    pub(super) fn load(path: PathBuf) -> Result<Self, TrackerError> {
        let entries = read_map(&path)?;
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Create a store from entries already normalized by the caller.
    pub(super) fn with_entries(path: PathBuf, entries: HashMap<String, T>) -> Self {
        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    /// The backing file path.
    pub(super) fn path(&self) -> &Path {
        &self.path
    }

    /// Run a read-only closure over the entries.
    pub(super) fn read<R>(&self, f: impl FnOnce(&HashMap<String, T>) -> R) -> R {
        let entries = self.lock();
        f(&entries)
    }

    /// Run a mutating closure over the entries and rewrite the backing file.
    ///
    /// The mutex is held across the whole mutate-and-write cycle.
    pub(super) fn update<R>(
        &self,
        f: impl FnOnce(&mut HashMap<String, T>) -> R,
    ) -> Result<R, TrackerError> {
        let mut entries = self.lock();
        let result = f(&mut entries);
        write_map(&self.path, &entries)?;
        Ok(result)
    }

    /// Exact-key lookup, falling back to matching by filename alone.
    ///
    /// The fallback accommodates divergent path prefixes between the media
    /// server and this tool.
    pub(super) fn get(&self, key: &Path) -> Option<T> {
        let entries = self.lock();

        if let Some(record) = entries.get(&key_string(key)) {
            return Some(record.clone());
        }

        let filename = key.file_name()?.to_str()?;
        entries
            .iter()
            .find(|(k, _)| {
                Path::new(k)
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n == filename)
            })
            .map(|(_, record)| record.clone())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, T>> {
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Canonical string form of a tracker key.
pub(super) fn key_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Read a JSON object file into a map. Missing file → empty map.
pub(super) fn read_map<T: DeserializeOwned>(
    path: &Path,
) -> Result<HashMap<String, T>, TrackerError> {
    if !path.exists() {
        return Ok(HashMap::new());
    }

    let raw = std::fs::read_to_string(path).map_err(|source| TrackerError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    if raw.trim().is_empty() {
        return Ok(HashMap::new());
    }

    serde_json::from_str(&raw).map_err(|source| TrackerError::Corrupt {
        path: path.to_path_buf(),
        source,
    })
}

/// Rewrite a map as a pretty-printed JSON object file.
pub(super) fn write_map<T: Serialize>(
    path: &Path,
    entries: &HashMap<String, T>,
) -> Result<(), TrackerError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| TrackerError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    }

    let json = serde_json::to_string_pretty(entries).map_err(|source| TrackerError::Corrupt {
        path: path.to_path_buf(),
        source,
    })?;

    std::fs::write(path, json).map_err(|source| TrackerError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn load_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store: JsonStore<u32> = JsonStore::load(temp_dir.path().join("missing.json")).unwrap();
        assert_eq!(store.read(|e| e.len()), 0);
    }

    #[test]
    fn update_persists_and_reloads() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.json");

        let store: JsonStore<u32> = JsonStore::load(path.clone()).unwrap();
        store
            .update(|e| {
                e.insert("/media/a.mkv".to_string(), 7);
            })
            .unwrap();

        let reloaded: JsonStore<u32> = JsonStore::load(path).unwrap();
        assert_eq!(reloaded.get(Path::new("/media/a.mkv")), Some(7));
    }

    #[test]
    fn get_falls_back_to_filename_match() {
        let temp_dir = TempDir::new().unwrap();
        let store: JsonStore<u32> = JsonStore::load(temp_dir.path().join("store.json")).unwrap();
        store
            .update(|e| {
                e.insert("/data/tv/Show/Show - S01E01.mkv".to_string(), 3);
            })
            .unwrap();

        // Different prefix, same filename
        let hit = store.get(Path::new("/mnt/cache/tv/Show/Show - S01E01.mkv"));
        assert_eq!(hit, Some(3));

        let miss = store.get(Path::new("/mnt/cache/tv/Show/Show - S01E02.mkv"));
        assert_eq!(miss, None);
    }

    #[test]
    fn corrupt_file_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.json");
        std::fs::write(&path, "not json").unwrap();

        let result: Result<JsonStore<u32>, _> = JsonStore::load(path);
        assert!(matches!(result, Err(TrackerError::Corrupt { .. })));
    }

    #[test]
    fn empty_file_is_tolerated() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.json");
        std::fs::write(&path, "").unwrap();

        let store: JsonStore<u32> = JsonStore::load(path).unwrap();
        assert_eq!(store.read(|e| e.len()), 0);
    }
}
