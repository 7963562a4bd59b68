//! Exclusion list shared with the external space-reclaiming mover.
//!
//! A flat newline-delimited text file of cache-coordinate absolute paths,
//! declaring "this cache file is intentionally placed, do not reclaim it."
//! Additions append to the file; cleanup passes rewrite it wholesale. One
//! mutex guards each whole read-modify-write cycle.

use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;
use tracing::debug;

/// Exclusion list errors.
#[derive(Debug, Error)]
pub enum ExclusionError {
    /// Failed to read or write the exclusion file
    #[error("exclusion file I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The durable set of cache paths protected from external reclaiming.
pub struct ExclusionList {
    path: PathBuf,
    entries: Mutex<BTreeSet<PathBuf>>,
}

impl ExclusionList {
    /// Load the list from `path`. A missing file yields an empty list.
    pub fn load(path: PathBuf) -> Result<Self, ExclusionError> {
        let entries = if path.exists() {
            let raw = std::fs::read_to_string(&path).map_err(|source| ExclusionError::Io {
                path: path.clone(),
                source,
            })?;
            raw.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(PathBuf::from)
                .collect()
        } else {
            BTreeSet::new()
        };

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Backing file path.
    pub fn file_path(&self) -> &Path {
        &self.path
    }

    /// Add a cache path to the list.
    ///
    /// Appends to the file; already-present paths are a no-op. Returns
    /// `true` if the path was newly added.
    pub fn add(&self, cache_path: &Path) -> Result<bool, ExclusionError> {
        let mut entries = self.lock();
        if !entries.insert(cache_path.to_path_buf()) {
            return Ok(false);
        }

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ExclusionError::Io {
                path: self.path.clone(),
                source,
            })?;
        }

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| ExclusionError::Io {
                path: self.path.clone(),
                source,
            })?;
        writeln!(file, "{}", cache_path.display()).map_err(|source| ExclusionError::Io {
            path: self.path.clone(),
            source,
        })?;

        Ok(true)
    }

    /// Remove a cache path, rewriting the file.
    ///
    /// Returns `true` if the path was present.
    pub fn remove(&self, cache_path: &Path) -> Result<bool, ExclusionError> {
        let mut entries = self.lock();
        if !entries.remove(cache_path) {
            return Ok(false);
        }
        self.rewrite(&entries)?;
        Ok(true)
    }

    /// Whether a cache path is excluded.
    pub fn contains(&self, cache_path: &Path) -> bool {
        self.lock().contains(cache_path)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drop entries whose cache file has vanished and rewrite wholesale.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_missing(&self) -> Result<usize, ExclusionError> {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|path| {
            let exists = path.exists();
            if !exists {
                debug!(path = %path.display(), "Dropping exclusion entry for vanished file");
            }
            exists
        });
        let removed = before - entries.len();
        if removed > 0 {
            self.rewrite(&entries)?;
        }
        Ok(removed)
    }

    fn rewrite(&self, entries: &BTreeSet<PathBuf>) -> Result<(), ExclusionError> {
        let mut out = String::new();
        for path in entries {
            out.push_str(&path.display().to_string());
            out.push('\n');
        }
        std::fs::write(&self.path, out).map_err(|source| ExclusionError::Io {
            path: self.path.clone(),
            source,
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeSet<PathBuf>> {
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
