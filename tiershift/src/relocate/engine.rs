//! The move/restore state machine.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::exclusion::ExclusionList;
use crate::mapping::{CacheTarget, PathTranslator};
use crate::tracker::{CacheSource, CacheTracker};

use super::backup::{
    backup_path, find_marker_by_identity, is_backup_marker, original_path, probe_absent,
    probe_exists,
};
use super::types::{Direction, MoveOutcome, RelocateError, RestoreCase};

/// Executes single-file moves between the array and cache tiers.
///
/// Shared state (the exclusion list and the cache tracker) is mutex-guarded
/// internally, so concurrent workers serialize only on those updates, never
/// on copy I/O.
pub struct RelocationEngine {
    translator: Arc<PathTranslator>,
    cache_tracker: Arc<CacheTracker>,
    exclusions: Arc<ExclusionList>,
}

impl RelocationEngine {
    /// Create an engine over the shared state.
    pub fn new(
        translator: Arc<PathTranslator>,
        cache_tracker: Arc<CacheTracker>,
        exclusions: Arc<ExclusionList>,
    ) -> Self {
        Self {
            translator,
            cache_tracker,
            exclusions,
        }
    }

    /// The path translator this engine routes through.
    pub fn translator(&self) -> &PathTranslator {
        &self.translator
    }

    /// Move one array file to cache.
    ///
    /// The array original is renamed to its backup marker, never deleted;
    /// the marker stays behind as proof that a verified cache copy exists.
    pub fn move_to_cache(
        &self,
        array_path: &Path,
        source: CacheSource,
    ) -> Result<MoveOutcome, RelocateError> {
        let cache_path = match self.translator.to_cache(array_path) {
            CacheTarget::Cacheable(path, _) => path,
            CacheTarget::NotCacheable => return Ok(MoveOutcome::Skipped),
        };

        if !array_path.exists() {
            if probe_exists(&cache_path) {
                // Already moved by an earlier run; make registration whole
                self.register(&cache_path, source)?;
                return Ok(MoveOutcome::Skipped);
            }
            return Err(RelocateError::StaleState(format!(
                "{} exists on neither tier",
                array_path.display()
            )));
        }

        let array_size = file_size(array_path)?;
        let marker = backup_path(array_path);

        // A leftover marker with a different size belongs to a superseded
        // generation of this file: clear it and its orphaned entries first.
        if marker.exists() && file_size(&marker)? != array_size {
            debug!(
                marker = %marker.display(),
                "Removing stale backup marker from superseded generation"
            );
            std::fs::remove_file(&marker).map_err(|e| RelocateError::from_io(e, &marker))?;
            self.unregister(&cache_path)?;
        }

        if let Some(parent) = cache_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| RelocateError::from_io(e, parent))?;
        }
        std::fs::copy(array_path, &cache_path)
            .map_err(|e| RelocateError::from_io(e, &cache_path))?;

        // The cache copy must be independently verified before the array
        // original is touched.
        if !probe_exists(&cache_path) {
            return Err(RelocateError::CopyVerificationFailed { path: cache_path });
        }
        let cache_size = file_size(&cache_path)?;
        if cache_size != array_size {
            std::fs::remove_file(&cache_path).ok();
            return Err(RelocateError::SizeMismatch {
                path: cache_path,
                expected: array_size,
                actual: cache_size,
            });
        }

        if let Err(error) = std::fs::rename(array_path, &marker) {
            // Array original untouched; drop the cache copy and report
            std::fs::remove_file(&cache_path).ok();
            return Err(RelocateError::from_io(error, array_path));
        }

        if !probe_absent(array_path) {
            // The rename did not take; the array copy is still live
            std::fs::remove_file(&cache_path).ok();
            return Err(RelocateError::RenameVerificationFailed {
                path: array_path.to_path_buf(),
            });
        }
        if !probe_exists(&marker) {
            // Original gone and no marker: the cache copy is now the only
            // copy, so protect it before reporting the inconsistency
            warn!(
                path = %array_path.display(),
                "Backup marker missing after rename, cache copy is sole copy"
            );
            self.register(&cache_path, source)?;
            return Err(RelocateError::RenameVerificationFailed {
                path: marker,
            });
        }

        self.register(&cache_path, source)?;
        info!(
            from = %array_path.display(),
            to = %cache_path.display(),
            bytes = array_size,
            "Moved file to cache"
        );

        Ok(MoveOutcome::Moved {
            direction: Direction::ToCache,
            bytes: array_size,
        })
    }

    /// Restore one cache file to the array.
    ///
    /// The cache copy is deleted only if the array file is confirmed
    /// present afterwards; otherwise the cache copy is retained and the
    /// operation reports failure.
    pub fn restore_to_array(&self, cache_path: &Path) -> Result<MoveOutcome, RelocateError> {
        let (array_path, _) = self
            .translator
            .to_array_from_cache(cache_path)
            .ok_or_else(|| {
                RelocateError::StaleState(format!(
                    "{} matches no cache mapping",
                    cache_path.display()
                ))
            })?;

        if !cache_path.exists() {
            self.unregister(cache_path)?;
            if array_path.exists() {
                // Already restored by an earlier run
                return Ok(MoveOutcome::Skipped);
            }
            return Err(RelocateError::StaleState(format!(
                "{} exists on neither tier",
                cache_path.display()
            )));
        }

        let cache_size = file_size(cache_path)?;
        let marker = backup_path(&array_path);

        let case = if marker.exists() {
            if file_size(&marker)? == cache_size {
                RestoreCase::FastRename
            } else {
                RestoreCase::InPlaceUpgrade
            }
        } else if let Some(parent) = array_path.parent() {
            match find_marker_by_identity(parent, &array_path) {
                Some(_) => RestoreCase::IdentityUpgrade,
                None => RestoreCase::NoMarker,
            }
        } else {
            RestoreCase::NoMarker
        };

        match case {
            RestoreCase::FastRename => {
                std::fs::rename(&marker, &array_path)
                    .map_err(|e| RelocateError::from_io(e, &marker))?;
                if !probe_exists(&array_path) {
                    return Err(RelocateError::RenameVerificationFailed { path: array_path });
                }
            }
            RestoreCase::InPlaceUpgrade => {
                // The cache copy supersedes the marker's generation
                std::fs::remove_file(&marker)
                    .map_err(|e| RelocateError::from_io(e, &marker))?;
                self.copy_to_array(cache_path, &array_path, cache_size)?;
            }
            RestoreCase::IdentityUpgrade => {
                if let Some(parent) = array_path.parent() {
                    if let Some(stale) = find_marker_by_identity(parent, &array_path) {
                        debug!(
                            marker = %stale.display(),
                            "Removing stale marker for superseded release"
                        );
                        std::fs::remove_file(&stale)
                            .map_err(|e| RelocateError::from_io(e, &stale))?;
                    }
                }
                self.copy_to_array(cache_path, &array_path, cache_size)?;
            }
            RestoreCase::NoMarker => {
                self.copy_to_array(cache_path, &array_path, cache_size)?;
            }
        }

        // Terminal step, all cases: delete the cache copy only if the
        // array file is confirmed present.
        if !probe_exists(&array_path) {
            return Err(RelocateError::CopyVerificationFailed { path: array_path });
        }

        std::fs::remove_file(cache_path).map_err(|e| RelocateError::from_io(e, cache_path))?;
        self.unregister(cache_path)?;
        remove_empty_parents(cache_path);

        info!(
            from = %cache_path.display(),
            to = %array_path.display(),
            bytes = cache_size,
            case = ?case,
            "Restored file to array"
        );

        Ok(MoveOutcome::Moved {
            direction: Direction::ToArray,
            bytes: cache_size,
        })
    }

    /// Defensively re-register a wanted file that is already on cache.
    ///
    /// A file we never moved is registered as pre-existing. Removes a stray
    /// array copy under the original name once the cache copy is verified,
    /// but only when the sizes agree; a differing stray may be an upgrade
    /// that must not be destroyed.
    pub fn refresh_cached(
        &self,
        cache_path: &Path,
        stray_array_path: Option<&Path>,
    ) -> Result<MoveOutcome, RelocateError> {
        if !probe_exists(cache_path) {
            return Err(RelocateError::StaleState(format!(
                "{} vanished before re-registration",
                cache_path.display()
            )));
        }

        self.register(cache_path, CacheSource::PreExisting)?;

        if let Some(stray) = stray_array_path {
            if stray.exists() {
                let cache_size = file_size(cache_path)?;
                if file_size(stray)? == cache_size {
                    std::fs::remove_file(stray)
                        .map_err(|e| RelocateError::from_io(e, stray))?;
                    debug!(path = %stray.display(), "Removed stray array copy of cached file");
                } else {
                    warn!(
                        path = %stray.display(),
                        "Array copy differs from cache copy, leaving both in place"
                    );
                }
            }
        }

        Ok(MoveOutcome::Skipped)
    }

    /// Recover backup markers whose cache copy has vanished.
    ///
    /// Walks the array subtrees of cacheable mappings; a marker without a
    /// live cache copy is the only surviving copy, so it is renamed back to
    /// its original name. Returns the number of markers recovered.
    pub fn recover_markers(&self) -> Result<usize, RelocateError> {
        let mut recovered = 0;

        let roots: Vec<PathBuf> = self
            .translator
            .mappings()
            .iter()
            .filter(|m| m.enabled && m.cacheable && m.cache_prefix.is_some())
            .map(|m| m.array_prefix.clone())
            .collect();

        for root in roots {
            let mut markers = Vec::new();
            collect_markers(&root, &mut markers);

            for marker in markers {
                let original = match original_path(&marker) {
                    Some(path) => path,
                    None => continue,
                };
                let cache_live = match self.translator.to_cache(&original) {
                    CacheTarget::Cacheable(cache_path, _) => cache_path.exists(),
                    CacheTarget::NotCacheable => false,
                };
                if cache_live || original.exists() {
                    continue;
                }

                std::fs::rename(&marker, &original)
                    .map_err(|e| RelocateError::from_io(e, &marker))?;
                warn!(
                    path = %original.display(),
                    "Recovered array file from orphaned backup marker"
                );
                recovered += 1;
            }
        }

        Ok(recovered)
    }

    /// Copy cache → array and verify the size, deleting a bad copy.
    fn copy_to_array(
        &self,
        cache_path: &Path,
        array_path: &Path,
        cache_size: u64,
    ) -> Result<(), RelocateError> {
        if let Some(parent) = array_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| RelocateError::from_io(e, parent))?;
        }
        std::fs::copy(cache_path, array_path)
            .map_err(|e| RelocateError::from_io(e, array_path))?;

        let actual = file_size(array_path)?;
        if actual != cache_size {
            // Non-destructive failure: drop the bad array copy, keep cache
            std::fs::remove_file(array_path).ok();
            return Err(RelocateError::SizeMismatch {
                path: array_path.to_path_buf(),
                expected: cache_size,
                actual,
            });
        }
        Ok(())
    }

    fn register(&self, cache_path: &Path, source: CacheSource) -> Result<(), RelocateError> {
        self.exclusions.add(cache_path)?;
        self.cache_tracker.record(cache_path, source, Utc::now())?;
        Ok(())
    }

    fn unregister(&self, cache_path: &Path) -> Result<(), RelocateError> {
        self.cache_tracker.remove(cache_path)?;
        self.exclusions.remove(cache_path)?;
        Ok(())
    }
}

fn file_size(path: &Path) -> Result<u64, RelocateError> {
    std::fs::metadata(path)
        .map(|m| m.len())
        .map_err(|e| RelocateError::from_io(e, path))
}

/// Remove now-empty parent directories left behind on the cache tier.
fn remove_empty_parents(path: &Path) {
    let mut current = path.parent();
    while let Some(dir) = current {
        // remove_dir fails on non-empty directories, which ends the walk
        if std::fs::remove_dir(dir).is_err() {
            break;
        }
        current = dir.parent();
    }
}

/// Recursively collect backup markers under a directory.
fn collect_markers(dir: &Path, markers: &mut Vec<PathBuf>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return,
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_markers(&path, markers);
        } else if is_backup_marker(&path) {
            markers.push(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::PathMapping;
    use tempfile::TempDir;

    struct Fixture {
        _temp_dir: TempDir,
        array_root: PathBuf,
        cache_root: PathBuf,
        engine: RelocationEngine,
        cache_tracker: Arc<CacheTracker>,
        exclusions: Arc<ExclusionList>,
    }

    fn fixture() -> Fixture {
        let temp_dir = TempDir::new().unwrap();
        let array_root = temp_dir.path().join("array");
        let cache_root = temp_dir.path().join("cache");
        std::fs::create_dir_all(&array_root).unwrap();
        std::fs::create_dir_all(&cache_root).unwrap();

        let translator = Arc::new(PathTranslator::new(vec![PathMapping {
            name: "media".to_string(),
            media_prefix: temp_dir.path().join("media"),
            array_prefix: array_root.clone(),
            cache_prefix: Some(cache_root.clone()),
            cacheable: true,
            enabled: true,
        }]));
        let cache_tracker =
            Arc::new(CacheTracker::load(temp_dir.path().join("cache.json")).unwrap());
        let exclusions =
            Arc::new(ExclusionList::load(temp_dir.path().join("exclusions.txt")).unwrap());

        let engine = RelocationEngine::new(
            translator,
            Arc::clone(&cache_tracker),
            Arc::clone(&exclusions),
        );

        Fixture {
            array_root,
            cache_root,
            engine,
            cache_tracker,
            exclusions,
            _temp_dir: temp_dir,
        }
    }

    #[test]
    fn move_to_cache_leaves_backup_marker() {
        let fx = fixture();
        let array_file = fx.array_root.join("Heat (1995).mkv");
        std::fs::write(&array_file, b"movie-bytes").unwrap();

        let outcome = fx
            .engine
            .move_to_cache(&array_file, CacheSource::Watchlist)
            .unwrap();
        assert_eq!(outcome.bytes(), 11);

        let cache_file = fx.cache_root.join("Heat (1995).mkv");
        assert!(cache_file.exists());
        assert!(!array_file.exists());
        assert!(backup_path(&array_file).exists());
        assert!(fx.exclusions.contains(&cache_file));
        assert!(fx.cache_tracker.get(&cache_file).is_some());
    }

    #[test]
    fn move_to_cache_twice_is_idempotent() {
        let fx = fixture();
        let array_file = fx.array_root.join("Heat (1995).mkv");
        std::fs::write(&array_file, b"movie-bytes").unwrap();

        fx.engine
            .move_to_cache(&array_file, CacheSource::OnDeck)
            .unwrap();
        let cache_file = fx.cache_root.join("Heat (1995).mkv");
        let first_record = fx.cache_tracker.get(&cache_file).unwrap();

        // Second call: array file is gone, cache copy exists
        let outcome = fx
            .engine
            .move_to_cache(&array_file, CacheSource::Watchlist)
            .unwrap();
        assert_eq!(outcome, MoveOutcome::Skipped);

        // One record (original timestamp and source), one exclusion entry
        assert_eq!(fx.cache_tracker.len(), 1);
        assert_eq!(fx.exclusions.len(), 1);
        assert_eq!(fx.cache_tracker.get(&cache_file).unwrap(), first_record);
        assert!(cache_file.exists());
    }

    #[test]
    fn move_to_cache_skips_non_cacheable_paths() {
        let fx = fixture();
        let outside = fx._temp_dir.path().join("outside.mkv");
        std::fs::write(&outside, b"data").unwrap();

        let outcome = fx
            .engine
            .move_to_cache(&outside, CacheSource::OnDeck)
            .unwrap();
        assert_eq!(outcome, MoveOutcome::Skipped);
        assert!(outside.exists());
    }

    #[test]
    fn move_to_cache_replaces_superseded_marker() {
        let fx = fixture();
        let array_file = fx.array_root.join("Show - S01E01.mkv");
        let marker = backup_path(&array_file);

        // Stale marker from an older, smaller generation plus orphaned
        // registration entries
        std::fs::write(&marker, b"old").unwrap();
        let cache_file = fx.cache_root.join("Show - S01E01.mkv");
        fx.exclusions.add(&cache_file).unwrap();
        fx.cache_tracker
            .record(&cache_file, CacheSource::Unknown, Utc::now())
            .unwrap();

        std::fs::write(&array_file, b"new-longer-content").unwrap();
        fx.engine
            .move_to_cache(&array_file, CacheSource::OnDeck)
            .unwrap();

        // The marker now reflects the new generation
        assert_eq!(std::fs::read(&marker).unwrap(), b"new-longer-content");
        let record = fx.cache_tracker.get(&cache_file).unwrap();
        assert_eq!(record.source, CacheSource::OnDeck);
    }

    #[test]
    fn restore_fast_renames_matching_marker() {
        let fx = fixture();
        let array_file = fx.array_root.join("Heat (1995).mkv");
        std::fs::write(&array_file, b"movie-bytes").unwrap();
        fx.engine
            .move_to_cache(&array_file, CacheSource::Watchlist)
            .unwrap();

        let cache_file = fx.cache_root.join("Heat (1995).mkv");
        let outcome = fx.engine.restore_to_array(&cache_file).unwrap();
        assert_eq!(outcome.bytes(), 11);

        assert!(array_file.exists());
        assert!(!cache_file.exists());
        assert!(!backup_path(&array_file).exists());
        assert!(fx.cache_tracker.get(&cache_file).is_none());
        assert!(!fx.exclusions.contains(&cache_file));
    }

    #[test]
    fn restore_in_place_upgrade_copies_new_content() {
        let fx = fixture();
        let array_file = fx.array_root.join("Heat (1995).mkv");
        let marker = backup_path(&array_file);
        let cache_file = fx.cache_root.join("Heat (1995).mkv");

        // Marker holds the old generation; the cache copy was upgraded
        std::fs::write(&marker, b"old").unwrap();
        std::fs::write(&cache_file, b"upgraded-content").unwrap();
        fx.cache_tracker
            .record(&cache_file, CacheSource::Watchlist, Utc::now())
            .unwrap();

        fx.engine.restore_to_array(&cache_file).unwrap();

        assert_eq!(std::fs::read(&array_file).unwrap(), b"upgraded-content");
        assert!(!marker.exists());
        assert!(!cache_file.exists());
    }

    #[test]
    fn restore_upgrade_detection_matches_old_quality_tag() {
        let fx = fixture();
        // Old 720p generation left its marker behind
        let old_marker = fx.array_root.join("Show - S01E01 - x [720p].mkv.tsbak");
        std::fs::write(&old_marker, b"720p-bytes").unwrap();

        // The cache holds the upgraded 1080p release under a new name
        let cache_file = fx.cache_root.join("Show - S01E01 - x [1080p].mkv");
        std::fs::write(&cache_file, b"1080p-longer-bytes").unwrap();

        fx.engine.restore_to_array(&cache_file).unwrap();

        let new_array = fx.array_root.join("Show - S01E01 - x [1080p].mkv");
        assert!(new_array.exists());
        assert!(!old_marker.exists());
        assert!(!cache_file.exists());
        // Never two live copies
        assert!(!fx.array_root.join("Show - S01E01 - x [720p].mkv").exists());
    }

    #[test]
    fn restore_without_marker_copies_back() {
        let fx = fixture();
        let cache_file = fx.cache_root.join("Heat (1995).mkv");
        std::fs::write(&cache_file, b"movie-bytes").unwrap();

        fx.engine.restore_to_array(&cache_file).unwrap();

        assert!(fx.array_root.join("Heat (1995).mkv").exists());
        assert!(!cache_file.exists());
    }

    #[test]
    fn restore_keeps_cache_copy_when_array_copy_fails() {
        let fx = fixture();
        // Sabotage the array destination: a file where a directory must go
        let blocked_dir = fx.array_root.join("Show");
        std::fs::write(&blocked_dir, b"not a directory").unwrap();

        let cache_dir = fx.cache_root.join("Show");
        std::fs::create_dir_all(&cache_dir).unwrap();
        let cache_file = cache_dir.join("Show - S01E01.mkv");
        std::fs::write(&cache_file, b"episode-bytes").unwrap();
        fx.cache_tracker
            .record(&cache_file, CacheSource::OnDeck, Utc::now())
            .unwrap();
        fx.exclusions.add(&cache_file).unwrap();

        let result = fx.engine.restore_to_array(&cache_file);
        assert!(result.is_err());

        // The single most important invariant: the cache copy survives a
        // failed restore, and its registration stays intact
        assert!(cache_file.exists());
        assert!(fx.cache_tracker.get(&cache_file).is_some());
        assert!(fx.exclusions.contains(&cache_file));
    }

    #[test]
    fn restore_of_vanished_cache_file_reports_stale_state() {
        let fx = fixture();
        let cache_file = fx.cache_root.join("Gone.mkv");
        fx.cache_tracker
            .record(&cache_file, CacheSource::Watchlist, Utc::now())
            .unwrap();
        fx.exclusions.add(&cache_file).unwrap();

        let result = fx.engine.restore_to_array(&cache_file);
        assert!(matches!(result, Err(RelocateError::StaleState(_))));

        // Stale entries are cleared
        assert!(fx.cache_tracker.get(&cache_file).is_none());
        assert!(!fx.exclusions.contains(&cache_file));
    }

    #[test]
    fn restore_already_restored_file_is_a_skip() {
        let fx = fixture();
        let array_file = fx.array_root.join("Heat (1995).mkv");
        std::fs::write(&array_file, b"movie").unwrap();

        // Tracker claims a cache copy that was already restored
        let cache_file = fx.cache_root.join("Heat (1995).mkv");
        fx.cache_tracker
            .record(&cache_file, CacheSource::Watchlist, Utc::now())
            .unwrap();

        let outcome = fx.engine.restore_to_array(&cache_file).unwrap();
        assert_eq!(outcome, MoveOutcome::Skipped);
        assert!(array_file.exists());
    }

    #[test]
    fn restore_cleans_empty_cache_directories() {
        let fx = fixture();
        let cache_dir = fx.cache_root.join("Show").join("Season 01");
        std::fs::create_dir_all(&cache_dir).unwrap();
        let cache_file = cache_dir.join("Show - S01E01.mkv");
        std::fs::write(&cache_file, b"episode").unwrap();

        fx.engine.restore_to_array(&cache_file).unwrap();

        assert!(!cache_dir.exists());
        assert!(!fx.cache_root.join("Show").exists());
    }

    #[test]
    fn refresh_registers_and_removes_identical_stray() {
        let fx = fixture();
        let cache_file = fx.cache_root.join("Heat (1995).mkv");
        let stray = fx.array_root.join("Heat (1995).mkv");
        std::fs::write(&cache_file, b"movie-bytes").unwrap();
        std::fs::write(&stray, b"movie-bytes").unwrap();

        fx.engine
            .refresh_cached(&cache_file, Some(&stray))
            .unwrap();

        assert!(!stray.exists());
        assert!(cache_file.exists());
        // Never moved by us: registered as a pre-existing cache resident
        let record = fx.cache_tracker.get(&cache_file).unwrap();
        assert_eq!(record.source, CacheSource::PreExisting);
        assert!(fx.exclusions.contains(&cache_file));
    }

    #[test]
    fn refresh_leaves_differing_stray_alone() {
        let fx = fixture();
        let cache_file = fx.cache_root.join("Heat (1995).mkv");
        let stray = fx.array_root.join("Heat (1995).mkv");
        std::fs::write(&cache_file, b"old-bytes").unwrap();
        std::fs::write(&stray, b"much-longer-upgraded-bytes").unwrap();

        fx.engine
            .refresh_cached(&cache_file, Some(&stray))
            .unwrap();

        // A differing array copy may be an upgrade; both are kept
        assert!(stray.exists());
        assert!(cache_file.exists());
    }

    #[test]
    fn recover_markers_restores_orphaned_originals() {
        let fx = fixture();
        let array_file = fx.array_root.join("Show").join("Show - S01E01.mkv");
        std::fs::create_dir_all(array_file.parent().unwrap()).unwrap();
        std::fs::write(&array_file, b"episode").unwrap();
        fx.engine
            .move_to_cache(&array_file, CacheSource::OnDeck)
            .unwrap();

        // Simulate losing the cache copy out-of-band
        let cache_file = fx.cache_root.join("Show").join("Show - S01E01.mkv");
        std::fs::remove_file(&cache_file).unwrap();

        let recovered = fx.engine.recover_markers().unwrap();
        assert_eq!(recovered, 1);
        assert!(array_file.exists());
        assert!(!backup_path(&array_file).exists());

        // With the cache copy live, markers are left alone
        std::fs::write(&array_file, b"episode").unwrap();
        fx.engine
            .move_to_cache(&array_file, CacheSource::OnDeck)
            .unwrap();
        assert_eq!(fx.engine.recover_markers().unwrap(), 0);
    }
}
