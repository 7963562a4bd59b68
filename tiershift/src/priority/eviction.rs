//! Eviction candidate selection.

use std::path::PathBuf;

use tracing::debug;

/// A cached file considered for eviction.
#[derive(Debug, Clone)]
pub struct EvictionCandidate {
    /// Cache-coordinate path.
    pub path: PathBuf,
    /// File size in bytes.
    pub size_bytes: u64,
    /// Priority score, 0–100.
    pub score: u8,
}

/// Select files to evict until `target_bytes` are covered.
///
/// Candidates are stable-sorted ascending by score (lower evicts first;
/// ties keep their original order), files at or above `min_priority` are
/// never evicted, and files that no longer exist are skipped. When the
/// evictable files cannot cover the target, all of them are returned.
pub fn select_eviction_candidates(
    mut candidates: Vec<EvictionCandidate>,
    target_bytes: u64,
    min_priority: u8,
) -> Vec<EvictionCandidate> {
    candidates.sort_by_key(|c| c.score);

    let mut selected = Vec::new();
    let mut accumulated: u64 = 0;

    for candidate in candidates {
        if accumulated >= target_bytes {
            break;
        }
        if candidate.score >= min_priority {
            // Sorted ascending, so nothing later is evictable either
            break;
        }
        if !candidate.path.exists() {
            debug!(path = %candidate.path.display(), "Skipping vanished eviction candidate");
            continue;
        }
        accumulated += candidate.size_bytes;
        selected.push(candidate);
    }

    if accumulated < target_bytes {
        debug!(
            accumulated_bytes = accumulated,
            target_bytes, "Evictable files do not cover the eviction target"
        );
    }

    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn candidate(dir: &TempDir, name: &str, size: usize, score: u8) -> EvictionCandidate {
        let path = dir.path().join(name);
        std::fs::write(&path, vec![0u8; size]).unwrap();
        EvictionCandidate {
            path,
            size_bytes: size as u64,
            score,
        }
    }

    #[test]
    fn lowest_scores_evict_first() {
        let temp_dir = TempDir::new().unwrap();
        let candidates = vec![
            candidate(&temp_dir, "high.mkv", 1000, 80),
            candidate(&temp_dir, "low.mkv", 1000, 10),
            candidate(&temp_dir, "mid.mkv", 1000, 40),
        ];

        let selected = select_eviction_candidates(candidates, 2000, 100);

        assert_eq!(selected.len(), 2);
        assert_eq!(selected[0].path.file_name().unwrap(), "low.mkv");
        assert_eq!(selected[1].path.file_name().unwrap(), "mid.mkv");
    }

    #[test]
    fn equal_scores_keep_original_order() {
        let temp_dir = TempDir::new().unwrap();
        let candidates = vec![
            candidate(&temp_dir, "first.mkv", 1000, 30),
            candidate(&temp_dir, "second.mkv", 1000, 30),
            candidate(&temp_dir, "third.mkv", 1000, 30),
        ];

        let selected = select_eviction_candidates(candidates, 3000, 100);

        let names: Vec<_> = selected
            .iter()
            .map(|c| c.path.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, ["first.mkv", "second.mkv", "third.mkv"]);
    }

    #[test]
    fn threshold_protects_high_priority_files() {
        let temp_dir = TempDir::new().unwrap();
        let candidates = vec![
            candidate(&temp_dir, "low.mkv", 1000, 10),
            candidate(&temp_dir, "at_threshold.mkv", 1000, 50),
            candidate(&temp_dir, "above.mkv", 1000, 70),
        ];

        let selected = select_eviction_candidates(candidates, 10_000, 50);

        // Only the below-threshold file is evictable, even short of target
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].path.file_name().unwrap(), "low.mkv");
    }

    #[test]
    fn covers_target_when_possible() {
        let temp_dir = TempDir::new().unwrap();
        let candidates = vec![
            candidate(&temp_dir, "a.mkv", 1500, 10),
            candidate(&temp_dir, "b.mkv", 1500, 20),
            candidate(&temp_dir, "c.mkv", 1500, 30),
        ];

        let selected = select_eviction_candidates(candidates, 2000, 100);

        let total: u64 = selected.iter().map(|c| c.size_bytes).sum();
        assert!(total >= 2000);
        assert_eq!(selected.len(), 2);
    }

    #[test]
    fn vanished_files_are_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let mut candidates = vec![candidate(&temp_dir, "real.mkv", 1000, 20)];
        candidates.insert(
            0,
            EvictionCandidate {
                path: temp_dir.path().join("vanished.mkv"),
                size_bytes: 1000,
                score: 5,
            },
        );

        let selected = select_eviction_candidates(candidates, 1000, 100);

        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].path.file_name().unwrap(), "real.mkv");
    }

    #[test]
    fn returns_all_evictable_when_underprovisioned() {
        let temp_dir = TempDir::new().unwrap();
        let candidates = vec![
            candidate(&temp_dir, "a.mkv", 500, 10),
            candidate(&temp_dir, "b.mkv", 500, 20),
        ];

        let selected = select_eviction_candidates(candidates, 10_000, 100);

        assert_eq!(selected.len(), 2);
    }
}
