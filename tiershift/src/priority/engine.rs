//! Priority engine wiring tracker state to scores and eviction choices.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::identity;
use crate::tracker::{CacheSource, CacheTracker, CachedFileRecord, OnDeckTracker, WatchlistTracker};

use super::eviction::{select_eviction_candidates, EvictionCandidate};
use super::score::{score, ScoreContext};

/// Priority engine configuration.
#[derive(Debug, Clone)]
pub struct PriorityConfig {
    /// Episodes the query layer pre-fetches ahead of the current one.
    pub prefetch_count: u32,
    /// Files scoring at or above this are never evicted.
    pub min_priority: u8,
}

impl Default for PriorityConfig {
    fn default() -> Self {
        Self {
            prefetch_count: 5,
            min_priority: 50,
        }
    }
}

/// Scores cached files from tracker state and selects eviction candidates.
pub struct PriorityEngine {
    cache: Arc<CacheTracker>,
    watchlist: Arc<WatchlistTracker>,
    ondeck: Arc<OnDeckTracker>,
    config: PriorityConfig,
}

impl PriorityEngine {
    /// Create an engine over the three trackers.
    pub fn new(
        cache: Arc<CacheTracker>,
        watchlist: Arc<WatchlistTracker>,
        ondeck: Arc<OnDeckTracker>,
        config: PriorityConfig,
    ) -> Self {
        Self {
            cache,
            watchlist,
            ondeck,
            config,
        }
    }

    /// Score one cached file.
    ///
    /// Watchlist and on-deck lookups fall back to filename matching, since
    /// their keys are media coordinates while the cache tracker keys are
    /// cache coordinates.
    pub fn score_path(&self, cache_path: &Path, now: DateTime<Utc>) -> u8 {
        let cached = self.cache.get(cache_path).unwrap_or(CachedFileRecord {
            cached_at: now,
            source: CacheSource::PreExisting,
        });
        let watchlist = self.watchlist.get(cache_path);
        let ondeck = self.ondeck.get(cache_path);

        let current_episode = ondeck
            .as_ref()
            .and_then(|record| record.episode_info.as_ref())
            .and_then(|info| self.ondeck.current_episode(&info.show))
            .or_else(|| {
                identity::episode_marker(&identity::media_identity(cache_path))
                    .map(|_| identity::show_key(cache_path))
                    .and_then(|show| self.ondeck.current_episode(&show))
            });

        score(&ScoreContext {
            cached: &cached,
            watchlist: watchlist.as_ref(),
            ondeck: ondeck.as_ref(),
            current_episode,
            prefetch_count: self.config.prefetch_count,
            now,
        })
    }

    /// Select eviction candidates covering `target_bytes`.
    ///
    /// Scores every tracked cache file, stats its size, and applies the
    /// selection rules (ascending score, threshold, existence).
    pub fn eviction_candidates(&self, target_bytes: u64, now: DateTime<Utc>) -> Vec<EvictionCandidate> {
        let candidates = self
            .cache
            .paths()
            .into_iter()
            .filter_map(|path| {
                let size_bytes = std::fs::metadata(&path).ok()?.len();
                let score = self.score_path(&path, now);
                Some(EvictionCandidate {
                    path,
                    size_bytes,
                    score,
                })
            })
            .collect();

        select_eviction_candidates(candidates, target_bytes, self.config.min_priority)
    }
}
