//! The need filter: turns demand into relocation work lists.

use std::collections::HashSet;
use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::mapping::{CacheTarget, PathTranslator};
use crate::tracker::{CacheSource, CacheTracker};

use super::index::DemandIndex;

/// One item from the media server's on-deck or watchlist answer.
#[derive(Debug, Clone)]
pub struct DemandItem {
    /// Media-coordinate path.
    pub media_path: PathBuf,
    /// The observing user, when the query layer reports one.
    pub user: Option<String>,
    /// Why the item is wanted (`OnDeck` or `Watchlist`).
    pub source: CacheSource,
}

/// A file that must move to cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheRequest {
    /// Array-coordinate source path.
    pub array_path: PathBuf,
    /// Source tag recorded when the file lands on cache.
    pub source: CacheSource,
}

/// A wanted file already on cache that needs defensive re-registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshRequest {
    /// Cache-coordinate path of the authoritative copy.
    pub cache_path: PathBuf,
    /// A stray array copy under the original name, to be removed.
    pub stray_array_path: Option<PathBuf>,
}

/// The two work lists (plus refreshes) for one run.
#[derive(Debug, Default)]
pub struct WorkPlan {
    /// Files to move array → cache.
    pub to_cache: Vec<CacheRequest>,
    /// Cache-coordinate paths to restore cache → array.
    pub to_array: Vec<PathBuf>,
    /// Wanted files already cached, to re-register defensively.
    pub refresh: Vec<RefreshRequest>,
    /// Files spared from release by the retention hold.
    pub held: usize,
}

/// Decides per file whether it belongs on cache or array.
pub struct NeedFilter {
    index: DemandIndex,
    /// Files cached more recently than this are never released.
    retention: Duration,
}

impl NeedFilter {
    /// Create a filter over a built demand index.
    pub fn new(index: DemandIndex, retention: Duration) -> Self {
        Self { index, retention }
    }

    /// Build the run's work plan.
    ///
    /// Additions come from the demand items; releases from the cache
    /// tracker's current contents. No path is dispatched twice: additions
    /// are deduplicated by array path, and a needed file is by definition
    /// never in the release list.
    pub fn plan(
        &self,
        items: &[DemandItem],
        translator: &PathTranslator,
        cache_tracker: &CacheTracker,
        now: DateTime<Utc>,
    ) -> WorkPlan {
        let mut plan = WorkPlan::default();
        self.plan_additions(items, translator, &mut plan);
        self.plan_releases(cache_tracker, &mut plan, now);
        plan
    }

    fn plan_additions(
        &self,
        items: &[DemandItem],
        translator: &PathTranslator,
        plan: &mut WorkPlan,
    ) {
        let mut seen: HashSet<PathBuf> = HashSet::new();

        for item in items {
            let (array_path, _) = match translator.to_array(&item.media_path) {
                Some(found) => found,
                None => continue,
            };

            if !seen.insert(array_path.clone()) {
                continue;
            }

            let cache_path = match translator.to_cache(&array_path) {
                CacheTarget::Cacheable(path, _) => path,
                CacheTarget::NotCacheable => continue,
            };

            if cache_path.exists() {
                // The cache copy is authoritative while cached; an array
                // file under the original name is a stray duplicate.
                let stray = array_path.exists().then(|| array_path.clone());
                plan.refresh.push(RefreshRequest {
                    cache_path,
                    stray_array_path: stray,
                });
                continue;
            }

            if !array_path.exists() {
                debug!(
                    path = %array_path.display(),
                    "Wanted file absent from both tiers, skipping"
                );
                continue;
            }

            plan.to_cache.push(CacheRequest {
                array_path,
                source: item.source,
            });
        }
    }

    fn plan_releases(&self, cache_tracker: &CacheTracker, plan: &mut WorkPlan, now: DateTime<Utc>) {
        for cache_path in cache_tracker.paths() {
            if self.index.is_needed(&cache_path) {
                continue;
            }

            // Retention hold: freshly cached files are kept regardless of
            // need, protecting against watchlist/on-deck flapping
            if let Some(record) = cache_tracker.get(&cache_path) {
                if now - record.cached_at < self.retention {
                    plan.held += 1;
                    debug!(
                        path = %cache_path.display(),
                        "Retention hold, keeping recently cached file"
                    );
                    continue;
                }
            }

            plan.to_array.push(cache_path);
        }
    }

    /// The demand index this filter decides from.
    pub fn index(&self) -> &DemandIndex {
        &self.index
    }
}
