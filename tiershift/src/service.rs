//! High-level facade running complete relocation passes.
//!
//! Wires settings → trackers → translator → need filter → batch runner →
//! eviction in one `run_pass` operation. A run assumes no other relocation
//! pass is concurrently active; callers enforce mutual exclusion at the
//! batch level.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{Duration, Utc};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::Settings;
use crate::demand::{DemandIndex, DemandItem, NeedFilter, WorkPlan};
use crate::exclusion::{ExclusionError, ExclusionList};
use crate::identity::{episode_marker, media_identity, show_key};
use crate::mapping::PathTranslator;
use crate::priority::{PriorityConfig, PriorityEngine};
use crate::relocate::{BatchReport, BatchRunner, ProgressReporter, RelocationEngine};
use crate::tracker::{
    migrate_cache_tracker, CacheSource, CacheTracker, EpisodeInfo, OnDeckTracker, TrackerError,
    WatchlistTracker,
};

/// After eviction the cache is brought down to this share of its limit,
/// leaving headroom for new writes before the next pass.
const EVICTION_TARGET_PERCENTAGE: f64 = 0.9;

/// User name recorded when the query layer reports none.
const ANONYMOUS_USER: &str = "local";

/// Service-level errors.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Tracker persistence failed
    #[error(transparent)]
    Tracker(#[from] TrackerError),

    /// Exclusion list persistence failed
    #[error(transparent)]
    Exclusion(#[from] ExclusionError),
}

/// One path from the media server query layer, with its observing user.
#[derive(Debug, Clone)]
pub struct MediaItem {
    /// Media-coordinate path.
    pub path: PathBuf,
    /// The user the item belongs to, when reported.
    pub user: Option<String>,
}

impl MediaItem {
    /// An item with no user attribution.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            user: None,
        }
    }

    /// An item attributed to a user.
    pub fn for_user(path: impl Into<PathBuf>, user: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            user: Some(user.into()),
        }
    }

    fn user(&self) -> &str {
        self.user.as_deref().unwrap_or(ANONYMOUS_USER)
    }
}

/// Summary of one relocation pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunReport {
    /// The main relocation batch.
    pub batch: BatchReport,
    /// The eviction batch, if capacity required one.
    pub eviction: BatchReport,
    /// Files spared from release by the retention hold.
    pub held: u64,
    /// Watchlist entries aged out this run.
    pub watchlist_pruned: u64,
    /// Cache tracker entries dropped for vanished files.
    pub stale_records_dropped: u64,
    /// Exclusion entries dropped for vanished files.
    pub stale_exclusions_dropped: u64,
}

impl RunReport {
    /// Total per-file errors across both batches.
    pub fn error_count(&self) -> u64 {
        self.batch.errors + self.eviction.errors
    }
}

/// Current tracker and cache occupancy figures.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusReport {
    pub cached_files: u64,
    pub cache_bytes: u64,
    pub exclusion_entries: u64,
    pub watchlist_entries: u64,
    pub ondeck_entries: u64,
}

/// The relocation service.
pub struct TierShiftService {
    settings: Settings,
    translator: Arc<PathTranslator>,
    cache_tracker: Arc<CacheTracker>,
    watchlist: Arc<WatchlistTracker>,
    ondeck: Arc<OnDeckTracker>,
    exclusions: Arc<ExclusionList>,
    engine: Arc<RelocationEngine>,
    cancel: CancellationToken,
}

impl TierShiftService {
    /// Build the service, loading trackers and running the one-time
    /// tracker migration first.
    pub fn new(settings: Settings) -> Result<Self, ServiceError> {
        let dir = &settings.general.tracker_directory;
        let cache_tracker_path = dir.join("cache_tracker.json");

        let migration = migrate_cache_tracker(&cache_tracker_path)?;
        if !migration.skipped && migration.upgraded > 0 {
            info!(
                upgraded = migration.upgraded,
                "Upgraded legacy cache tracker entries"
            );
        }

        let translator = Arc::new(PathTranslator::new(settings.mappings.clone()));
        let cache_tracker = Arc::new(CacheTracker::load(cache_tracker_path)?);
        let watchlist = Arc::new(WatchlistTracker::load(dir.join("watchlist.json"))?);
        let ondeck = Arc::new(OnDeckTracker::load(dir.join("ondeck.json"))?);
        let exclusions = Arc::new(ExclusionList::load(settings.general.exclusion_file.clone())?);

        let engine = Arc::new(RelocationEngine::new(
            Arc::clone(&translator),
            Arc::clone(&cache_tracker),
            Arc::clone(&exclusions),
        ));

        Ok(Self {
            settings,
            translator,
            cache_tracker,
            watchlist,
            ondeck,
            exclusions,
            engine,
            cancel: CancellationToken::new(),
        })
    }

    /// Token that halts dispatch of new units when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Execute one full relocation pass.
    ///
    /// `on_deck` and `watchlist` are the media server's current answers in
    /// media coordinates.
    pub async fn run_pass(
        &self,
        on_deck: Vec<MediaItem>,
        watchlist: Vec<MediaItem>,
    ) -> Result<RunReport, ServiceError> {
        let now = Utc::now();
        let mut report = RunReport::default();

        // On-deck state has no meaning across runs
        self.ondeck.clear()?;
        self.ingest_on_deck(&on_deck, now)?;
        for item in &watchlist {
            self.watchlist.observe(&item.path, item.user(), now)?;
        }

        let index = DemandIndex::build(
            on_deck.iter().map(|item| item.path.as_path()),
            watchlist.iter().map(|item| item.path.as_path()),
        );

        let mut items: Vec<DemandItem> = Vec::with_capacity(on_deck.len() + watchlist.len());
        items.extend(on_deck.iter().map(|item| DemandItem {
            media_path: item.path.clone(),
            user: item.user.clone(),
            source: CacheSource::OnDeck,
        }));
        items.extend(watchlist.iter().map(|item| DemandItem {
            media_path: item.path.clone(),
            user: item.user.clone(),
            source: CacheSource::Watchlist,
        }));

        let retention = Duration::hours(self.settings.general.retention_hours as i64);
        let filter = NeedFilter::new(index, retention);
        let plan = filter.plan(&items, &self.translator, &self.cache_tracker, now);
        report.held = plan.held as u64;

        let runner = self.batch_runner();
        report.batch = runner.run(plan, Arc::new(ProgressReporter::new())).await;

        report.eviction = self.evict_if_over_limit().await;

        // Staleness sweeps after relocation
        let stale_days = Duration::days(self.settings.general.watchlist_stale_days as i64);
        report.watchlist_pruned = self.watchlist.cleanup_stale(stale_days, now)? as u64;
        report.stale_records_dropped = self.cache_tracker.cleanup_missing()? as u64;
        report.stale_exclusions_dropped = self.exclusions.cleanup_missing()? as u64;

        info!(
            files_to_cache = report.batch.files_to_cache,
            files_to_array = report.batch.files_to_array,
            evicted = report.eviction.files_to_array,
            held = report.held,
            errors = report.error_count(),
            "Relocation pass complete"
        );

        Ok(report)
    }

    /// Restore every tracked cache file to the array, then recover any
    /// orphaned backup markers. Disaster-recovery tooling.
    pub async fn restore_all(&self) -> Result<BatchReport, ServiceError> {
        let plan = WorkPlan {
            to_array: self.cache_tracker.paths(),
            ..Default::default()
        };

        let runner = self.batch_runner();
        let report = runner.run(plan, Arc::new(ProgressReporter::new())).await;

        match self.engine.recover_markers() {
            Ok(recovered) if recovered > 0 => {
                info!(recovered, "Recovered orphaned backup markers");
            }
            Ok(_) => {}
            Err(error) => warn!(%error, "Backup marker sweep failed"),
        }

        Ok(report)
    }

    /// Current occupancy figures.
    pub fn status(&self) -> StatusReport {
        let paths = self.cache_tracker.paths();
        let cache_bytes = paths
            .iter()
            .filter_map(|path| std::fs::metadata(path).ok())
            .map(|m| m.len())
            .sum();

        StatusReport {
            cached_files: paths.len() as u64,
            cache_bytes,
            exclusion_entries: self.exclusions.len() as u64,
            watchlist_entries: self.watchlist.len() as u64,
            ondeck_entries: self.ondeck.len() as u64,
        }
    }

    /// Populate the on-deck tracker, deriving per-user current episodes.
    ///
    /// For each (show, user) pair the lowest-numbered on-deck episode is
    /// the current one; higher-numbered items are pre-fetched ahead of it.
    fn ingest_on_deck(
        &self,
        items: &[MediaItem],
        now: chrono::DateTime<Utc>,
    ) -> Result<(), ServiceError> {
        let mut current_positions: HashMap<(String, String), (u32, u32)> = HashMap::new();

        for item in items {
            if let Some(marker) = episode_marker(&media_identity(&item.path)) {
                let key = (show_key(&item.path), item.user().to_string());
                let position = (marker.season, marker.episode);
                current_positions
                    .entry(key)
                    .and_modify(|min| *min = (*min).min(position))
                    .or_insert(position);
            }
        }

        for item in items {
            let info = episode_marker(&media_identity(&item.path)).map(|marker| {
                let show = show_key(&item.path);
                let is_current = current_positions
                    .get(&(show.clone(), item.user().to_string()))
                    .is_some_and(|&min| min == (marker.season, marker.episode));
                EpisodeInfo {
                    show,
                    season: marker.season,
                    episode: marker.episode,
                    is_current_ondeck: is_current,
                }
            });
            // Movies on deck are always "current"; only pre-fetched future
            // episodes are not
            let is_current = info.as_ref().map_or(true, |i| i.is_current_ondeck);
            self.ondeck
                .observe(&item.path, item.user(), is_current, info, now)?;
        }

        Ok(())
    }

    /// Evict lowest-priority files when the cache working set is over its
    /// configured limit.
    async fn evict_if_over_limit(&self) -> BatchReport {
        let status = self.status();
        let max_size = self.settings.cache.max_size;
        if status.cache_bytes <= max_size {
            return BatchReport::default();
        }

        let target_size = (max_size as f64 * EVICTION_TARGET_PERCENTAGE) as u64;
        let target_bytes = status.cache_bytes.saturating_sub(target_size);

        info!(
            cache_bytes = status.cache_bytes,
            limit_bytes = max_size,
            target_bytes,
            "Cache over limit, starting eviction"
        );

        let priority = PriorityEngine::new(
            Arc::clone(&self.cache_tracker),
            Arc::clone(&self.watchlist),
            Arc::clone(&self.ondeck),
            PriorityConfig {
                prefetch_count: self.settings.general.prefetch_count,
                min_priority: self.settings.cache.min_priority,
            },
        );

        let candidates = priority.eviction_candidates(target_bytes, Utc::now());
        if candidates.is_empty() {
            warn!("Cache over limit but no file scores below the eviction threshold");
            return BatchReport::default();
        }

        let plan = WorkPlan {
            to_array: candidates.into_iter().map(|c| c.path).collect(),
            ..Default::default()
        };

        self.batch_runner()
            .run(plan, Arc::new(ProgressReporter::new()))
            .await
    }

    fn batch_runner(&self) -> BatchRunner {
        BatchRunner::new(
            Arc::clone(&self.engine),
            self.settings.workers.cache,
            self.settings.workers.array,
            self.cancel.clone(),
        )
    }

    /// The translator, for diagnostic tooling.
    pub fn translator(&self) -> &PathTranslator {
        &self.translator
    }
}

/// Read a newline-delimited `path[<TAB>user]` list file from the external
/// query layer.
pub fn read_media_list(path: &Path) -> std::io::Result<Vec<MediaItem>> {
    let raw = std::fs::read_to_string(path)?;
    Ok(raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| match line.split_once('\t') {
            Some((path, user)) if !user.trim().is_empty() => {
                MediaItem::for_user(path.trim(), user.trim())
            }
            _ => MediaItem::new(line),
        })
        .collect())
}
