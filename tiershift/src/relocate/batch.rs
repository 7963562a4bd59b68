//! Bounded-concurrency batch execution.
//!
//! Each unit of work is one file's full move-or-restore operation. Pools
//! are sized independently per direction, since array writes and cache
//! writes typically contend for different physical devices. Cancellation
//! is cooperative and coarse: a stop signal halts dispatch of new units but
//! never interrupts a unit already running.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::demand::WorkPlan;

use super::engine::RelocationEngine;
use super::progress::{ProgressReporter, ProgressSnapshot};
use super::types::MoveOutcome;

/// Aggregate result of one batch.
///
/// Per-file errors never abort the batch; they surface here as a count.
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchReport {
    /// Files moved to cache.
    pub files_to_cache: u64,
    /// Files restored to array.
    pub files_to_array: u64,
    /// Bytes moved to cache.
    pub bytes_to_cache: u64,
    /// Bytes restored to array.
    pub bytes_to_array: u64,
    /// Units that completed without moving anything.
    pub skipped: u64,
    /// Units that failed.
    pub errors: u64,
    /// Whether dispatch was cut short by cancellation.
    pub cancelled: bool,
}

impl BatchReport {
    fn from_snapshot(snapshot: ProgressSnapshot, cancelled: bool) -> Self {
        Self {
            files_to_cache: snapshot.files_to_cache,
            files_to_array: snapshot.files_to_array,
            bytes_to_cache: snapshot.bytes_to_cache,
            bytes_to_array: snapshot.bytes_to_array,
            skipped: snapshot.skipped,
            errors: snapshot.errors,
            cancelled,
        }
    }
}

/// Runs a work plan over bounded per-direction worker pools.
pub struct BatchRunner {
    engine: Arc<RelocationEngine>,
    cache_workers: usize,
    array_workers: usize,
    cancel: CancellationToken,
}

impl BatchRunner {
    /// Create a runner with the given per-direction pool sizes.
    pub fn new(
        engine: Arc<RelocationEngine>,
        cache_workers: usize,
        array_workers: usize,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            engine,
            cache_workers: cache_workers.max(1),
            array_workers: array_workers.max(1),
            cancel,
        }
    }

    /// Execute the plan and return the aggregate report.
    ///
    /// The plan arrives deduplicated from the need filter, so no path is
    /// requested twice within one batch.
    pub async fn run(&self, plan: WorkPlan, progress: Arc<ProgressReporter>) -> BatchReport {
        info!(
            to_cache = plan.to_cache.len(),
            to_array = plan.to_array.len(),
            refresh = plan.refresh.len(),
            held = plan.held,
            "Starting relocation batch"
        );

        let cache_pool = Arc::new(Semaphore::new(self.cache_workers));
        let array_pool = Arc::new(Semaphore::new(self.array_workers));
        let mut units: JoinSet<()> = JoinSet::new();
        let mut cancelled = false;

        for request in plan.refresh {
            if self.cancel.is_cancelled() {
                cancelled = true;
                break;
            }
            let engine = Arc::clone(&self.engine);
            let progress = Arc::clone(&progress);
            let pool = Arc::clone(&cache_pool);
            units.spawn(async move {
                let _permit = pool.acquire_owned().await;
                let label = request.cache_path.display().to_string();
                let result = tokio::task::spawn_blocking(move || {
                    engine.refresh_cached(&request.cache_path, request.stray_array_path.as_deref())
                })
                .await;
                record_unit(&progress, result, &label);
            });
        }

        for request in plan.to_cache {
            if self.cancel.is_cancelled() {
                cancelled = true;
                break;
            }
            let engine = Arc::clone(&self.engine);
            let progress = Arc::clone(&progress);
            let pool = Arc::clone(&cache_pool);
            units.spawn(async move {
                let _permit = pool.acquire_owned().await;
                let label = request.array_path.display().to_string();
                let result = tokio::task::spawn_blocking(move || {
                    engine.move_to_cache(&request.array_path, request.source)
                })
                .await;
                record_unit(&progress, result, &label);
            });
        }

        for cache_path in plan.to_array {
            if self.cancel.is_cancelled() {
                cancelled = true;
                break;
            }
            let engine = Arc::clone(&self.engine);
            let progress = Arc::clone(&progress);
            let pool = Arc::clone(&array_pool);
            units.spawn(async move {
                let _permit = pool.acquire_owned().await;
                let label = cache_path.display().to_string();
                let result =
                    tokio::task::spawn_blocking(move || engine.restore_to_array(&cache_path))
                        .await;
                record_unit(&progress, result, &label);
            });
        }

        // Units past dispatch run to completion even under cancellation
        while units.join_next().await.is_some() {}

        let report = BatchReport::from_snapshot(progress.snapshot(), cancelled);
        info!(
            files_to_cache = report.files_to_cache,
            files_to_array = report.files_to_array,
            bytes_to_cache = report.bytes_to_cache,
            bytes_to_array = report.bytes_to_array,
            skipped = report.skipped,
            errors = report.errors,
            cancelled = report.cancelled,
            "Relocation batch complete"
        );
        report
    }
}

/// Fold one unit's result into the progress counters.
fn record_unit(
    progress: &ProgressReporter,
    result: Result<Result<MoveOutcome, super::types::RelocateError>, tokio::task::JoinError>,
    label: &str,
) {
    match result {
        Ok(Ok(MoveOutcome::Moved { direction, bytes })) => {
            progress.record_moved(direction, bytes);
        }
        Ok(Ok(MoveOutcome::Skipped)) => progress.record_skipped(),
        Ok(Err(error)) => {
            warn!(path = %label, %error, "Relocation unit failed");
            progress.record_error();
        }
        Err(join_error) => {
            warn!(path = %label, %join_error, "Relocation unit panicked");
            progress.record_error();
        }
    }
}
