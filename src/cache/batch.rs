use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use log::{debug, warn};

use crate::config::PredictConfig;
use crate::ground::GroundPoint;
use crate::orbit::OrbitModel;
use crate::predict::{compute_passes, PredictionMode, VisibilityFilters};

use super::pass_cache::{cache_window, PassCache};

pub const DEFAULT_BATCH_SIZE: usize = 20;

/// One cache refresh for a (ground point, object) pair.
pub struct UpdateTask {
    pub model: Arc<OrbitModel>,
    pub ground: Arc<GroundPoint>,
    pub mode: PredictionMode,
    pub cache: Arc<Mutex<PassCache>>,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub updated: usize,
    pub unchanged: usize,
    /// (object name, error) for every task that failed. Failures never abort
    /// the rest of the batch.
    pub failures: Vec<(String, String)>,
}

/// Recomputes many pass caches without starving the host: tasks run in
/// fixed-size batches, each batch is awaited to completion, and control is
/// yielded between batches. A single object's computation is never split
/// across a yield.
pub struct BatchScheduler {
    batch_size: usize,
}

impl Default for BatchScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_SIZE)
    }
}

impl BatchScheduler {
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
        }
    }

    pub async fn run(
        &self,
        tasks: Vec<UpdateTask>,
        now: DateTime<Utc>,
        filters: VisibilityFilters,
        cfg: &PredictConfig,
    ) -> BatchReport {
        let mut report = BatchReport::default();
        let total = tasks.len();
        let mut iter = tasks.into_iter();
        let mut done = 0;

        loop {
            let batch: Vec<UpdateTask> = iter.by_ref().take(self.batch_size).collect();
            if batch.is_empty() {
                break;
            }

            let mut handles = Vec::with_capacity(batch.len());
            for task in batch {
                let cfg = cfg.clone();
                handles.push(tokio::spawn(async move { run_task(task, now, filters, &cfg) }));
            }

            for handle in handles {
                done += 1;
                match handle.await {
                    Ok(Ok(true)) => report.updated += 1,
                    Ok(Ok(false)) => report.unchanged += 1,
                    Ok(Err((name, error))) => {
                        warn!("pass update failed for {name}: {error}");
                        report.failures.push((name, error));
                    }
                    Err(join_error) => {
                        report.failures.push(("<task>".into(), join_error.to_string()));
                    }
                }
            }

            debug!("pass cache refresh: {done}/{total}");
            tokio::task::yield_now().await;
        }

        report
    }
}

/// Validity check and token under the lock, the sweep outside it, the commit
/// under the lock again. Concurrent updates of one pair are resolved by the
/// cache's sequence tokens (last writer wins).
fn run_task(
    task: UpdateTask,
    now: DateTime<Utc>,
    filters: VisibilityFilters,
    cfg: &PredictConfig,
) -> Result<bool, (String, String)> {
    let name = task.model.name().to_string();

    let token = {
        let mut cache = task.cache.lock().unwrap();
        if cache.is_valid(now, &filters) {
            return Ok(false);
        }
        cache.begin_update()
    };

    let window = cache_window(now, cfg);
    let passes = compute_passes(&task.model, &task.ground, task.mode, window.0, window.1, cfg)
        .map_err(|e| (name, e.to_string()))?;

    let mut cache = task.cache.lock().unwrap();
    Ok(cache.commit(token, window, passes, filters, now))
}
