//! Prefetch Scheduler
//!
//! Warms related studies in the background. Each warm-up is a tracked tokio
//! task; its failures end at the task boundary and never reach the caller of
//! the lookup that triggered it.

use std::future::Future;

use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::warn;

use crate::models::ImagingStudy;

#[derive(Debug, Default)]
pub struct PrefetchScheduler {
    tasks: Mutex<JoinSet<()>>,
}

impl PrefetchScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Picks up to `limit` related study ids to warm after `study`.
    ///
    /// Keeps the upstream order, skips blanks, duplicates and the study itself.
    pub fn targets(study: &ImagingStudy, limit: usize) -> Vec<String> {
        let mut targets: Vec<String> = Vec::new();
        for id in study.related_study_ids() {
            if targets.len() >= limit {
                break;
            }
            let id = id.trim();
            if id.is_empty() || id == study.id || targets.iter().any(|t| t == id) {
                continue;
            }
            targets.push(id.to_string());
        }
        targets
    }

    /// Runs `job` in the background. Finished tasks are reaped on the way.
    pub async fn submit<F>(&self, job: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut tasks = self.tasks.lock().await;
        while let Some(finished) = tasks.try_join_next() {
            log_join_failure(finished);
        }
        tasks.spawn(job);
    }

    /// Waits for every submitted task to finish.
    pub async fn drain(&self) {
        let mut tasks = self.tasks.lock().await;
        while let Some(finished) = tasks.join_next().await {
            log_join_failure(finished);
        }
    }

    /// Number of tasks not yet reaped.
    pub async fn pending(&self) -> usize {
        self.tasks.lock().await.len()
    }
}

fn log_join_failure(result: Result<(), tokio::task::JoinError>) {
    if let Err(err) = result {
        warn!(error = %err, "prefetch task did not complete");
    }
}
