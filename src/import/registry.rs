//! Import job registry
//!
//! Process-wide map of job id to job record, owned by the service state and
//! injected where needed. The registry is volatile: jobs do not survive a
//! process restart. Terminal jobs are kept observable for a configured
//! retention window and pruned afterwards; a capacity bound evicts the
//! oldest finished jobs first so the map cannot grow without bound.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{Duration, Utc};
use uuid::Uuid;

use super::job::ImportJob;
use super::ImportMode;
use crate::config::ImportConfig;

pub struct ImportRegistry {
    jobs: Mutex<HashMap<Uuid, Arc<ImportJob>>>,
    retention: Duration,
    capacity: usize,
}

impl ImportRegistry {
    pub fn new(retention_seconds: u64, capacity: usize) -> Self {
        Self {
            jobs: Mutex::new(HashMap::new()),
            retention: Duration::seconds(retention_seconds as i64),
            capacity,
        }
    }

    pub fn from_config(config: &ImportConfig) -> Self {
        Self::new(config.job_retention_seconds, config.max_tracked_jobs)
    }

    /// Allocate a fresh job and track it. Stale terminal jobs are pruned on
    /// every allocation so idle registries stay small.
    pub fn register(&self, mode: ImportMode) -> Arc<ImportJob> {
        let job = Arc::new(ImportJob::new(mode));

        let mut jobs = self.lock();
        Self::prune(&mut jobs, self.retention, self.capacity);
        jobs.insert(job.id, Arc::clone(&job));

        job
    }

    /// Look up a job by id. Returns `None` for ids that never existed, were
    /// evicted, or belong to a previous process lifetime.
    pub fn get(&self, id: Uuid) -> Option<Arc<ImportJob>> {
        self.lock().get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, Arc<ImportJob>>> {
        self.jobs.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn prune(jobs: &mut HashMap<Uuid, Arc<ImportJob>>, retention: Duration, capacity: usize) {
        let cutoff = Utc::now() - retention;
        jobs.retain(|_, job| match job.finished_at() {
            Some(finished_at) => finished_at > cutoff,
            None => true,
        });

        // Still over capacity: evict finished jobs oldest-first. Running
        // jobs are never evicted, so the bound is best-effort while a burst
        // of concurrent runs is in flight.
        if jobs.len() >= capacity {
            let mut finished: Vec<(Uuid, chrono::DateTime<Utc>)> = jobs
                .iter()
                .filter_map(|(id, job)| job.finished_at().map(|at| (*id, at)))
                .collect();
            finished.sort_by_key(|(_, at)| *at);

            let excess = jobs.len() + 1 - capacity;
            for (id, _) in finished.into_iter().take(excess) {
                jobs.remove(&id);
            }
        }
    }
}
