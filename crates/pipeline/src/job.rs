//! Batch job state machine and registry
//!
//! A job moves `Queued -> Running -> {Completed, Failed}` and never
//! backwards; terminal states absorb all further transition attempts.
//! Cancellation is a flag the batch driver observes between items, so a
//! cancelled job still settles its in-flight work before it is failed.
//!
//! The registry is bounded: when full, finished jobs are evicted oldest
//! first, and running jobs are never evicted.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info};
use uuid::Uuid;

use sms_txn_config::BatchConfig;
use sms_txn_core::ItemOutcome;

/// Registry-level failures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum JobError {
    #[error("job registry full ({capacity} jobs)")]
    CapacityExceeded { capacity: usize },
}

/// Lifecycle state of a batch job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Queued,
    Running,
    Completed,
    Failed,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Queued => "queued",
            JobState::Running => "running",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }
}

/// Monotone progress counters. `processed = accepted + rejected + failed`
/// once the job settles.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct JobCounters {
    pub total: usize,
    pub processed: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub failed: usize,
}

#[derive(Debug)]
struct JobInner {
    state: JobState,
    counters: JobCounters,
    /// Trailing per-item log, oldest entries evicted at capacity
    items: VecDeque<ItemOutcome>,
    item_log_capacity: usize,
    error: Option<String>,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
}

/// One batch job
#[derive(Debug)]
pub struct BatchJob {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    inner: Mutex<JobInner>,
    cancelled: AtomicBool,
}

/// Point-in-time copy of a job, safe to serialize outside any lock.
#[derive(Debug, Clone, Serialize)]
pub struct JobSnapshot {
    pub id: Uuid,
    pub state: JobState,
    pub counters: JobCounters,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    pub items: Vec<ItemOutcome>,
}

impl BatchJob {
    pub fn new(total: usize, item_log_capacity: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            inner: Mutex::new(JobInner {
                state: JobState::Queued,
                counters: JobCounters {
                    total,
                    ..JobCounters::default()
                },
                items: VecDeque::with_capacity(item_log_capacity),
                item_log_capacity,
                error: None,
                started_at: None,
                finished_at: None,
            }),
            cancelled: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> JobState {
        self.inner.lock().state
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.inner.lock().finished_at
    }

    /// Queued -> Running. Any other starting state is left untouched.
    pub fn mark_running(&self) {
        let mut inner = self.inner.lock();
        if inner.state == JobState::Queued {
            inner.state = JobState::Running;
            inner.started_at = Some(Utc::now());
        }
    }

    /// Running -> Completed.
    pub fn complete(&self) {
        let mut inner = self.inner.lock();
        if inner.state == JobState::Running {
            inner.state = JobState::Completed;
            inner.finished_at = Some(Utc::now());
        }
    }

    /// Queued/Running -> Failed with a job-level reason.
    pub fn fail(&self, reason: impl Into<String>) {
        let mut inner = self.inner.lock();
        if !inner.state.is_terminal() {
            inner.state = JobState::Failed;
            inner.error = Some(reason.into());
            inner.finished_at = Some(Utc::now());
        }
    }

    /// Request cancellation. The driver observes the flag between items.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn record_accepted(&self, outcome: ItemOutcome) {
        let mut inner = self.inner.lock();
        inner.counters.processed += 1;
        inner.counters.accepted += 1;
        push_bounded(&mut inner, outcome);
    }

    pub fn record_rejected(&self, outcome: ItemOutcome) {
        let mut inner = self.inner.lock();
        inner.counters.processed += 1;
        inner.counters.rejected += 1;
        push_bounded(&mut inner, outcome);
    }

    pub fn record_failed(&self, outcome: ItemOutcome) {
        let mut inner = self.inner.lock();
        inner.counters.processed += 1;
        inner.counters.failed += 1;
        push_bounded(&mut inner, outcome);
    }

    pub fn snapshot(&self) -> JobSnapshot {
        let inner = self.inner.lock();
        JobSnapshot {
            id: self.id,
            state: inner.state,
            counters: inner.counters.clone(),
            error: inner.error.clone(),
            created_at: self.created_at,
            started_at: inner.started_at,
            finished_at: inner.finished_at,
            items: inner.items.iter().cloned().collect(),
        }
    }
}

fn push_bounded(inner: &mut JobInner, outcome: ItemOutcome) {
    if inner.item_log_capacity == 0 {
        return;
    }
    if inner.items.len() >= inner.item_log_capacity {
        inner.items.pop_front();
    }
    inner.items.push_back(outcome);
}

/// Job registry
pub struct JobManager {
    jobs: RwLock<HashMap<Uuid, Arc<BatchJob>>>,
    max_jobs: usize,
    item_log_capacity: usize,
    retention: Duration,
    cleanup_interval: std::time::Duration,
}

impl JobManager {
    pub fn new(config: &BatchConfig) -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
            max_jobs: config.max_jobs,
            item_log_capacity: config.item_log_capacity,
            retention: Duration::seconds(config.job_retention_secs as i64),
            cleanup_interval: std::time::Duration::from_secs(60),
        }
    }

    /// Register a new job for `total` messages.
    pub fn create(&self, total: usize) -> Result<Arc<BatchJob>, JobError> {
        let mut jobs = self.jobs.write();

        if jobs.len() >= self.max_jobs {
            self.evict_expired_internal(&mut jobs);
        }
        if jobs.len() >= self.max_jobs {
            // Past-retention eviction freed nothing; drop the oldest
            // finished job instead. Running jobs are never evicted.
            let oldest = jobs
                .values()
                .filter(|j| j.state().is_terminal())
                .min_by_key(|j| j.created_at)
                .map(|j| j.id);
            if let Some(id) = oldest {
                jobs.remove(&id);
                debug!(job_id = %id, "evicted oldest finished job to make room");
            }
        }
        if jobs.len() >= self.max_jobs {
            return Err(JobError::CapacityExceeded {
                capacity: self.max_jobs,
            });
        }

        let job = Arc::new(BatchJob::new(total, self.item_log_capacity));
        jobs.insert(job.id, job.clone());
        info!(job_id = %job.id, total, "created batch job");
        Ok(job)
    }

    pub fn get(&self, id: Uuid) -> Option<Arc<BatchJob>> {
        self.jobs.read().get(&id).cloned()
    }

    pub fn count(&self) -> usize {
        self.jobs.read().len()
    }

    pub fn list(&self) -> Vec<Uuid> {
        self.jobs.read().keys().copied().collect()
    }

    /// Remove finished jobs older than the retention window.
    pub fn cleanup_expired(&self) {
        let mut jobs = self.jobs.write();
        self.evict_expired_internal(&mut jobs);
    }

    fn evict_expired_internal(&self, jobs: &mut HashMap<Uuid, Arc<BatchJob>>) {
        let cutoff = Utc::now() - self.retention;
        let expired: Vec<Uuid> = jobs
            .values()
            .filter(|j| {
                j.state().is_terminal() && j.finished_at().map(|t| t < cutoff).unwrap_or(false)
            })
            .map(|j| j.id)
            .collect();

        for id in expired {
            jobs.remove(&id);
            debug!(job_id = %id, "expired batch job");
        }
    }

    /// Start a background task that periodically evicts expired jobs.
    ///
    /// Returns a shutdown sender used to stop the task.
    pub fn start_cleanup_task(self: &Arc<Self>) -> watch::Sender<bool> {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let manager = Arc::clone(self);
        let interval = manager.cleanup_interval;

        tokio::spawn(async move {
            let mut interval_timer = tokio::time::interval(interval);
            interval_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = interval_timer.tick() => {
                        let before = manager.count();
                        manager.cleanup_expired();
                        let after = manager.count();
                        if before != after {
                            info!(removed = before - after, remaining = after, "job cleanup pass");
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            info!("job cleanup task shutting down");
                            break;
                        }
                    }
                }
            }
        });

        shutdown_tx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions_are_monotonic() {
        let job = BatchJob::new(10, 50);
        assert_eq!(job.state(), JobState::Queued);

        // Completing a job that never ran is ignored.
        job.complete();
        assert_eq!(job.state(), JobState::Queued);

        job.mark_running();
        assert_eq!(job.state(), JobState::Running);
        job.mark_running();
        assert_eq!(job.state(), JobState::Running);

        job.complete();
        assert_eq!(job.state(), JobState::Completed);

        // Terminal states absorb everything.
        job.fail("too late");
        assert_eq!(job.state(), JobState::Completed);
        assert!(job.snapshot().error.is_none());
    }

    #[test]
    fn failed_is_terminal() {
        let job = BatchJob::new(1, 50);
        job.mark_running();
        job.fail("storage unavailable");

        job.complete();
        assert_eq!(job.state(), JobState::Failed);
        assert_eq!(job.snapshot().error.as_deref(), Some("storage unavailable"));
    }

    #[test]
    fn cancellation_is_a_flag_not_a_transition() {
        let job = BatchJob::new(5, 50);
        job.mark_running();
        job.cancel();

        assert!(job.is_cancelled());
        assert_eq!(job.state(), JobState::Running);
    }

    #[test]
    fn item_log_is_bounded_but_counters_are_not() {
        let job = BatchJob::new(5, 3);
        for i in 0..5 {
            job.record_accepted(ItemOutcome::accepted(i, "x"));
        }

        let snapshot = job.snapshot();
        assert_eq!(snapshot.counters.processed, 5);
        assert_eq!(snapshot.counters.accepted, 5);
        assert_eq!(snapshot.items.len(), 3);
        // Oldest entries were evicted.
        assert_eq!(snapshot.items[0].index, 2);
        assert_eq!(snapshot.items[2].index, 4);
    }

    #[test]
    fn manager_create_and_get() {
        let manager = JobManager::new(&BatchConfig::default());
        let job = manager.create(4).unwrap();

        assert_eq!(manager.count(), 1);
        assert!(manager.get(job.id).is_some());
        assert!(manager.get(Uuid::new_v4()).is_none());
    }

    #[test]
    fn full_registry_evicts_finished_jobs_first() {
        let config = BatchConfig {
            max_jobs: 2,
            ..BatchConfig::default()
        };
        let manager = JobManager::new(&config);

        let first = manager.create(1).unwrap();
        first.mark_running();
        first.complete();
        let second = manager.create(1).unwrap();
        second.mark_running();

        // Full, but the finished job can be evicted.
        let third = manager.create(1).unwrap();
        assert!(manager.get(first.id).is_none());
        assert!(manager.get(third.id).is_some());

        // Full of unfinished jobs: creation is refused.
        let err = manager.create(1).unwrap_err();
        assert_eq!(err, JobError::CapacityExceeded { capacity: 2 });
    }

    #[test]
    fn cleanup_removes_only_expired_terminal_jobs() {
        let config = BatchConfig {
            job_retention_secs: 0,
            ..BatchConfig::default()
        };
        let manager = JobManager::new(&config);

        let finished = manager.create(1).unwrap();
        finished.mark_running();
        finished.complete();
        let running = manager.create(1).unwrap();
        running.mark_running();

        std::thread::sleep(std::time::Duration::from_millis(5));
        manager.cleanup_expired();

        assert!(manager.get(finished.id).is_none());
        assert!(manager.get(running.id).is_some());
    }
}
