//! Bounded-concurrency batch driver
//!
//! Messages are dispatched in chunks; within a chunk up to
//! `workers` extractions run concurrently under a semaphore. Each worker
//! records its own outcome on the job, so counters stay accurate even
//! when the driver aborts early. Cancellation and storage outages are
//! observed between items: in-flight work settles first, then the job
//! is failed.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info};

use sms_txn_config::BatchConfig;
use sms_txn_core::{ItemOutcome, SinkError, SmsMessage};

use crate::job::BatchJob;
use crate::processor::{MessagePipeline, ProcessError};

/// What a settled worker tells the driver beyond the job record.
enum ItemStatus {
    Settled,
    /// Storage is down, not just this item. The batch cannot continue.
    FatalStorage(String),
}

/// Per-submission tuning. Overrides are clamped to configured bounds, so
/// a caller can slow a batch down or narrow its concurrency but never
/// exceed what the server allows.
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchTuning {
    pub workers: Option<usize>,
    pub chunk_delay_ms: Option<u64>,
}

const MAX_CHUNK_DELAY_MS: u64 = 60_000;

pub struct BatchOrchestrator {
    pipeline: Arc<MessagePipeline>,
    config: BatchConfig,
}

impl BatchOrchestrator {
    pub fn new(pipeline: Arc<MessagePipeline>, config: BatchConfig) -> Self {
        Self { pipeline, config }
    }

    /// Drive the job on a background task and return immediately.
    pub fn spawn(self: &Arc<Self>, job: Arc<BatchJob>, messages: Vec<SmsMessage>, tuning: BatchTuning) {
        let orchestrator = Arc::clone(self);
        tokio::spawn(async move {
            orchestrator.run(job, messages, tuning).await;
        });
    }

    fn effective(&self, tuning: BatchTuning) -> (usize, u64) {
        let workers = tuning
            .workers
            .map(|w| w.clamp(1, self.config.workers))
            .unwrap_or(self.config.workers);
        let chunk_delay_ms = tuning
            .chunk_delay_ms
            .map(|d| d.min(MAX_CHUNK_DELAY_MS))
            .unwrap_or(self.config.chunk_delay_ms);
        (workers, chunk_delay_ms)
    }

    /// Process every message and settle the job into a terminal state.
    pub async fn run(&self, job: Arc<BatchJob>, messages: Vec<SmsMessage>, tuning: BatchTuning) {
        let (workers, chunk_delay_ms) = self.effective(tuning);
        job.mark_running();
        info!(
            job_id = %job.id,
            total = messages.len(),
            workers,
            "batch started"
        );

        let semaphore = Arc::new(Semaphore::new(workers));
        let chunk_size = self.config.chunk_size.max(1);
        let mut fatal: Option<String> = None;
        let mut cancelled = false;

        'chunks: for (chunk_index, chunk) in messages.chunks(chunk_size).enumerate() {
            if chunk_index > 0 && chunk_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(chunk_delay_ms)).await;
            }

            let mut tasks: JoinSet<(usize, ItemStatus)> = JoinSet::new();
            let mut pending: HashSet<usize> = HashSet::new();

            for (offset, message) in chunk.iter().enumerate() {
                if job.is_cancelled() {
                    cancelled = true;
                    break;
                }
                let index = chunk_index * chunk_size + offset;
                let permit = match Arc::clone(&semaphore).acquire_owned().await {
                    Ok(permit) => permit,
                    // The semaphore is never closed.
                    Err(_) => break,
                };

                pending.insert(index);
                let pipeline = Arc::clone(&self.pipeline);
                let job = Arc::clone(&job);
                let message = message.clone();
                tasks.spawn(async move {
                    let result = pipeline.process(&message).await;
                    drop(permit);

                    match result {
                        Ok(accepted) => {
                            job.record_accepted(ItemOutcome::accepted(
                                index,
                                format!(
                                    "{} {:.2} via {}",
                                    accepted.transaction.vendor,
                                    accepted.transaction.amount,
                                    accepted.transaction.channel
                                ),
                            ));
                            (index, ItemStatus::Settled)
                        }
                        Err(ProcessError::Item(err)) => {
                            job.record_rejected(ItemOutcome::rejected(
                                index,
                                err.code(),
                                err.to_string(),
                            ));
                            (index, ItemStatus::Settled)
                        }
                        Err(ProcessError::Storage(SinkError::Unavailable { message })) => {
                            job.record_failed(ItemOutcome::rejected(
                                index,
                                "storage",
                                message.clone(),
                            ));
                            (index, ItemStatus::FatalStorage(message))
                        }
                        Err(ProcessError::Storage(err)) => {
                            job.record_failed(ItemOutcome::rejected(
                                index,
                                "storage",
                                err.to_string(),
                            ));
                            (index, ItemStatus::Settled)
                        }
                    }
                });
            }

            // Settle the whole chunk before moving on.
            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok((index, ItemStatus::Settled)) => {
                        pending.remove(&index);
                    }
                    Ok((index, ItemStatus::FatalStorage(message))) => {
                        pending.remove(&index);
                        fatal.get_or_insert(message);
                    }
                    Err(err) => {
                        error!(job_id = %job.id, error = %err, "batch worker panicked");
                    }
                }
            }
            // A panicked worker never recorded its item.
            for index in pending {
                job.record_failed(ItemOutcome::rejected(
                    index,
                    "panic",
                    "extraction task panicked",
                ));
            }

            if cancelled || fatal.is_some() {
                break 'chunks;
            }
        }

        if let Some(reason) = fatal {
            job.fail(format!("storage unavailable: {}", reason));
        } else if cancelled {
            job.fail("cancelled by caller");
        } else {
            job.complete();
        }

        let snapshot = job.snapshot();
        info!(
            job_id = %job.id,
            state = snapshot.state.as_str(),
            processed = snapshot.counters.processed,
            accepted = snapshot.counters.accepted,
            rejected = snapshot.counters.rejected,
            failed = snapshot.counters.failed,
            "batch settled"
        );
    }
}
