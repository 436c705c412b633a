//! End-to-end message processing
//!
//! This crate wires the per-message stages into one pipeline and drives
//! batches of messages through it:
//! - Tiered extraction with confidence-gated escalation to the oracle
//! - Single-message pipeline: classify, route, extract, dedup, store
//! - In-memory transaction sink
//! - Batch jobs with a monotonic state machine and bounded registry
//! - Bounded-concurrency batch orchestration with cancellation

pub mod batch;
pub mod escalation;
pub mod job;
pub mod processor;
pub mod sink;

// Escalation exports
pub use escalation::{EscalationController, EscalationResult, EscalationStats};

// Pipeline exports
pub use processor::{AcceptedTransaction, MessagePipeline, ProcessError};

// Sink exports
pub use sink::{InMemorySink, StoredTransaction};

// Job exports
pub use job::{BatchJob, JobCounters, JobError, JobManager, JobSnapshot, JobState};

// Batch exports
pub use batch::{BatchOrchestrator, BatchTuning};
