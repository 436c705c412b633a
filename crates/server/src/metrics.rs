//! Prometheus metrics
//!
//! The recorder is installed once at startup; every helper below is a
//! cheap no-op until then. Pipeline outcomes are recorded where they
//! cross the server boundary: parse handlers, batch submission, and job
//! settlement.

use std::time::Duration;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

use sms_txn_core::{DedupMethod, ExtractionTier};
use sms_txn_pipeline::JobCounters;

static PROMETHEUS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Install the Prometheus recorder and register metric descriptions.
///
/// Returns `None` when a recorder is already installed; recording keeps
/// working against whichever recorder won.
pub fn init_metrics() -> Option<PrometheusHandle> {
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            describe_metrics();
            let _ = PROMETHEUS_HANDLE.set(handle.clone());
            Some(handle)
        }
        Err(e) => {
            tracing::warn!("failed to install metrics recorder: {}", e);
            None
        }
    }
}

fn describe_metrics() {
    describe_counter!("sms_txn_requests_total", "HTTP requests by endpoint");
    describe_counter!("sms_txn_errors_total", "HTTP errors by endpoint and status");
    describe_counter!(
        "sms_txn_parse_outcomes_total",
        "Single-message parse outcomes by code"
    );
    describe_counter!("sms_txn_extractions_total", "Accepted extractions by tier");
    describe_counter!("sms_txn_duplicates_total", "Duplicates by dedup method");
    describe_counter!("sms_txn_batches_submitted_total", "Batch submissions");
    describe_counter!(
        "sms_txn_jobs_settled_total",
        "Settled jobs by terminal state"
    );
    describe_counter!("sms_txn_batch_items_total", "Batch item outcomes");
    describe_histogram!(
        "sms_txn_parse_duration_ms",
        "Single-message parse latency in milliseconds"
    );
    describe_histogram!("sms_txn_batch_size", "Messages per submitted batch");
}

pub fn record_request(endpoint: &'static str) {
    counter!("sms_txn_requests_total", "endpoint" => endpoint).increment(1);
}

pub fn record_error(endpoint: &'static str, status: u16) {
    counter!("sms_txn_errors_total", "endpoint" => endpoint, "status" => status.to_string())
        .increment(1);
}

pub fn record_parse_outcome(code: &'static str) {
    counter!("sms_txn_parse_outcomes_total", "code" => code).increment(1);
}

pub fn record_extraction(tier: ExtractionTier) {
    counter!("sms_txn_extractions_total", "tier" => tier.as_str()).increment(1);
}

pub fn record_duplicate(method: DedupMethod) {
    counter!("sms_txn_duplicates_total", "method" => method.as_str()).increment(1);
}

pub fn record_batch_submitted(size: usize) {
    counter!("sms_txn_batches_submitted_total").increment(1);
    histogram!("sms_txn_batch_size").record(size as f64);
}

pub fn record_job_settled(state: &'static str, counters: &JobCounters) {
    counter!("sms_txn_jobs_settled_total", "state" => state).increment(1);
    counter!("sms_txn_batch_items_total", "outcome" => "accepted")
        .increment(counters.accepted as u64);
    counter!("sms_txn_batch_items_total", "outcome" => "rejected")
        .increment(counters.rejected as u64);
    counter!("sms_txn_batch_items_total", "outcome" => "failed").increment(counters.failed as u64);
}

pub fn record_parse_latency(elapsed: Duration) {
    histogram!("sms_txn_parse_duration_ms").record(elapsed.as_secs_f64() * 1000.0);
}

/// Render the Prometheus exposition text.
pub async fn metrics_handler() -> String {
    PROMETHEUS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_without_a_recorder_is_a_no_op() {
        record_request("parse");
        record_error("parse", 400);
        record_parse_outcome("accepted");
        record_extraction(ExtractionTier::Fast);
        record_duplicate(DedupMethod::Hash);
        record_batch_submitted(10);
        record_job_settled("completed", &JobCounters::default());
        record_parse_latency(Duration::from_millis(3));
    }
}
