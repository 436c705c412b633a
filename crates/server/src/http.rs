//! HTTP endpoints
//!
//! REST surface for single-message parsing, batch submission, and job
//! tracking.

use std::time::Instant;

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use sms_txn_core::{CandidateTransaction, Classification, ExtractError, SinkError, SmsMessage};
use sms_txn_pipeline::{BatchTuning, JobSnapshot, ProcessError};

use crate::metrics::{
    metrics_handler, record_batch_submitted, record_duplicate, record_error, record_extraction,
    record_job_settled, record_parse_latency, record_parse_outcome, record_request,
};
use crate::state::AppState;
use crate::ServerError;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Single-message parse
        .route("/v1/messages/parse", post(parse_message))
        // Batch submission and tracking
        .route("/v1/batches", post(submit_batch))
        .route("/v1/batches/:id", get(batch_status))
        .route("/v1/batches/:id/cancel", post(cancel_batch))
        // Health checks
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        // Prometheus metrics
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Log a failed request and convert it to a status code.
fn fail(endpoint: &'static str, err: ServerError) -> StatusCode {
    tracing::warn!(endpoint, error = %err, "request failed");
    let status = StatusCode::from(err);
    record_error(endpoint, status.as_u16());
    status
}

/// Parse outcome, returned for accepted and rejected messages alike so
/// callers can audit every decision.
#[derive(Debug, Serialize)]
struct ParseResponse {
    accepted: bool,
    code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    classification: Option<Classification>,
    #[serde(skip_serializing_if = "Option::is_none")]
    transaction: Option<CandidateTransaction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dedup_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    escalated: Option<bool>,
}

/// Parse one message synchronously.
async fn parse_message(
    State(state): State<AppState>,
    Json(message): Json<SmsMessage>,
) -> Result<Json<ParseResponse>, StatusCode> {
    record_request("parse");
    if message.text.trim().is_empty() {
        return Err(fail(
            "parse",
            ServerError::InvalidRequest("empty message text".to_string()),
        ));
    }

    let started = Instant::now();
    let result = state.pipeline.process(&message).await;
    record_parse_latency(started.elapsed());

    match result {
        Ok(accepted) => {
            record_parse_outcome("accepted");
            record_extraction(accepted.transaction.tier);
            Ok(Json(ParseResponse {
                accepted: true,
                code: "accepted".to_string(),
                reason: None,
                classification: Some(accepted.classification),
                transaction: Some(accepted.transaction),
                dedup_hash: Some(accepted.dedup_hash),
                escalated: Some(accepted.escalated),
            }))
        }
        Err(ProcessError::Item(err)) => {
            record_parse_outcome(err.code());
            if let ExtractError::Duplicate { method, .. } = &err {
                record_duplicate(*method);
            }
            Ok(Json(ParseResponse {
                accepted: false,
                code: err.code().to_string(),
                reason: Some(err.to_string()),
                classification: None,
                transaction: None,
                dedup_hash: None,
                escalated: None,
            }))
        }
        Err(ProcessError::Storage(err)) => {
            let server_err = match err {
                SinkError::Unavailable { message } => ServerError::StorageUnavailable(message),
                SinkError::WriteFailed { message } => ServerError::Internal(message),
            };
            Err(fail("parse", server_err))
        }
    }
}

/// Batch submission request
#[derive(Debug, Deserialize)]
struct BatchRequest {
    messages: Vec<SmsMessage>,
    workers: Option<usize>,
    chunk_delay_ms: Option<u64>,
}

/// Batch submission receipt
#[derive(Debug, Serialize)]
struct BatchAccepted {
    job_id: Uuid,
    total: usize,
    state: &'static str,
}

/// Submit a batch for background processing.
async fn submit_batch(
    State(state): State<AppState>,
    Json(request): Json<BatchRequest>,
) -> Result<(StatusCode, Json<BatchAccepted>), StatusCode> {
    record_request("submit_batch");

    let total = request.messages.len();
    if total == 0 {
        return Err(fail(
            "submit_batch",
            ServerError::InvalidRequest("batch contains no messages".to_string()),
        ));
    }
    let max = state.config.server.max_batch_size;
    if total > max {
        return Err(fail(
            "submit_batch",
            ServerError::InvalidRequest(format!("batch of {} exceeds maximum of {}", total, max)),
        ));
    }

    let job = state
        .jobs
        .create(total)
        .map_err(|_| fail("submit_batch", ServerError::TooManyJobs))?;
    record_batch_submitted(total);

    let tuning = BatchTuning {
        workers: request.workers,
        chunk_delay_ms: request.chunk_delay_ms,
    };
    let orchestrator = state.orchestrator.clone();
    let driven = job.clone();
    let settled = job.clone();
    tokio::spawn(async move {
        orchestrator.run(driven, request.messages, tuning).await;
        let snapshot = settled.snapshot();
        record_job_settled(snapshot.state.as_str(), &snapshot.counters);
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(BatchAccepted {
            job_id: job.id,
            total,
            state: job.state().as_str(),
        }),
    ))
}

/// Get a job snapshot.
async fn batch_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<JobSnapshot>, StatusCode> {
    record_request("batch_status");
    let job = state
        .jobs
        .get(id)
        .ok_or_else(|| fail("batch_status", ServerError::JobNotFound(id)))?;
    Ok(Json(job.snapshot()))
}

/// Request cancellation of a running job.
async fn cancel_batch(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<JobSnapshot>), StatusCode> {
    record_request("cancel_batch");
    let job = state
        .jobs
        .get(id)
        .ok_or_else(|| fail("cancel_batch", ServerError::JobNotFound(id)))?;
    job.cancel();
    tracing::info!(job_id = %id, "cancellation requested");
    Ok((StatusCode::ACCEPTED, Json(job.snapshot())))
}

/// Liveness plus pipeline statistics.
async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    let stats = state.pipeline.escalation_stats();
    let avg_rich_latency_ms = stats.avg_rich_latency_ms();
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "environment": state.config.environment,
        "escalation": {
            "counters": stats,
            "avg_rich_latency_ms": avg_rich_latency_ms,
        },
        "dedup_entries": state.pipeline.dedup_len(),
        "jobs": state.jobs.count(),
    }))
}

/// Readiness: the oracle must answer its health probe unless it is
/// disabled by configuration.
async fn readiness_check(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let oracle_required = state.config.oracle.enabled;
    let oracle_available = state.oracle.is_available().await;
    let ready = oracle_available || !oracle_required;

    let status_code = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(serde_json::json!({
            "status": if ready { "ready" } else { "not_ready" },
            "checks": {
                "oracle": {
                    "name": state.oracle.name(),
                    "available": oracle_available,
                    "required": oracle_required,
                },
                "jobs": {
                    "status": "ok",
                    "count": state.jobs.count(),
                },
            },
        })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use sms_txn_config::Settings;

    #[test]
    fn router_builds_with_default_state() {
        let state = AppState::new(Settings::default()).expect("state");
        let _ = create_router(state);
    }
}
