//! HTTP oracle client

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sms_txn_config::OracleConfig;
use sms_txn_core::{ChannelType, Direction};
use tracing::warn;

use crate::backend::{OraclePrediction, TransactionOracle};
use crate::OracleError;

/// Production oracle client. Transient failures (network, timeout, 5xx)
/// are retried with exponential backoff; API-level rejections are not.
#[derive(Clone)]
pub struct HttpOracle {
    client: Client,
    config: OracleConfig,
}

impl HttpOracle {
    pub fn new(config: OracleConfig) -> Result<Self, OracleError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| OracleError::Configuration(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    async fn execute(&self, request: &PredictRequest<'_>) -> Result<PredictResponse, OracleError> {
        let mut builder = self.client.post(&self.config.endpoint).json(request);
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key);
        }
        let response = builder.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            if status.is_server_error() {
                return Err(OracleError::Network(format!("server error {status}: {body}")));
            }
            return Err(OracleError::Api(format!("{status}: {body}")));
        }

        response
            .json()
            .await
            .map_err(|e| OracleError::InvalidResponse(e.to_string()))
    }

    fn is_retryable(error: &OracleError) -> bool {
        matches!(error, OracleError::Network(_) | OracleError::Timeout)
    }

    fn health_url(&self) -> String {
        match self.config.endpoint.rsplit_once('/') {
            Some((base, _)) => format!("{base}/health"),
            None => format!("{}/health", self.config.endpoint),
        }
    }
}

#[async_trait]
impl TransactionOracle for HttpOracle {
    async fn predict(&self, text: &str) -> Result<OraclePrediction, OracleError> {
        let request = PredictRequest {
            model: &self.config.model,
            text,
        };

        let mut last_error = None;
        let mut backoff = Duration::from_millis(self.config.initial_backoff_ms);

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                warn!(
                    attempt,
                    max_retries = self.config.max_retries,
                    backoff_ms = backoff.as_millis() as u64,
                    "oracle request failed, retrying"
                );
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }

            match self.execute(&request).await {
                Ok(response) => return Ok(response.into_prediction()),
                Err(error) if Self::is_retryable(&error) => last_error = Some(error),
                Err(error) => return Err(error),
            }
        }

        Err(last_error.unwrap_or_else(|| OracleError::Network("max retries exceeded".to_string())))
    }

    async fn is_available(&self) -> bool {
        self.client
            .get(self.health_url())
            .send()
            .await
            .map(|response| response.status().is_success())
            .unwrap_or(false)
    }

    fn name(&self) -> &str {
        &self.config.model
    }
}

// Wire types for the prediction service.
#[derive(Debug, Serialize)]
struct PredictRequest<'a> {
    model: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    transactional: bool,
    #[serde(default)]
    vendor: Option<String>,
    #[serde(default)]
    amount: Option<f64>,
    #[serde(default)]
    direction: Option<String>,
    #[serde(default)]
    date: Option<NaiveDate>,
    #[serde(default)]
    channel: Option<String>,
    #[serde(default)]
    reference: Option<String>,
    #[serde(default)]
    confidence: f32,
}

impl PredictResponse {
    /// Lenient mapping: unknown direction/channel strings become `None`
    /// instead of failing the whole response.
    fn into_prediction(self) -> OraclePrediction {
        OraclePrediction {
            transactional: self.transactional,
            vendor: self.vendor,
            amount: self.amount,
            direction: self.direction.as_deref().and_then(parse_direction),
            date: self.date,
            channel: self.channel.as_deref().and_then(parse_channel),
            reference: self.reference,
            confidence: self.confidence.clamp(0.0, 1.0),
        }
    }
}

fn parse_direction(raw: &str) -> Option<Direction> {
    match raw.to_lowercase().as_str() {
        "debit" | "dr" => Some(Direction::Debit),
        "credit" | "cr" => Some(Direction::Credit),
        _ => None,
    }
}

fn parse_channel(raw: &str) -> Option<ChannelType> {
    match raw.to_lowercase().as_str() {
        "upi" => Some(ChannelType::Upi),
        "credit_card" | "creditcard" | "credit card" => Some(ChannelType::CreditCard),
        "debit_card" | "debitcard" | "debit card" => Some(ChannelType::DebitCard),
        "subscription" => Some(ChannelType::Subscription),
        "net_banking" | "netbanking" | "net banking" => Some(ChannelType::NetBanking),
        "other" => Some(ChannelType::Other),
        _ => None,
    }
}
