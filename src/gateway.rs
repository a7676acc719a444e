//! Gateway client for syncing emitted records to a storage service.
//!
//! Records are posted in batches, one batch per program run, to
//! `{base}/app/records` with a bearer token.

use crate::program::Record;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Gateway configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Gateway host (default: 127.0.0.1)
    pub host: String,
    /// Gateway port
    pub port: u16,
    /// Bearer authentication token
    pub token: String,
}

impl GatewayConfig {
    /// Create a new gateway configuration.
    pub fn new(host: impl Into<String>, port: u16, token: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            token: token.into(),
        }
    }

    /// Read `SMART_COUNTER_GATEWAY_PORT` and `SMART_COUNTER_GATEWAY_TOKEN`,
    /// plus an optional `SMART_COUNTER_GATEWAY_HOST`.
    pub fn from_env() -> Result<Self, GatewayError> {
        let var = |name: &str| {
            std::env::var(name).map_err(|_| GatewayError::Config(format!("{name} is not set")))
        };

        let port_str = var("SMART_COUNTER_GATEWAY_PORT")?;
        let port: u16 = port_str.trim().parse().map_err(|e| {
            GatewayError::Config(format!("Invalid port number '{}': {}", port_str.trim(), e))
        })?;
        let token = var("SMART_COUNTER_GATEWAY_TOKEN")?.trim().to_string();
        let host =
            std::env::var("SMART_COUNTER_GATEWAY_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        Ok(Self { host, port, token })
    }

    /// Get the full gateway URL.
    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Record ingest endpoint.
    pub fn records_url(&self) -> String {
        format!("{}/app/records", self.url())
    }

    /// Get the health check endpoint URL.
    pub fn health_url(&self) -> String {
        format!("{}/health", self.url())
    }
}

/// Gateway client error types.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Gateway config error: {0}")]
    Config(String),
    #[error("Gateway network error: {0}")]
    Network(String),
    #[error("Gateway server error ({status}): {message}")]
    Server { status: u16, message: String },
    #[error("Gateway serialization error: {0}")]
    Serialization(String),
}

/// Records of one program run.
#[derive(Debug, Clone, Serialize)]
pub struct RecordBatch {
    pub run_id: Uuid,
    pub device_id: String,
    pub timezone: String,
    pub records: Vec<Record>,
    pub meta: BatchMeta,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchMeta {
    pub source: String,
    pub version: String,
    pub record_count: usize,
}

/// Acknowledgement from the records endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayResponse {
    #[serde(default)]
    pub accepted: usize,
    #[serde(default)]
    pub timestamp: Option<String>,
}

fn device_id() -> String {
    let hostname = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string());
    format!("counter-{}-{}", hostname, &Uuid::new_v4().to_string()[..8])
}

/// Async client for the records endpoint.
pub struct GatewayClient {
    config: GatewayConfig,
    client: reqwest::Client,
    device_id: String,
}

impl GatewayClient {
    /// Create a new gateway client.
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| GatewayError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            config,
            client,
            device_id: device_id(),
        })
    }

    /// Package records for upload.
    pub fn batch(&self, run_id: Uuid, records: &[Record]) -> RecordBatch {
        RecordBatch {
            run_id,
            device_id: self.device_id.clone(),
            timezone: chrono_tz::Tz::UTC.to_string(),
            records: records.to_vec(),
            meta: BatchMeta {
                source: "smart-counter".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                record_count: records.len(),
            },
        }
    }

    /// Test connection to the gateway.
    pub async fn test_connection(&self) -> Result<bool, GatewayError> {
        let response = self
            .client
            .get(self.config.health_url())
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        Ok(response.status().is_success())
    }

    /// Post one run's records.
    pub async fn sync_records(
        &self,
        run_id: Uuid,
        records: &[Record],
    ) -> Result<GatewayResponse, GatewayError> {
        if records.is_empty() {
            return Err(GatewayError::Config("No records to sync".to_string()));
        }

        let batch = self.batch(run_id, records);
        let response = self
            .client
            .post(self.config.records_url())
            .header("Authorization", format!("Bearer {}", self.config.token))
            .header("Content-Type", "application/json")
            .json(&batch)
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(GatewayError::Server {
                status: status.as_u16(),
                message,
            });
        }

        let gateway_response: GatewayResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Serialization(e.to_string()))?;

        tracing::info!(%run_id, accepted = gateway_response.accepted, "records synced");
        Ok(gateway_response)
    }

    /// Get the device ID.
    pub fn device_id(&self) -> &str {
        &self.device_id
    }
}

/// Blocking gateway client for use in synchronous contexts.
pub struct BlockingGatewayClient {
    inner: GatewayClient,
    runtime: tokio::runtime::Runtime,
}

impl BlockingGatewayClient {
    /// Create a new blocking gateway client.
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| GatewayError::Config(format!("Failed to create runtime: {e}")))?;

        Ok(Self {
            inner: GatewayClient::new(config)?,
            runtime,
        })
    }

    /// Create a blocking client from environment configuration.
    pub fn from_env() -> Result<Self, GatewayError> {
        Self::new(GatewayConfig::from_env()?)
    }

    /// Test connection to the gateway.
    pub fn test_connection(&self) -> Result<bool, GatewayError> {
        self.runtime.block_on(self.inner.test_connection())
    }

    /// Post one run's records.
    pub fn sync_records(
        &self,
        run_id: Uuid,
        records: &[Record],
    ) -> Result<GatewayResponse, GatewayError> {
        self.runtime
            .block_on(self.inner.sync_records(run_id, records))
    }

    /// Get the device ID.
    pub fn device_id(&self) -> &str {
        self.inner.device_id()
    }
}
