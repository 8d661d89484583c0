//! Delivery of metric batches
//!
//! A sink receives one completed [`MetricBatch`] per poll cycle. Sinks do not
//! retry and do not buffer; a failed delivery is reported to the caller and
//! the batch is dropped.

mod console;
mod http;

pub use console::ConsoleSink;
pub use http::{HttpSink, HTTP_TIMEOUT};

use crate::models::MetricBatch;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while delivering a batch
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("invalid sink endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),

    #[error("failed to encode batch: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to write batch: {0}")]
    Io(#[from] std::io::Error),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("endpoint rejected batch ({status}): {body}")]
    Rejected { status: u16, body: String },
}

/// Destination for completed metric batches
#[async_trait]
pub trait MetricsSink: Send + Sync {
    /// Deliver one batch
    async fn send(&self, batch: &MetricBatch) -> Result<(), DeliveryError>;

    /// Short name used in logs
    fn name(&self) -> &'static str;
}

/// Sink selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkConfig {
    /// Print batches to standard output
    Console,
    /// POST batches to an HTTP endpoint with a bearer token
    Http { endpoint: String, api_key: String },
}

/// Create the sink described by `config`
pub fn create_sink(config: &SinkConfig) -> Result<Arc<dyn MetricsSink>, DeliveryError> {
    match config {
        SinkConfig::Console => {
            tracing::info!("Delivering metrics to stdout");
            Ok(Arc::new(ConsoleSink::stdout()))
        }
        SinkConfig::Http { endpoint, api_key } => {
            tracing::info!(endpoint = %endpoint, "Delivering metrics to HTTP endpoint");
            Ok(Arc::new(HttpSink::new(endpoint, api_key.clone())?))
        }
    }
}
