//! HTTP sink: POSTs each batch to an ingestion endpoint

use super::{DeliveryError, MetricsSink};
use crate::models::{ContainerMetricRecord, MetricBatch};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Request timeout for a single delivery
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(25);

#[derive(Debug, Serialize)]
struct AgentObjectList<'a> {
    data: Vec<AgentObject<'a>>,
}

#[derive(Debug, Serialize)]
struct AgentObject<'a> {
    timestamp: String,
    metadata: AgentMetadata<'a>,
    data: AgentData,
}

#[derive(Debug, Serialize)]
struct AgentMetadata<'a> {
    container_id: &'a str,
    container_name: &'a str,
    container_image: &'a str,
}

#[derive(Debug, Serialize)]
struct AgentData {
    cpu: f64,
    memory_perc: Option<f64>,
    memory_tot: i64,
    total_rx: u64,
    total_tx: u64,
    io_read: u64,
    io_write: u64,
}

impl<'a> From<&'a ContainerMetricRecord> for AgentObject<'a> {
    fn from(record: &'a ContainerMetricRecord) -> Self {
        Self {
            timestamp: record.timestamp.to_rfc3339(),
            metadata: AgentMetadata {
                container_id: &record.id,
                container_name: &record.name,
                container_image: &record.image,
            },
            data: AgentData {
                cpu: record.cpu_percent,
                memory_perc: record.memory_percent,
                memory_tot: record.memory_used,
                total_rx: record.network_rx,
                total_tx: record.network_tx,
                io_read: record.block_read,
                io_write: record.block_write,
            },
        }
    }
}

/// Sink that sends each batch to an HTTP endpoint with a bearer token
pub struct HttpSink {
    client: Client,
    endpoint: Url,
    api_key: String,
}

impl HttpSink {
    pub fn new(endpoint: &str, api_key: impl Into<String>) -> Result<Self, DeliveryError> {
        let endpoint = Url::parse(endpoint)?;
        let client = Client::builder().timeout(HTTP_TIMEOUT).build()?;

        Ok(Self {
            client,
            endpoint,
            api_key: api_key.into(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl MetricsSink for HttpSink {
    async fn send(&self, batch: &MetricBatch) -> Result<(), DeliveryError> {
        let payload = AgentObjectList {
            data: batch.containers.iter().map(AgentObject::from).collect(),
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status != StatusCode::OK {
            return Err(DeliveryError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        debug!(
            containers = batch.len(),
            response = %body,
            "Batch accepted by endpoint"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "api"
    }
}
