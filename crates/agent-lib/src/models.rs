//! Core data models for the agent

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A container as reported by the runtime's enumeration call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerSummary {
    pub id: String,
    /// Name exactly as the runtime reports it (Docker prefixes a `/`)
    pub name: String,
    pub image: String,
    pub state: String,
}

/// Metrics for one container, derived from a single stats snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerMetricRecord {
    pub id: String,
    pub name: String,
    pub image: String,
    pub state: String,
    pub timestamp: DateTime<Utc>,
    /// CPU utilization percent, rounded to 3 decimals
    pub cpu_percent: f64,
    /// Memory usage minus page cache, in bytes
    pub memory_used: i64,
    /// Memory utilization percent, rounded to 3 decimals; `None` when unlimited
    pub memory_percent: Option<f64>,
    pub memory_limit: u64,
    pub network_rx: u64,
    pub network_tx: u64,
    pub block_read: u64,
    pub block_write: u64,
    pub pids: u64,
}

/// All records produced by one poll cycle
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricBatch {
    #[serde(rename = "Container")]
    pub containers: Vec<ContainerMetricRecord>,
}

impl MetricBatch {
    pub fn new(containers: Vec<ContainerMetricRecord>) -> Self {
        Self { containers }
    }

    pub fn len(&self) -> usize {
        self.containers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }
}
