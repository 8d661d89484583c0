//! Shared fixtures and mock capabilities for unit tests

use crate::models::{ContainerMetricRecord, ContainerSummary, MetricBatch};
use crate::runtime::{ContainerRuntime, RuntimeError};
use crate::sink::{DeliveryError, MetricsSink};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::mpsc;

/// One-shot stats payload captured from a Docker 23 daemon on cgroup v2
pub const DOCKER_STATS_FIXTURE: &str = r#"
{
    "read": "2023-02-20T10:03:01.998224131Z",
    "preread": "0001-01-01T00:00:00Z",
    "pids_stats": {
        "current": 1,
        "limit": 18446744073709552000
    },
    "blkio_stats": {
        "io_service_bytes_recursive": [
            {"major": 254, "minor": 0, "op": "read", "value": 3383296},
            {"major": 254, "minor": 0, "op": "write", "value": 0}
        ],
        "io_serviced_recursive": null,
        "io_queue_recursive": null,
        "io_service_time_recursive": null,
        "io_wait_time_recursive": null,
        "io_merged_recursive": null,
        "io_time_recursive": null,
        "sectors_recursive": null
    },
    "num_procs": 0,
    "storage_stats": {},
    "cpu_stats": {
        "cpu_usage": {
            "total_usage": 168791000,
            "usage_in_kernelmode": 98048000,
            "usage_in_usermode": 70743000
        },
        "system_cpu_usage": 2006893600000000,
        "online_cpus": 4,
        "throttling_data": {"periods": 0, "throttled_periods": 0, "throttled_time": 0}
    },
    "precpu_stats": {
        "cpu_usage": {
            "total_usage": 0,
            "usage_in_kernelmode": 0,
            "usage_in_usermode": 0
        },
        "throttling_data": {"periods": 0, "throttled_periods": 0, "throttled_time": 0}
    },
    "memory_stats": {
        "usage": 4194304,
        "stats": {
            "active_anon": 0,
            "active_file": 1892352,
            "anon": 811008,
            "file": 3108864,
            "file_mapped": 1892352,
            "inactive_anon": 811008,
            "inactive_file": 1253376,
            "pgfault": 10626,
            "slab": 262440,
            "unevictable": 0
        },
        "limit": 12544401408
    },
    "name": "/test",
    "id": "1",
    "networks": {
        "eth0": {
            "rx_bytes": 37188,
            "rx_packets": 500,
            "rx_errors": 0,
            "rx_dropped": 0,
            "tx_bytes": 10036,
            "tx_packets": 142,
            "tx_errors": 0,
            "tx_dropped": 0
        }
    }
}
"#;

pub fn summary(id: &str, name: &str) -> ContainerSummary {
    ContainerSummary {
        id: id.to_string(),
        name: name.to_string(),
        image: "nginx:latest".to_string(),
        state: "running".to_string(),
    }
}

pub fn sample_record(id: &str) -> ContainerMetricRecord {
    ContainerMetricRecord {
        id: id.to_string(),
        name: format!("{id}-name"),
        image: "nginx:latest".to_string(),
        state: "running".to_string(),
        timestamp: Utc::now(),
        cpu_percent: 1.5,
        memory_used: 4194304,
        memory_percent: Some(0.033),
        memory_limit: 12544401408,
        network_rx: 37188,
        network_tx: 10036,
        block_read: 3383296,
        block_write: 0,
        pids: 1,
    }
}

/// Runtime mock returning canned containers and payloads
#[derive(Default)]
pub struct MockRuntime {
    containers: Vec<ContainerSummary>,
    payloads: HashMap<String, Vec<u8>>,
    fail_listing: bool,
    pub list_calls: AtomicUsize,
    pub fetch_calls: AtomicUsize,
    pub close_calls: AtomicUsize,
}

impl MockRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a container whose stats fetch returns `payload`
    pub fn with_container(mut self, summary: ContainerSummary, payload: &str) -> Self {
        self.payloads
            .insert(summary.id.clone(), payload.as_bytes().to_vec());
        self.containers.push(summary);
        self
    }

    /// Add a container whose stats fetch fails
    pub fn with_unreachable_container(mut self, summary: ContainerSummary) -> Self {
        self.containers.push(summary);
        self
    }

    pub fn failing_listing(mut self) -> Self {
        self.fail_listing = true;
        self
    }
}

#[async_trait]
impl ContainerRuntime for MockRuntime {
    async fn list_containers(&self) -> Result<Vec<ContainerSummary>, RuntimeError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_listing {
            return Err(RuntimeError::NoStats("listing".to_string()));
        }
        Ok(self.containers.clone())
    }

    async fn fetch_stats(&self, container_id: &str) -> Result<Vec<u8>, RuntimeError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.payloads
            .get(container_id)
            .cloned()
            .ok_or_else(|| RuntimeError::NoStats(container_id.to_string()))
    }

    async fn close(&self) -> Result<(), RuntimeError> {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Sink mock that records every batch and reports it on a channel
pub struct RecordingSink {
    pub batches: Mutex<Vec<MetricBatch>>,
    notify: mpsc::UnboundedSender<usize>,
    fail: bool,
}

impl RecordingSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<usize>) {
        let (notify, rx) = mpsc::unbounded_channel();
        let sink = Self {
            batches: Mutex::new(Vec::new()),
            notify,
            fail: false,
        };
        (sink, rx)
    }

    /// A sink that records batches but reports every delivery as failed
    pub fn failing() -> (Self, mpsc::UnboundedReceiver<usize>) {
        let (mut sink, rx) = Self::new();
        sink.fail = true;
        (sink, rx)
    }
}

#[async_trait]
impl MetricsSink for RecordingSink {
    async fn send(&self, batch: &MetricBatch) -> Result<(), DeliveryError> {
        self.batches.lock().unwrap().push(batch.clone());
        let _ = self.notify.send(batch.len());

        if self.fail {
            return Err(DeliveryError::Rejected {
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}
