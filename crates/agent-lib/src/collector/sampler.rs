//! Per-cycle sampling of every running container

use super::{CollectError, FailurePolicy};
use crate::models::{ContainerMetricRecord, ContainerSummary, MetricBatch};
use crate::runtime::ContainerRuntime;
use crate::stats;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, warn};

/// Turns one runtime enumeration into a [`MetricBatch`]
pub struct SampleCollector {
    runtime: Arc<dyn ContainerRuntime>,
    policy: FailurePolicy,
}

impl SampleCollector {
    pub fn new(runtime: Arc<dyn ContainerRuntime>, policy: FailurePolicy) -> Self {
        Self { runtime, policy }
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Sample all running containers, in enumeration order.
    ///
    /// Containers are fetched one at a time to keep load on the runtime's
    /// stats API bounded.
    pub async fn collect(&self) -> Result<MetricBatch, CollectError> {
        let containers = self
            .runtime
            .list_containers()
            .await
            .map_err(CollectError::Enumeration)?;

        let mut records = Vec::with_capacity(containers.len());

        for container in &containers {
            match self.sample(container).await {
                Ok(record) => records.push(record),
                Err(e) if self.policy == FailurePolicy::SkipContainer => {
                    warn!(
                        container_id = %container.id,
                        error = %e,
                        "Skipping container for this cycle"
                    );
                }
                Err(e) => return Err(e),
            }
        }

        debug!(
            containers = containers.len(),
            sampled = records.len(),
            "Sampled containers"
        );

        Ok(MetricBatch::new(records))
    }

    /// Fetch, decode and derive metrics for a single container
    async fn sample(&self, container: &ContainerSummary) -> Result<ContainerMetricRecord, CollectError> {
        let raw = self
            .runtime
            .fetch_stats(&container.id)
            .await
            .map_err(|source| CollectError::Fetch {
                container_id: container.id.clone(),
                source,
            })?;

        let counters = stats::decode(&raw).map_err(|source| CollectError::Decode {
            container_id: container.id.clone(),
            source,
        })?;
        let derived = counters.derive();

        Ok(ContainerMetricRecord {
            id: container.id.clone(),
            name: display_name(&container.name).to_string(),
            image: container.image.clone(),
            state: container.state.clone(),
            timestamp: Utc::now(),
            cpu_percent: derived.cpu_percent,
            memory_used: derived.memory_used,
            memory_percent: derived.memory_percent,
            memory_limit: counters.available_memory(),
            network_rx: derived.network_rx,
            network_tx: derived.network_tx,
            block_read: derived.block_read,
            block_write: derived.block_write,
            pids: counters.pids,
        })
    }
}

/// Strip the single leading `/` Docker puts in front of container names
pub fn display_name(raw: &str) -> &str {
    raw.strip_prefix('/').unwrap_or(raw)
}
