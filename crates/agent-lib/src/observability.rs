//! Self-observability for the agent
//!
//! - Prometheus metrics about the poll loop (cycles, failures, latency)
//! - Structured lifecycle events with tracing

use prometheus::{register_histogram, register_int_counter, register_int_gauge, Histogram, IntCounter, IntGauge};
use std::sync::OnceLock;
use tracing::info;

/// Histogram buckets for a full collect-and-deliver cycle (in seconds)
const CYCLE_BUCKETS: &[f64] = &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0];

static GLOBAL_METRICS: OnceLock<AgentMetricsInner> = OnceLock::new();

struct AgentMetricsInner {
    cycles: IntCounter,
    cycle_latency_seconds: Histogram,
    containers_sampled: IntGauge,
    batches_delivered: IntCounter,
    collection_errors: IntCounter,
    delivery_errors: IntCounter,
}

impl AgentMetricsInner {
    fn new() -> Self {
        Self {
            cycles: register_int_counter!(
                "dockwatch_poll_cycles_total",
                "Number of poll cycles started"
            )
            .expect("Failed to register poll_cycles_total"),

            cycle_latency_seconds: register_histogram!(
                "dockwatch_cycle_latency_seconds",
                "Time spent collecting and delivering one batch",
                CYCLE_BUCKETS.to_vec()
            )
            .expect("Failed to register cycle_latency_seconds"),

            containers_sampled: register_int_gauge!(
                "dockwatch_containers_sampled",
                "Number of containers in the last collected batch"
            )
            .expect("Failed to register containers_sampled"),

            batches_delivered: register_int_counter!(
                "dockwatch_batches_delivered_total",
                "Number of batches accepted by the sink"
            )
            .expect("Failed to register batches_delivered_total"),

            collection_errors: register_int_counter!(
                "dockwatch_collection_errors_total",
                "Number of cycles that failed during collection"
            )
            .expect("Failed to register collection_errors_total"),

            delivery_errors: register_int_counter!(
                "dockwatch_delivery_errors_total",
                "Number of batches the sink failed to deliver"
            )
            .expect("Failed to register delivery_errors_total"),
        }
    }
}

/// Handle to the process-wide agent metrics. Clones share the same series.
#[derive(Clone)]
pub struct AgentMetrics {
    _private: (),
}

impl Default for AgentMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(AgentMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &AgentMetricsInner {
        GLOBAL_METRICS.get_or_init(AgentMetricsInner::new)
    }

    pub fn inc_cycles(&self) {
        self.inner().cycles.inc();
    }

    pub fn observe_cycle_latency(&self, duration_secs: f64) {
        self.inner().cycle_latency_seconds.observe(duration_secs);
    }

    pub fn set_containers_sampled(&self, count: usize) {
        self.inner().containers_sampled.set(count as i64);
    }

    pub fn inc_batches_delivered(&self) {
        self.inner().batches_delivered.inc();
    }

    pub fn inc_collection_errors(&self) {
        self.inner().collection_errors.inc();
    }

    pub fn inc_delivery_errors(&self) {
        self.inner().delivery_errors.inc();
    }

    pub fn cycles(&self) -> u64 {
        self.inner().cycles.get()
    }
}

/// Lifecycle events tagged with the agent identity
#[derive(Clone)]
pub struct StructuredLogger {
    agent_id: String,
}

impl StructuredLogger {
    pub fn new(agent_id: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
        }
    }

    pub fn log_startup(&self, version: &str, sink: &str, interval_secs: u64) {
        info!(
            event = "agent_started",
            agent_id = %self.agent_id,
            agent_version = %version,
            sink = %sink,
            poll_interval_secs = interval_secs,
            "Dockwatch agent started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "agent_shutdown",
            agent_id = %self.agent_id,
            reason = %reason,
            "Dockwatch agent shutting down"
        );
    }
}
