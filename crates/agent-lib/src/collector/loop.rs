//! Poll loop
//!
//! Sleeps for the configured interval, samples every container, and hands
//! the batch to the sink. Cancellation is cooperative: it is observed while
//! idling and before each sampling phase, never in the middle of a
//! collect or deliver call.

use super::{CollectError, FailurePolicy, SampleCollector};
use crate::health::{components, HealthRegistry};
use crate::observability::AgentMetrics;
use crate::runtime::ContainerRuntime;
use crate::sink::MetricsSink;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{debug, error, info, warn};

/// Shortest interval the runtime's stats API is polled at
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Consecutive listing failures after which the runtime is reported unhealthy
pub const RUNTIME_UNHEALTHY_AFTER: u32 = 3;

#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Time slept before each cycle (default: 10 seconds)
    pub interval: Duration,
    pub failure_policy: FailurePolicy,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            failure_policy: FailurePolicy::default(),
        }
    }
}

/// Phase of the poll loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Sampling,
    Delivering,
    ShuttingDown,
    Stopped,
}

/// Counters returned when the loop stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopReport {
    /// Cycles that reached the sampling phase
    pub cycles: u64,
    pub collection_failures: u64,
    pub batches_delivered: u64,
    pub delivery_failures: u64,
}

pub struct PollLoop {
    collector: SampleCollector,
    runtime: Arc<dyn ContainerRuntime>,
    sink: Arc<dyn MetricsSink>,
    config: PollConfig,
    health: HealthRegistry,
    metrics: AgentMetrics,
    state: LoopState,
    listing_failures: u32,
}

impl PollLoop {
    pub fn new(
        runtime: Arc<dyn ContainerRuntime>,
        sink: Arc<dyn MetricsSink>,
        config: PollConfig,
        health: HealthRegistry,
        metrics: AgentMetrics,
    ) -> Self {
        Self {
            collector: SampleCollector::new(runtime.clone(), config.failure_policy),
            runtime,
            sink,
            config,
            health,
            metrics,
            state: LoopState::Idle,
            listing_failures: 0,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    fn transition(&mut self, next: LoopState) {
        debug!(from = ?self.state, to = ?next, "Poll loop transition");
        self.state = next;
    }

    /// Run until `shutdown` fires (or its sender is dropped), then close the
    /// runtime handle.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) -> LoopReport {
        info!(
            interval_secs = self.config.interval.as_secs(),
            sink = self.sink.name(),
            policy = ?self.config.failure_policy,
            "Starting poll loop"
        );

        let mut report = LoopReport::default();

        loop {
            self.transition(LoopState::Idle);

            tokio::select! {
                biased;
                _ = shutdown.recv() => break,
                _ = tokio::time::sleep(self.config.interval) => {}
            }

            if cancellation_requested(&mut shutdown) {
                break;
            }

            self.run_cycle(&mut report).await;
        }

        self.shutdown().await;
        report
    }

    /// One sample-and-deliver pass. Failures are logged and counted only.
    async fn run_cycle(&mut self, report: &mut LoopReport) {
        self.transition(LoopState::Sampling);
        report.cycles += 1;
        self.metrics.inc_cycles();
        let start = Instant::now();

        let batch = match self.collector.collect().await {
            Ok(batch) => {
                self.listing_failures = 0;
                self.health.set_healthy(components::RUNTIME).await;
                self.health.set_healthy(components::COLLECTOR).await;
                batch
            }
            Err(e) => {
                error!(error = %e, "Error getting container metrics, skipping cycle");
                report.collection_failures += 1;
                self.metrics.inc_collection_errors();

                match &e {
                    CollectError::Enumeration(_) => {
                        self.listing_failures += 1;
                        if self.listing_failures >= RUNTIME_UNHEALTHY_AFTER {
                            self.health
                                .set_unhealthy(components::RUNTIME, e.to_string())
                                .await;
                        } else {
                            self.health
                                .set_degraded(components::RUNTIME, e.to_string())
                                .await;
                        }
                    }
                    _ => {
                        self.listing_failures = 0;
                        self.health
                            .set_degraded(components::COLLECTOR, e.to_string())
                            .await;
                    }
                }
                return;
            }
        };
        self.metrics.set_containers_sampled(batch.len());

        self.transition(LoopState::Delivering);
        match self.sink.send(&batch).await {
            Ok(()) => {
                report.batches_delivered += 1;
                self.metrics.inc_batches_delivered();
                self.health.set_healthy(components::SINK).await;
                self.health.mark_cycle_complete().await;
                debug!(
                    containers = batch.len(),
                    elapsed_ms = start.elapsed().as_millis(),
                    "Batch delivered"
                );
            }
            Err(e) => {
                warn!(sink = self.sink.name(), error = %e, "Could not send metrics to sink");
                report.delivery_failures += 1;
                self.metrics.inc_delivery_errors();
                self.health.set_degraded(components::SINK, e.to_string()).await;
            }
        }

        self.metrics
            .observe_cycle_latency(start.elapsed().as_secs_f64());
    }

    async fn shutdown(&mut self) {
        self.transition(LoopState::ShuttingDown);
        info!("Shutting down poll loop");
        self.health.set_ready(false).await;

        if let Err(e) = self.runtime.close().await {
            error!(error = %e, "Failed to close runtime client");
        }

        self.transition(LoopState::Stopped);
    }
}

/// A pending message, a lagged receiver or a dropped sender all mean stop
fn cancellation_requested(shutdown: &mut broadcast::Receiver<()>) -> bool {
    !matches!(shutdown.try_recv(), Err(TryRecvError::Empty))
}

/// Builder for [`PollLoop`]
#[derive(Default)]
pub struct PollLoopBuilder {
    runtime: Option<Arc<dyn ContainerRuntime>>,
    sink: Option<Arc<dyn MetricsSink>>,
    config: PollConfig,
    health: Option<HealthRegistry>,
    metrics: Option<AgentMetrics>,
}

impl PollLoopBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn runtime(mut self, runtime: Arc<dyn ContainerRuntime>) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn sink(mut self, sink: Arc<dyn MetricsSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn interval(mut self, interval: Duration) -> Self {
        self.config.interval = interval;
        self
    }

    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.config.failure_policy = policy;
        self
    }

    pub fn health(mut self, health: HealthRegistry) -> Self {
        self.health = Some(health);
        self
    }

    pub fn metrics(mut self, metrics: AgentMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn build(self) -> Result<PollLoop, &'static str> {
        let runtime = self.runtime.ok_or("runtime is required")?;
        let sink = self.sink.ok_or("sink is required")?;

        Ok(PollLoop::new(
            runtime,
            sink,
            self.config,
            self.health.unwrap_or_default(),
            self.metrics.unwrap_or_default(),
        ))
    }
}
