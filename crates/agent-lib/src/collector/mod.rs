//! Metrics collection from the container runtime
//!
//! [`SampleCollector`] produces one batch per call by enumerating containers
//! and deriving metrics from each container's stats snapshot.
//! [`PollLoop`] drives it on a fixed interval and hands each batch to a sink.

mod r#loop;
mod sampler;


pub use r#loop::{
    LoopReport, LoopState, PollConfig, PollLoop, PollLoopBuilder, MIN_POLL_INTERVAL,
    RUNTIME_UNHEALTHY_AFTER,
};
pub use sampler::{display_name, SampleCollector};

use crate::runtime::RuntimeError;
use crate::stats::DecodeError;
use serde::Deserialize;
use thiserror::Error;

/// What to do when a single container cannot be sampled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Fail the whole cycle
    #[default]
    AbortCycle,
    /// Leave the container out of this cycle's batch
    SkipContainer,
}

/// Errors that fail a collection cycle
#[derive(Debug, Error)]
pub enum CollectError {
    #[error("failed to list containers: {0}")]
    Enumeration(#[source] RuntimeError),

    #[error("failed to fetch stats for container {container_id}: {source}")]
    Fetch {
        container_id: String,
        #[source]
        source: RuntimeError,
    },

    #[error("failed to decode stats for container {container_id}: {source}")]
    Decode {
        container_id: String,
        #[source]
        source: DecodeError,
    },
}
