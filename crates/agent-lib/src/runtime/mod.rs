//! Container runtime access
//!
//! The agent only needs three things from a runtime: the list of running
//! containers, one raw stats snapshot per container, and a way to release
//! the connection on shutdown.

mod docker;

pub use docker::DockerRuntime;

use crate::models::ContainerSummary;
use async_trait::async_trait;
use thiserror::Error;

/// Errors surfaced by a container runtime client
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("failed to connect to container runtime: {0}")]
    Connect(#[source] bollard::errors::Error),

    #[error("container runtime request failed: {0}")]
    Request(#[from] bollard::errors::Error),

    #[error("runtime returned no stats for container {0}")]
    NoStats(String),

    #[error("failed to encode stats snapshot: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Capability for enumerating containers and fetching raw stats snapshots
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// List running containers
    async fn list_containers(&self) -> Result<Vec<ContainerSummary>, RuntimeError>;

    /// Fetch one point-in-time stats snapshot for a container
    async fn fetch_stats(&self, container_id: &str) -> Result<Vec<u8>, RuntimeError>;

    /// Release the runtime connection
    async fn close(&self) -> Result<(), RuntimeError>;
}
