//! Docker Engine runtime client

use super::{ContainerRuntime, RuntimeError};
use crate::models::ContainerSummary;
use async_trait::async_trait;
use bollard::container::{ListContainersOptions, StatsOptions};
use bollard::Docker;
use tokio_stream::StreamExt;
use tracing::debug;

/// Runtime client backed by the local Docker daemon
pub struct DockerRuntime {
    docker: Docker,
}

impl DockerRuntime {
    /// Connect using `DOCKER_HOST` or the platform default socket
    pub fn connect() -> Result<Self, RuntimeError> {
        let docker = Docker::connect_with_local_defaults().map_err(RuntimeError::Connect)?;
        Ok(Self { docker })
    }

    pub fn from_client(docker: Docker) -> Self {
        Self { docker }
    }
}

/// Convert Docker's summary into the runtime-neutral model.
/// Docker reports every name a container is reachable by; the first is the
/// primary one.
fn to_summary(container: bollard::models::ContainerSummary) -> ContainerSummary {
    ContainerSummary {
        id: container.id.unwrap_or_default(),
        name: container
            .names
            .and_then(|names| names.into_iter().next())
            .unwrap_or_default(),
        image: container.image.unwrap_or_default(),
        state: container.state.unwrap_or_default(),
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn list_containers(&self) -> Result<Vec<ContainerSummary>, RuntimeError> {
        let options = ListContainersOptions::<String> {
            all: false,
            ..Default::default()
        };

        let containers = self.docker.list_containers(Some(options)).await?;
        debug!(count = containers.len(), "Listed containers");

        Ok(containers.into_iter().map(to_summary).collect())
    }

    async fn fetch_stats(&self, container_id: &str) -> Result<Vec<u8>, RuntimeError> {
        let options = StatsOptions {
            stream: false,
            one_shot: true,
        };

        let stream = self.docker.stats(container_id, Some(options));
        tokio::pin!(stream);
        let stats = match stream.next().await {
            Some(stats) => stats?,
            None => return Err(RuntimeError::NoStats(container_id.to_string())),
        };

        Ok(serde_json::to_vec(&stats)?)
    }

    async fn close(&self) -> Result<(), RuntimeError> {
        // bollard holds a pooled connector; dropping the client releases it
        debug!("Closing docker client");
        Ok(())
    }
}
