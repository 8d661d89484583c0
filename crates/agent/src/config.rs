//! Agent configuration
//!
//! Loaded once at startup from a YAML file, with `DOCKWATCH_*` environment
//! variables taking precedence, then validated before the poll loop starts.

use anyhow::{bail, Context, Result};
use dockwatch_lib::collector::{FailurePolicy, PollConfig, MIN_POLL_INTERVAL};
use dockwatch_lib::sink::SinkConfig;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/dockwatch/dockwatch.yaml";

/// Where batches are delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Print to standard output
    Stdout,
    /// POST to `api_endpoint`
    Api,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    /// Identity used to label log events
    #[serde(default = "default_agent_id")]
    pub agent_id: String,

    pub backend: Backend,

    /// Ingestion endpoint, required for the `api` backend
    #[serde(default)]
    pub api_endpoint: Option<String>,

    /// Bearer token, required for the `api` backend
    #[serde(default)]
    pub api_key: Option<String>,

    /// Seconds between cycles, at least 2
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,

    #[serde(default)]
    pub failure_policy: FailurePolicy,

    /// Port for /healthz, /readyz and /metrics; disabled when unset
    #[serde(default)]
    pub api_port: Option<u16>,
}

fn default_agent_id() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "unknown".to_string())
}

fn default_poll_interval() -> u64 {
    10
}

impl AgentConfig {
    /// Load and validate configuration from `path` and the environment
    pub fn load(path: &Path) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(config::Environment::with_prefix("DOCKWATCH").try_parsing(true))
            .build()
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config: Self = config
            .try_deserialize()
            .context("Failed to parse configuration")?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.poll_interval < MIN_POLL_INTERVAL.as_secs() {
            bail!(
                "poll interval must be at least {} seconds",
                MIN_POLL_INTERVAL.as_secs()
            );
        }

        if self.backend == Backend::Api {
            if self.api_endpoint.as_deref().map_or(true, str::is_empty) {
                bail!("api_endpoint is required for the api backend");
            }
            if self.api_key.as_deref().map_or(true, str::is_empty) {
                bail!("api_key is required for the api backend");
            }
        }

        Ok(())
    }

    pub fn poll_config(&self) -> PollConfig {
        PollConfig {
            interval: Duration::from_secs(self.poll_interval),
            failure_policy: self.failure_policy,
        }
    }

    pub fn sink_config(&self) -> SinkConfig {
        match self.backend {
            Backend::Stdout => SinkConfig::Console,
            Backend::Api => SinkConfig::Http {
                endpoint: self.api_endpoint.clone().unwrap_or_default(),
                api_key: self.api_key.clone().unwrap_or_default(),
            },
        }
    }
}
