//! Dockwatch agent
//!
//! Samples resource usage of every running Docker container on a fixed
//! interval and delivers each batch to stdout or an HTTP endpoint.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dockwatch_lib::{
    collector::PollLoopBuilder,
    health::{components, HealthRegistry},
    observability::{AgentMetrics, StructuredLogger},
    runtime::DockerRuntime,
    sink::create_sink,
};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;
mod config;

const AGENT_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "dockwatch-agent")]
#[command(version, about = "Container resource sampling agent", long_about = None)]
struct Cli {
    /// Path to the configuration file
    #[arg(long, env = "DOCKWATCH_CONFIG_FILE", default_value = config::DEFAULT_CONFIG_PATH)]
    config_file: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the agent until interrupted
    Run,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so they never interleave with the stdout sink
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = config::AgentConfig::load(&cli.config_file)?;

    match cli.command {
        Commands::Run => run(config).await,
    }
}

async fn run(config: config::AgentConfig) -> Result<()> {
    let logger = StructuredLogger::new(&config.agent_id);
    let poll_config = config.poll_config();
    let sink = create_sink(&config.sink_config()).context("Failed to create sink")?;
    let runtime = Arc::new(DockerRuntime::connect().context("Failed to create docker client")?);

    let health_registry = HealthRegistry::new();
    health_registry.register(components::RUNTIME).await;
    health_registry.register(components::COLLECTOR).await;
    health_registry.register(components::SINK).await;
    let metrics = AgentMetrics::new();

    if let Some(port) = config.api_port {
        let state = Arc::new(api::AppState::new(health_registry.clone()));
        tokio::spawn(async move {
            if let Err(e) = api::serve(port, state).await {
                error!(error = %e, "API server stopped");
            }
        });
    }

    let poll_loop = PollLoopBuilder::new()
        .runtime(runtime)
        .sink(sink.clone())
        .interval(poll_config.interval)
        .failure_policy(poll_config.failure_policy)
        .health(health_registry.clone())
        .metrics(metrics)
        .build()
        .map_err(anyhow::Error::msg)?;

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    tokio::spawn(forward_interrupt(
        tokio::signal::ctrl_c(),
        shutdown_tx,
        logger.clone(),
    ));

    logger.log_startup(AGENT_VERSION, sink.name(), poll_config.interval.as_secs());
    health_registry.set_ready(true).await;

    let report = poll_loop.run(shutdown_rx).await;
    info!(
        cycles = report.cycles,
        delivered = report.batches_delivered,
        collection_failures = report.collection_failures,
        delivery_failures = report.delivery_failures,
        "Agent stopped"
    );

    Ok(())
}

/// Broadcast shutdown once `signal` fires. If the handler cannot be
/// installed the sender is held forever, since a dropped sender also stops
/// the poll loop.
async fn forward_interrupt<F>(
    signal: F,
    shutdown_tx: broadcast::Sender<()>,
    logger: StructuredLogger,
) where
    F: Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => {
            logger.log_shutdown("SIGINT received");
            let _ = shutdown_tx.send(());
        }
        Err(e) => {
            error!(error = %e, "Failed to listen for interrupt signal, running until killed");
            std::future::pending::<()>().await;
        }
    }
}
