//! Dockwatch agent library
//!
//! This crate provides the core functionality for:
//! - Decoding container stats snapshots and deriving utilization metrics
//! - Periodic sampling of every running container
//! - Delivering metric batches to stdout or an HTTP endpoint
//! - Health checks and observability of the agent itself

pub mod collector;
pub mod health;
pub mod models;
pub mod observability;
pub mod runtime;
pub mod sink;
pub mod stats;

#[cfg(test)]
mod test_support;

pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{AgentMetrics, StructuredLogger};
