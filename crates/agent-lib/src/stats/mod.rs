//! Container stats snapshots
//!
//! A snapshot is the JSON document Docker returns from its stats endpoint.
//! It carries both the current (`cpu_stats`) and the previous
//! (`precpu_stats`) CPU readings, so utilization can be derived from a
//! single sample without keeping state between cycles.
//!
//! - [`decode`] turns raw bytes into a [`CounterSet`]
//! - the calculator methods on [`CounterSet`] derive percentages and totals

mod calc;
mod decode;

pub use calc::{round_to_thousandths, DerivedMetrics};
pub use decode::{decode, DecodeError};

use std::collections::HashMap;

/// Memory counters in bytes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryCounters {
    pub usage: u64,
    pub cache: u64,
    pub limit: u64,
}

/// CPU counters for one reading period
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuCounters {
    /// Container CPU time in nanoseconds
    pub total_usage: u64,
    /// Host CPU time in nanoseconds
    pub system_usage: u64,
    pub online_cpus: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetworkCounters {
    pub rx_bytes: u64,
    pub tx_bytes: u64,
}

/// One `io_service_bytes_recursive` entry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockIoEntry {
    pub major: u64,
    pub minor: u64,
    pub op: String,
    pub value: u64,
}

/// Decoded counters for a single container snapshot
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CounterSet {
    pub memory: MemoryCounters,
    pub cpu: CpuCounters,
    pub precpu: CpuCounters,
    pub networks: HashMap<String, NetworkCounters>,
    pub block_io: Vec<BlockIoEntry>,
    pub pids: u64,
}
