//! Snapshot decoding
//!
//! Docker omits or nulls fields depending on platform and cgroup driver
//! (`io_serviced_recursive` is `null` on cgroup v2, `online_cpus` is missing
//! on old daemons), so every field of the wire model is optional and
//! collapses to zero when absent.

use super::{BlockIoEntry, CounterSet, CpuCounters, MemoryCounters, NetworkCounters};
use serde::Deserialize;
use std::collections::HashMap;
use thiserror::Error;

/// Error returned when a snapshot payload is not a well-formed stats document
#[derive(Debug, Error)]
#[error("malformed stats snapshot: {0}")]
pub struct DecodeError(#[from] serde_json::Error);

/// Decode a raw stats snapshot into a [`CounterSet`]
pub fn decode(raw: &[u8]) -> Result<CounterSet, DecodeError> {
    let snapshot: RawSnapshot = serde_json::from_slice(raw)?;
    Ok(snapshot.into())
}

#[derive(Debug, Deserialize)]
struct RawSnapshot {
    pids_stats: Option<RawPids>,
    networks: Option<HashMap<String, RawNetwork>>,
    memory_stats: Option<RawMemory>,
    blkio_stats: Option<RawBlkio>,
    cpu_stats: Option<RawCpu>,
    precpu_stats: Option<RawCpu>,
}

#[derive(Debug, Deserialize)]
struct RawPids {
    current: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawNetwork {
    rx_bytes: Option<u64>,
    tx_bytes: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawMemory {
    usage: Option<u64>,
    limit: Option<u64>,
    stats: Option<RawMemoryDetail>,
}

#[derive(Debug, Deserialize)]
struct RawMemoryDetail {
    cache: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawBlkio {
    io_service_bytes_recursive: Option<Vec<RawBlkioEntry>>,
}

#[derive(Debug, Deserialize)]
struct RawBlkioEntry {
    major: Option<u64>,
    minor: Option<u64>,
    op: Option<String>,
    value: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawCpu {
    cpu_usage: Option<RawCpuUsage>,
    system_cpu_usage: Option<u64>,
    online_cpus: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawCpuUsage {
    total_usage: Option<u64>,
    percpu_usage: Option<Vec<u64>>,
}

impl From<RawCpu> for CpuCounters {
    fn from(raw: RawCpu) -> Self {
        let (total_usage, percpu_len) = match raw.cpu_usage {
            Some(usage) => (
                usage.total_usage.unwrap_or(0),
                usage.percpu_usage.map_or(0, |p| p.len() as u64),
            ),
            None => (0, 0),
        };

        // Daemons before API 1.27 only report per-CPU usage
        let online_cpus = match raw.online_cpus {
            Some(n) if n > 0 => n,
            _ => percpu_len,
        };

        Self {
            total_usage,
            system_usage: raw.system_cpu_usage.unwrap_or(0),
            online_cpus,
        }
    }
}

impl From<RawSnapshot> for CounterSet {
    fn from(raw: RawSnapshot) -> Self {
        let memory = raw
            .memory_stats
            .map(|m| MemoryCounters {
                usage: m.usage.unwrap_or(0),
                cache: m.stats.and_then(|s| s.cache).unwrap_or(0),
                limit: m.limit.unwrap_or(0),
            })
            .unwrap_or_default();

        let networks = raw
            .networks
            .unwrap_or_default()
            .into_iter()
            .map(|(name, net)| {
                let counters = NetworkCounters {
                    rx_bytes: net.rx_bytes.unwrap_or(0),
                    tx_bytes: net.tx_bytes.unwrap_or(0),
                };
                (name, counters)
            })
            .collect();

        let block_io = raw
            .blkio_stats
            .and_then(|b| b.io_service_bytes_recursive)
            .unwrap_or_default()
            .into_iter()
            .map(|e| BlockIoEntry {
                major: e.major.unwrap_or(0),
                minor: e.minor.unwrap_or(0),
                op: e.op.unwrap_or_default(),
                value: e.value.unwrap_or(0),
            })
            .collect();

        Self {
            memory,
            cpu: raw.cpu_stats.map(CpuCounters::from).unwrap_or_default(),
            precpu: raw.precpu_stats.map(CpuCounters::from).unwrap_or_default(),
            networks,
            block_io,
            pids: raw.pids_stats.and_then(|p| p.current).unwrap_or(0),
        }
    }
}
