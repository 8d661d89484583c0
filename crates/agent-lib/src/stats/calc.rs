//! Derived metrics over a decoded [`CounterSet`]
//!
//! Formulas follow the Docker CLI (`docker stats`):
//!
//! ```text
//! used_memory    = memory.usage - memory.stats.cache
//! memory_percent = used_memory / memory.limit * 100
//! cpu_delta      = cpu.total_usage - precpu.total_usage
//! system_delta   = cpu.system_usage - precpu.system_usage
//! cpu_percent    = cpu_delta / system_delta * online_cpus * 100
//! ```

use super::CounterSet;

/// All metrics derived from one counter set, with percentages rounded
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedMetrics {
    pub cpu_percent: f64,
    pub memory_used: i64,
    pub memory_percent: Option<f64>,
    pub network_rx: u64,
    pub network_tx: u64,
    pub block_read: u64,
    pub block_write: u64,
}

impl CounterSet {
    /// Memory in use excluding page cache. Negative only if the runtime
    /// reports a cache larger than the usage.
    pub fn used_memory(&self) -> i64 {
        saturating_i64(i128::from(self.memory.usage) - i128::from(self.memory.cache))
    }

    pub fn available_memory(&self) -> u64 {
        self.memory.limit
    }

    /// Memory utilization percent, or `None` when no limit is reported
    pub fn memory_percent(&self) -> Option<f64> {
        if self.memory.limit == 0 {
            return None;
        }
        Some(self.used_memory() as f64 / self.memory.limit as f64 * 100.0)
    }

    pub fn cpu_delta(&self) -> i64 {
        saturating_i64(i128::from(self.cpu.total_usage) - i128::from(self.precpu.total_usage))
    }

    pub fn system_cpu_delta(&self) -> i64 {
        saturating_i64(i128::from(self.cpu.system_usage) - i128::from(self.precpu.system_usage))
    }

    /// CPU utilization percent across all online CPUs.
    ///
    /// Returns 0 when the host CPU counter did not advance, which is the
    /// case for the first sample after a container starts.
    pub fn cpu_percent(&self) -> f64 {
        let system_delta = self.system_cpu_delta();
        if system_delta <= 0 {
            return 0.0;
        }
        self.cpu_delta() as f64 / system_delta as f64 * self.cpu.online_cpus as f64 * 100.0
    }

    /// Cumulative (rx, tx) bytes over all interfaces
    pub fn network_totals(&self) -> (u64, u64) {
        self.networks.values().fold((0, 0), |(rx, tx), net| {
            (rx.saturating_add(net.rx_bytes), tx.saturating_add(net.tx_bytes))
        })
    }

    /// Cumulative (read, write) bytes over all block devices
    pub fn block_totals(&self) -> (u64, u64) {
        let mut read = 0u64;
        let mut write = 0u64;

        for entry in &self.block_io {
            match entry.op.as_bytes().first() {
                Some(b'r' | b'R') => read = read.saturating_add(entry.value),
                Some(b'w' | b'W') => write = write.saturating_add(entry.value),
                _ => {}
            }
        }

        (read, write)
    }

    /// Compute every derived metric for this counter set
    pub fn derive(&self) -> DerivedMetrics {
        let (network_rx, network_tx) = self.network_totals();
        let (block_read, block_write) = self.block_totals();

        DerivedMetrics {
            cpu_percent: round_to_thousandths(self.cpu_percent()),
            memory_used: self.used_memory(),
            memory_percent: self.memory_percent().map(round_to_thousandths),
            network_rx,
            network_tx,
            block_read,
            block_write,
        }
    }
}

fn saturating_i64(value: i128) -> i64 {
    i64::try_from(value).unwrap_or(if value < 0 { i64::MIN } else { i64::MAX })
}

/// Round to 3 decimal places, half away from zero.
///
/// Rounding is done on the shortest decimal form of `value`, so `0.5005`
/// becomes `0.501` even though its binary value is slightly below the
/// midpoint.
pub fn round_to_thousandths(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }

    // `Display` for f64 never uses exponent notation
    let repr = value.abs().to_string();
    let Some((int_part, frac_part)) = repr.split_once('.') else {
        return value;
    };
    if frac_part.len() <= 3 {
        return value;
    }

    let mut digits: Vec<u8> = int_part
        .bytes()
        .chain(frac_part.bytes().take(3))
        .map(|b| b - b'0')
        .collect();

    if frac_part.as_bytes()[3] >= b'5' {
        let mut carry = true;
        for digit in digits.iter_mut().rev() {
            if *digit == 9 {
                *digit = 0;
            } else {
                *digit += 1;
                carry = false;
                break;
            }
        }
        if carry {
            digits.insert(0, 1);
        }
    }

    let split = digits.len() - 3;
    let mut rounded = String::with_capacity(digits.len() + 1);
    rounded.extend(digits[..split].iter().map(|d| char::from(b'0' + d)));
    rounded.push('.');
    rounded.extend(digits[split..].iter().map(|d| char::from(b'0' + d)));

    match rounded.parse::<f64>() {
        Ok(magnitude) if magnitude == 0.0 => 0.0,
        Ok(magnitude) => magnitude.copysign(value),
        Err(_) => value,
    }
}
