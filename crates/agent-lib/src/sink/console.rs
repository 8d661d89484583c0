//! Console sink: one JSON document per batch

use super::{DeliveryError, MetricsSink};
use crate::models::MetricBatch;
use async_trait::async_trait;
use std::io::{self, Write};
use std::sync::Mutex;

/// Writes each batch as a single line of JSON
pub struct ConsoleSink {
    out: Mutex<Box<dyn Write + Send>>,
}

impl ConsoleSink {
    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn stdout() -> Self {
        Self::new(Box::new(io::stdout()))
    }

    fn write_batch(&self, batch: &MetricBatch) -> Result<(), DeliveryError> {
        let mut out = self
            .out
            .lock()
            .map_err(|_| io::Error::other("console writer poisoned"))?;

        serde_json::to_writer(&mut *out, batch)?;
        out.write_all(b"\n")?;
        out.flush()?;
        Ok(())
    }
}

#[async_trait]
impl MetricsSink for ConsoleSink {
    async fn send(&self, batch: &MetricBatch) -> Result<(), DeliveryError> {
        self.write_batch(batch)
    }

    fn name(&self) -> &'static str {
        "stdout"
    }
}
