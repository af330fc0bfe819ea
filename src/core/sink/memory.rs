use super::MetricSink;
use crate::core::atop::MetricRecord;
use crate::error::{CollectorError, Result};

/// Sink that keeps every batch in memory, used for replay checks and tests
#[derive(Debug, Default)]
pub struct MemorySink {
    pub containers: Vec<String>,
    pub batches: Vec<Vec<MetricRecord>>,
    /// Reject every write with a sink error
    pub fail_writes: bool,
}

impl MemorySink {
    pub fn records(&self) -> impl Iterator<Item = &MetricRecord> {
        self.batches.iter().flatten()
    }
}

impl MetricSink for MemorySink {
    fn ensure_container(&mut self, name: &str) -> Result<()> {
        if !self.containers.iter().any(|c| c == name) {
            self.containers.push(name.to_string());
        }
        Ok(())
    }

    fn write_batch(&mut self, records: &[MetricRecord]) -> Result<()> {
        if self.fail_writes {
            return Err(CollectorError::sink("memory sink rejects writes"));
        }
        self.batches.push(records.to_vec());
        Ok(())
    }
}
