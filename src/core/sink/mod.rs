//! Storage sinks for normalized metric batches.

mod influx;
mod memory;
mod stdout;

pub use influx::InfluxSink;
pub use memory::MemorySink;
pub use stdout::StdoutSink;

use crate::core::atop::MetricRecord;
use crate::error::Result;

/// Destination for batches of metric records
pub trait MetricSink {
    /// Make sure the named database exists. Must be safe to call repeatedly.
    fn ensure_container(&mut self, name: &str) -> Result<()>;

    /// Write a whole batch in one call; it succeeds or fails as a unit.
    ///
    /// Empty batches must be accepted as a no-op.
    fn write_batch(&mut self, records: &[MetricRecord]) -> Result<()>;
}

impl<S: MetricSink + ?Sized> MetricSink for Box<S> {
    fn ensure_container(&mut self, name: &str) -> Result<()> {
        (**self).ensure_container(name)
    }

    fn write_batch(&mut self, records: &[MetricRecord]) -> Result<()> {
        (**self).write_batch(records)
    }
}
