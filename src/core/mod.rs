// Core business logic module

pub mod atop;
pub mod config;
pub mod sink;

// Re-export commonly used items
pub use atop::{Collector, CollectorConfig, CollectorStats, MetricRecord};
pub use config::Config;
pub use sink::{InfluxSink, MemorySink, MetricSink, StdoutSink};
