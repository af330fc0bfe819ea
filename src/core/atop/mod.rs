//! atop parseable-output pipeline.
//!
//! `atop -P CPU,CPL,MEM,DSK 1` prints one line per category per interval and
//! closes each interval with `SEP`. Lines are decoded, filtered for staleness,
//! normalized into typed records and written to a sink per interval.

mod accumulator;
pub mod line;
pub mod normalize;
mod producer;
mod record;

pub use accumulator::{Collector, CollectorConfig, CollectorStats, LineOutcome};
pub use line::{decode_line, Label, RawLine, SampleMetadata};
pub use normalize::{normalize, Normalized};
pub use producer::{AtopProducer, KillHandle, CATEGORIES};
pub use record::{FieldValue, Fields, MetricRecord, Tags, MEASUREMENT};
