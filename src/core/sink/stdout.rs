use std::io::{self, Write};

use super::MetricSink;
use crate::core::atop::MetricRecord;
use crate::error::Result;

/// Prints each batch as InfluxDB line protocol instead of storing it
#[derive(Debug, Default)]
pub struct StdoutSink;

/// Write one line-protocol point per record; an empty batch writes nothing
fn write_to<W: Write>(out: &mut W, records: &[MetricRecord]) -> io::Result<()> {
    for line in records.iter().filter_map(MetricRecord::to_line_protocol) {
        writeln!(out, "{}", line)?;
    }
    out.flush()
}

impl MetricSink for StdoutSink {
    fn ensure_container(&mut self, name: &str) -> Result<()> {
        log::info!("Dry run: not creating database '{}'", name);
        Ok(())
    }

    fn write_batch(&mut self, records: &[MetricRecord]) -> Result<()> {
        write_to(&mut io::stdout().lock(), records)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::atop::{FieldValue, Fields, Tags};

    fn record(disk: &str, io_ms: i64) -> MetricRecord {
        let mut tags = Tags::new();
        tags.insert("disk".to_string(), disk.to_string());
        let mut fields = Fields::new();
        fields.insert("dsk.io_ms".to_string(), FieldValue::Int(io_ms));
        MetricRecord::new(tags, fields).with_timestamp(1001)
    }

    #[test]
    fn test_write_batch_lines() {
        let mut out = Vec::new();
        write_to(&mut out, &[record("sda", 250), record("sdb", 3)]).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "performance,disk=sda dsk.io_ms=250i 1001\nperformance,disk=sdb dsk.io_ms=3i 1001\n"
        );
    }

    #[test]
    fn test_empty_batch_prints_nothing() {
        let mut out = Vec::new();
        write_to(&mut out, &[]).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_stdout_sink_accepts_empty_batch() {
        let mut sink = StdoutSink;
        assert!(sink.ensure_container("performance").is_ok());
        assert!(sink.write_batch(&[]).is_ok());
    }
}
