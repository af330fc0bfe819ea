//! Batch accumulation between `SEP` markers.
//!
//! atop closes every sample interval with a `SEP` line. Records decoded in
//! between are collected and written to the sink as one batch when the marker
//! arrives, so a batch never mixes two intervals.

use std::io::BufRead;
use std::mem;

use super::line::{decode_line, Label, SampleMetadata, MAX_DELTA_SECS};
use super::normalize::normalize;
use super::record::MetricRecord;
use crate::core::sink::MetricSink;
use crate::error::Result;

/// Configuration for the batch accumulator
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Write a partially filled batch when the stream ends.
    ///
    /// Off by default: a trailing batch without its `SEP` is dropped.
    pub flush_on_close: bool,
    /// Samples covering more seconds than this are dropped as stale
    pub max_delta_secs: i64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            flush_on_close: false,
            max_delta_secs: MAX_DELTA_SECS,
        }
    }
}

/// Counters kept over the lifetime of a collector
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectorStats {
    pub lines: u64,
    pub records: u64,
    pub stale: u64,
    pub ignored: u64,
    pub malformed: u64,
    pub batches: u64,
}

/// What happened to a single input line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOutcome {
    /// Blank line, unknown label, or a data line without a usable header
    Ignored,
    /// `RESET` marker
    Reset,
    /// `SEP` marker; carries the number of records written
    Flushed(usize),
    /// Data line covering more than one second
    Stale,
    /// Data line that normalized to no fields
    Empty,
    /// Record appended to the open batch
    Appended,
}

/// Reads atop lines, normalizes them and writes `SEP`-delimited batches
pub struct Collector<S: MetricSink> {
    sink: S,
    config: CollectorConfig,
    batch: Vec<MetricRecord>,
    stats: CollectorStats,
}

impl<S: MetricSink> Collector<S> {
    /// Create a collector with default configuration
    pub fn new(sink: S) -> Self {
        Self::with_config(sink, CollectorConfig::default())
    }

    pub fn with_config(sink: S, config: CollectorConfig) -> Self {
        Self {
            sink,
            config,
            batch: Vec::new(),
            stats: CollectorStats::default(),
        }
    }

    pub fn stats(&self) -> CollectorStats {
        self.stats
    }

    /// Records waiting for the next `SEP`
    pub fn pending(&self) -> &[MetricRecord] {
        &self.batch
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Handle one line of producer output (without its trailing newline).
    ///
    /// Malformed numeric tokens are returned as line-local errors and leave
    /// the open batch untouched. Sink failures on `SEP` are returned as-is.
    pub fn process_line(&mut self, line: &str) -> Result<LineOutcome> {
        self.stats.lines += 1;

        let Some(raw) = decode_line(line) else {
            return Ok(LineOutcome::Ignored);
        };
        log::debug!("label={} values={:?}", raw.label.as_str(), raw.tokens);

        match raw.label {
            Label::Reset => Ok(LineOutcome::Reset),
            Label::Sep => self.flush().map(LineOutcome::Flushed),
            Label::Unknown(_) => {
                self.stats.ignored += 1;
                Ok(LineOutcome::Ignored)
            }
            Label::Cpu | Label::Cpl | Label::Mem | Label::Dsk => {
                self.process_sample(&raw.label, &raw.tokens)
            }
        }
    }

    fn process_sample(&mut self, label: &Label, tokens: &[&str]) -> Result<LineOutcome> {
        let decoded = SampleMetadata::decode(label, tokens).inspect_err(|_| {
            self.stats.malformed += 1;
        })?;
        let Some((metadata, values)) = decoded else {
            self.stats.ignored += 1;
            return Ok(LineOutcome::Ignored);
        };

        if !metadata.is_eligible_within(self.config.max_delta_secs) {
            log::debug!(
                "Skipping {} sample from {} at {} covering {}s",
                label.as_str(),
                metadata.host,
                sample_time(metadata.timestamp),
                metadata.delta
            );
            self.stats.stale += 1;
            return Ok(LineOutcome::Stale);
        }

        let normalized = normalize(label, values).inspect_err(|_| {
            self.stats.malformed += 1;
        })?;
        if normalized.is_empty() {
            return Ok(LineOutcome::Empty);
        }

        let record = MetricRecord::new(normalized.tags, normalized.fields)
            .with_timestamp(metadata.timestamp);
        log::debug!("record={:?}", record);

        self.batch.push(record);
        self.stats.records += 1;
        Ok(LineOutcome::Appended)
    }

    /// Write the open batch as one sink call and start a new one.
    ///
    /// An empty batch is still handed to the sink. The batch is cleared even
    /// when the write fails, so a failed batch is never written twice.
    pub fn flush(&mut self) -> Result<usize> {
        let batch = mem::take(&mut self.batch);
        let count = batch.len();
        self.sink.write_batch(&batch)?;
        self.stats.batches += 1;
        log::debug!("Flushed batch of {} records", count);
        Ok(count)
    }

    /// Consume lines until the stream ends.
    ///
    /// Line-local errors, including lines that are not valid UTF-8, are logged
    /// and counted; read and sink errors stop the loop and are returned.
    pub fn run<R: BufRead>(&mut self, mut reader: R) -> Result<CollectorStats> {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }

            let line = match std::str::from_utf8(strip_line_ending(&buf)) {
                Ok(line) => line,
                Err(e) => {
                    self.stats.lines += 1;
                    self.stats.malformed += 1;
                    log::warn!("Dropping line: not valid UTF-8 ({})", e);
                    continue;
                }
            };

            match self.process_line(line) {
                Ok(_) => {}
                Err(e) if e.is_line_local() => {
                    log::warn!("Dropping line: {}", e);
                }
                Err(e) => return Err(e),
            }
        }

        log::info!("Producer stream closed");
        if !self.batch.is_empty() {
            if self.config.flush_on_close {
                self.flush()?;
            } else {
                log::warn!(
                    "Discarding {} records from the unterminated last interval",
                    self.batch.len()
                );
                self.batch.clear();
            }
        }

        let stats = self.stats;
        log::info!(
            "lines={} records={} batches={} stale={} ignored={} malformed={}",
            stats.lines,
            stats.records,
            stats.batches,
            stats.stale,
            stats.ignored,
            stats.malformed
        );
        Ok(stats)
    }
}

fn strip_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

fn sample_time(epoch_secs: i64) -> String {
    chrono::DateTime::from_timestamp(epoch_secs, 0)
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| epoch_secs.to_string())
}
