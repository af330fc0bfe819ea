//! Line decoding for `atop -P` parseable output.
//!
//! Every line starts with a category label. Data lines continue with a fixed
//! header (`host epoch date time delta`) followed by category-specific fields.

use crate::error::{CollectorError, Result};

/// Largest interval (seconds) a report may cover and still be stored.
///
/// The first report after atop starts covers the time since boot and is not
/// comparable to the steady-state samples.
pub const MAX_DELTA_SECS: i64 = 1;

/// Number of header tokens between the label and the category fields
pub const HEADER_LEN: usize = 5;

/// Category label of a line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Label {
    Reset,
    Sep,
    Cpu,
    Cpl,
    Mem,
    Dsk,
    Unknown(String),
}

impl Label {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "RESET" => Label::Reset,
            "SEP" => Label::Sep,
            "CPU" => Label::Cpu,
            "CPL" => Label::Cpl,
            "MEM" => Label::Mem,
            "DSK" => Label::Dsk,
            other => Label::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Label::Reset => "RESET",
            Label::Sep => "SEP",
            Label::Cpu => "CPU",
            Label::Cpl => "CPL",
            Label::Mem => "MEM",
            Label::Dsk => "DSK",
            Label::Unknown(raw) => raw,
        }
    }

    /// Whether lines with this label carry a sample header and fields
    pub fn is_data(&self) -> bool {
        matches!(self, Label::Cpu | Label::Cpl | Label::Mem | Label::Dsk)
    }
}

/// A line split into its label and the remaining whitespace-delimited tokens
#[derive(Debug, Clone, PartialEq)]
pub struct RawLine<'a> {
    pub label: Label,
    pub tokens: Vec<&'a str>,
}

/// Split a line on runs of whitespace. Empty or blank lines yield `None`.
pub fn decode_line(line: &str) -> Option<RawLine<'_>> {
    let mut parts = line.split_whitespace();
    let label = Label::parse(parts.next()?);
    Some(RawLine {
        label,
        tokens: parts.collect(),
    })
}

/// Header shared by every data line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleMetadata {
    pub host: String,
    pub timestamp: i64,
    pub delta: i64,
}

impl SampleMetadata {
    /// Decode the header of a data line and return it with the remaining fields.
    ///
    /// Returns `Ok(None)` when the line is too short to carry a header; the
    /// date and time tokens are not interpreted.
    pub fn decode<'l, 't>(
        label: &Label,
        tokens: &'l [&'t str],
    ) -> Result<Option<(Self, &'l [&'t str])>> {
        if tokens.len() < HEADER_LEN {
            return Ok(None);
        }

        let timestamp = tokens[1].parse::<i64>().map_err(|_| {
            CollectorError::malformed_metadata(
                label.as_str(),
                format!("invalid epoch timestamp '{}'", tokens[1]),
            )
        })?;
        let delta = tokens[4].parse::<i64>().map_err(|_| {
            CollectorError::malformed_metadata(
                label.as_str(),
                format!("invalid interval '{}'", tokens[4]),
            )
        })?;

        let metadata = SampleMetadata {
            host: tokens[0].to_string(),
            timestamp,
            delta,
        };
        Ok(Some((metadata, &tokens[HEADER_LEN..])))
    }

    /// Staleness filter: only steady-state one-second reports are stored.
    pub fn is_eligible(&self) -> bool {
        self.is_eligible_within(MAX_DELTA_SECS)
    }

    /// Staleness filter for producers sampling at a longer interval
    pub fn is_eligible_within(&self, max_delta_secs: i64) -> bool {
        self.delta <= max_delta_secs
    }
}
