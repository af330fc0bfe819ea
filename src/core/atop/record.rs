use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write;

/// Measurement name every record is written under
pub const MEASUREMENT: &str = "performance";

/// A single numeric field value.
///
/// Counts and byte quantities stay integral; rates and ratios are floats.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Int(i64),
    Float(f64),
}

impl FieldValue {
    pub fn as_f64(&self) -> f64 {
        match *self {
            FieldValue::Int(v) => v as f64,
            FieldValue::Float(v) => v,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            FieldValue::Int(v) => Some(v),
            FieldValue::Float(_) => None,
        }
    }

    fn is_finite(&self) -> bool {
        match *self {
            FieldValue::Int(_) => true,
            FieldValue::Float(v) => v.is_finite(),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

pub type Fields = BTreeMap<String, FieldValue>;
pub type Tags = BTreeMap<String, String>;

/// One normalized sample, ready for the storage sink
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricRecord {
    pub measurement: &'static str,
    pub tags: Tags,
    pub fields: Fields,
    /// Sample time in epoch seconds, as reported by the producer
    pub timestamp: Option<i64>,
}

impl MetricRecord {
    pub fn new(tags: Tags, fields: Fields) -> Self {
        Self {
            measurement: MEASUREMENT,
            tags,
            fields,
            timestamp: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn field(&self, key: &str) -> Option<FieldValue> {
        self.fields.get(key).copied()
    }

    /// Render the record as one InfluxDB line-protocol point.
    ///
    /// Non-finite floats are dropped; returns `None` when nothing is left to write.
    pub fn to_line_protocol(&self) -> Option<String> {
        let mut line = escape(self.measurement, &[',', ' ']);

        for (key, value) in &self.tags {
            if value.is_empty() {
                continue;
            }
            let _ = write!(
                line,
                ",{}={}",
                escape(key, &[',', '=', ' ']),
                escape(value, &[',', '=', ' '])
            );
        }

        let mut first = true;
        for (key, value) in self.fields.iter().filter(|(_, v)| v.is_finite()) {
            line.push(if first { ' ' } else { ',' });
            first = false;
            let key = escape(key, &[',', '=', ' ']);
            let _ = match value {
                FieldValue::Int(v) => write!(line, "{}={}i", key, v),
                FieldValue::Float(v) => write!(line, "{}={}", key, v),
            };
        }

        if first {
            return None;
        }

        if let Some(ts) = self.timestamp {
            let _ = write!(line, " {}", ts);
        }

        Some(line)
    }
}

fn escape(raw: &str, special: &[char]) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c == '\\' || special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
