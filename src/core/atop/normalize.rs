//! Per-category conversion from raw atop fields to named metric values.
//!
//! Fields are paired positionally with a fixed key list. A line with fewer
//! tokens than keys simply yields fewer metrics, and surplus tokens are
//! ignored. Derived values are only emitted when every input they need is
//! present.

use super::line::Label;
use super::record::{FieldValue, Fields, Tags};
use crate::error::{CollectorError, Result};

/// Bytes per disk sector as reported by atop
pub const SECTOR_SIZE: i64 = 512;

const CPU_TICK_KEYS: [&str; 9] = [
    "sys", "user", "nice", "idle", "wait", "irq", "softirq", "steal", "guest",
];

const CPU_KEYS: [&str; 15] = [
    "tps",
    "ncpu",
    "sys",
    "user",
    "nice",
    "idle",
    "wait",
    "irq",
    "softirq",
    "steal",
    "guest",
    "freq",
    "freq_perc",
    "instructions",
    "cycles",
];

const CPL_KEYS: [&str; 6] = ["ncpu", "load1", "load5", "load15", "ctxsw", "hwirqs"];

const MEM_KEYS: [&str; 18] = [
    "page_size",
    "total",
    "free",
    "cache",
    "buff",
    "slab",
    "dirty",
    "recl_slab",
    "baloon",
    "shared",
    "res_shared",
    "swapped",
    "huge_page_size",
    "htotal",
    "hfree",
    "zfs_cache",
    "ksm",
    "ksm2",
];

const DSK_KEYS: [&str; 7] = [
    "io_ms",
    "read_op",
    "read_sect",
    "write_op",
    "write_sect",
    "discard_op",
    "discard_sect",
];

/// Output of the normalizer for one line
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Normalized {
    pub fields: Fields,
    pub tags: Tags,
}

impl Normalized {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Convert the category fields of a data line (header already stripped).
///
/// Labels without a known schema produce an empty result.
pub fn normalize(label: &Label, values: &[&str]) -> Result<Normalized> {
    match label {
        Label::Cpu => normalize_cpu(values),
        Label::Cpl => normalize_cpl(values),
        Label::Mem => normalize_mem(values),
        Label::Dsk => normalize_dsk(values),
        Label::Reset | Label::Sep | Label::Unknown(_) => Ok(Normalized::default()),
    }
}

fn parse_int(label: &str, key: &str, token: &str) -> Result<i64> {
    token
        .parse::<i64>()
        .map_err(|_| CollectorError::malformed_field(label, key, token))
}

fn parse_float(label: &str, key: &str, token: &str) -> Result<f64> {
    token
        .parse::<f64>()
        .map_err(|_| CollectorError::malformed_field(label, key, token))
}

fn int_field(fields: &Fields, key: &str) -> Option<i64> {
    fields.get(key).and_then(FieldValue::as_i64)
}

fn normalize_cpu(values: &[&str]) -> Result<Normalized> {
    let mut out = Normalized::default();
    let Some(tps_token) = values.first() else {
        return Ok(out);
    };
    let tps = parse_int("CPU", "tps", tps_token)?;

    for (key, token) in CPU_KEYS.iter().zip(values) {
        let raw = parse_int("CPU", key, token)?;
        let value = if CPU_TICK_KEYS.contains(key) {
            // Rates are meaningless without a tick base
            if tps <= 0 {
                continue;
            }
            FieldValue::Float(raw as f64 / tps as f64)
        } else {
            FieldValue::Int(raw)
        };
        out.fields.insert(format!("cpu.{}", key), value);
    }

    let ncpu = int_field(&out.fields, "cpu.ncpu").filter(|n| *n > 0);
    let idle = out.fields.get("cpu.idle").map(FieldValue::as_f64);
    if let (Some(ncpu), Some(idle)) = (ncpu, idle) {
        out.fields.insert(
            "cpu.usage".to_string(),
            FieldValue::Float(1.0 - idle / ncpu as f64),
        );
    }

    Ok(out)
}

fn normalize_cpl(values: &[&str]) -> Result<Normalized> {
    let mut out = Normalized::default();
    for (key, token) in CPL_KEYS.iter().zip(values) {
        let value = if key.starts_with("load") {
            FieldValue::Float(parse_float("CPL", key, token)?)
        } else {
            FieldValue::Int(parse_int("CPL", key, token)?)
        };
        out.fields.insert(format!("load.{}", key), value);
    }
    Ok(out)
}

/// Page sizes seen so far while walking a MEM line
#[derive(Debug, Clone, Copy, Default)]
struct PageContext {
    page_size: Option<i64>,
    huge_page_size: Option<i64>,
}

fn normalize_mem(values: &[&str]) -> Result<Normalized> {
    let (fields, _) = MEM_KEYS.iter().zip(values).try_fold(
        (Fields::new(), PageContext::default()),
        |(mut fields, mut ctx), (key, token)| {
            let raw = parse_int("MEM", key, token)?;
            let scale = match *key {
                "page_size" => {
                    ctx.page_size = Some(raw);
                    None
                }
                "huge_page_size" => {
                    ctx.huge_page_size = Some(raw);
                    None
                }
                "htotal" | "hfree" => ctx.huge_page_size,
                _ => ctx.page_size,
            };
            if let Some(scale) = scale {
                fields.insert(
                    format!("mem.{}", key),
                    FieldValue::Int(raw.saturating_mul(scale)),
                );
            }
            Ok::<_, CollectorError>((fields, ctx))
        },
    )?;

    let mut out = Normalized {
        fields,
        tags: Tags::new(),
    };

    let total = int_field(&out.fields, "mem.total").filter(|t| *t > 0);
    let available: Option<i64> = ["mem.free", "mem.cache", "mem.buff", "mem.zfs_cache"]
        .iter()
        .map(|key| int_field(&out.fields, key))
        .sum();
    if let (Some(total), Some(available)) = (total, available) {
        out.fields.insert(
            "mem.usage".to_string(),
            FieldValue::Float(1.0 - available as f64 / total as f64),
        );
    }

    Ok(out)
}

fn normalize_dsk(values: &[&str]) -> Result<Normalized> {
    let mut out = Normalized::default();
    let Some((disk, values)) = values.split_first() else {
        return Ok(out);
    };

    for (key, token) in DSK_KEYS.iter().zip(values) {
        let raw = parse_int("DSK", key, token)?;
        out.fields.insert(format!("dsk.{}", key), FieldValue::Int(raw));
    }
    if out.fields.is_empty() {
        return Ok(out);
    }

    if let Some(sectors) = int_field(&out.fields, "dsk.read_sect") {
        out.fields.insert(
            "dsk.read_bytes".to_string(),
            FieldValue::Int(sectors.saturating_mul(SECTOR_SIZE)),
        );
    }
    if let Some(sectors) = int_field(&out.fields, "dsk.write_sect") {
        out.fields.insert(
            "dsk.write_bytes".to_string(),
            FieldValue::Int(sectors.saturating_mul(SECTOR_SIZE)),
        );
    }
    if let Some(io_ms) = int_field(&out.fields, "dsk.io_ms") {
        out.fields.insert(
            "dsk.usage".to_string(),
            FieldValue::Float(io_ms as f64 / 1000.0),
        );
    }

    out.tags.insert("disk".to_string(), disk.to_string());
    Ok(out)
}
