// Command handlers module
pub mod collect;
pub mod config;
pub mod replay;
pub mod version;

use anyhow::{Context, Result};
use clap::ArgMatches;

use crate::core::{CollectorConfig, Config, InfluxSink, MetricSink, StdoutSink};

/// Apply command-line overrides on top of the stored configuration.
///
/// Only arguments defined on the given subcommand are consulted.
pub fn apply_overrides(config: &mut Config, matches: &ArgMatches) {
    if let Some(host) = matches.try_get_one::<String>("host").ok().flatten() {
        config.host = host.clone();
    }
    if let Some(port) = matches.try_get_one::<u16>("port").ok().flatten() {
        config.port = *port;
    }
    if let Some(database) = matches.try_get_one::<String>("database").ok().flatten() {
        config.database = database.clone();
    }
    if let Some(interval) = matches.try_get_one::<u64>("interval").ok().flatten() {
        config.interval_secs = *interval;
    }
    if let Some(atop) = matches.try_get_one::<String>("atop").ok().flatten() {
        config.atop_path = Some(atop.clone());
    }
    if flag(matches, "flush-on-close") {
        config.flush_on_close = true;
    }
}

fn flag(matches: &ArgMatches, id: &str) -> bool {
    matches
        .try_get_one::<bool>(id)
        .ok()
        .flatten()
        .copied()
        .unwrap_or(false)
}

/// Sink for the effective configuration: InfluxDB, or stdout for `--dry-run`
fn build_sink(config: &Config, matches: &ArgMatches) -> Result<Box<dyn MetricSink>> {
    if flag(matches, "dry-run") {
        return Ok(Box::new(StdoutSink));
    }
    let sink = InfluxSink::from_config(config).context("Failed to create InfluxDB client")?;
    Ok(Box::new(sink))
}

fn collector_config(config: &Config) -> CollectorConfig {
    CollectorConfig {
        flush_on_close: config.flush_on_close,
        max_delta_secs: config.interval_secs.max(1) as i64,
    }
}
