//! Live collection: run atop and stream its samples into InfluxDB.

use anyhow::{Context, Result};
use clap::ArgMatches;
use colored::Colorize;
use std::path::Path;

use super::{apply_overrides, build_sink, collector_config};
use crate::core::atop::AtopProducer;
use crate::core::{Collector, Config, MetricSink};

pub fn execute(matches: &ArgMatches, mut config: Config) -> Result<()> {
    apply_overrides(&mut config, matches);

    let mut sink = build_sink(&config, matches)?;
    sink.ensure_container(&config.database)
        .with_context(|| format!("Failed to create database '{}'", config.database))?;

    let binary = AtopProducer::locate(config.atop_path.as_deref().map(Path::new))?;
    let mut producer = AtopProducer::spawn(&binary, config.interval_secs)?;

    let kill = producer.kill_handle();
    ctrlc::set_handler(move || {
        log::info!("Interrupted, stopping atop");
        kill.kill();
    })
    .context("Failed to install interrupt handler")?;

    let reader = producer.take_reader()?;
    let mut collector = Collector::with_config(sink, collector_config(&config));
    let result = collector.run(reader);

    if result.is_err() {
        producer.kill_handle().kill();
    }
    producer.wait().context("Failed to reap atop")?;

    let stats = result.context("Collection stopped")?;
    println!(
        "{} {} records in {} batches",
        "✓ Stored".green(),
        stats.records.to_string().bold(),
        stats.batches.to_string().bold()
    );
    Ok(())
}
