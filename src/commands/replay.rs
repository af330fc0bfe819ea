//! Replay recorded `atop -P` output through the collector.

use anyhow::{Context, Result};
use clap::ArgMatches;
use colored::Colorize;
use std::fs::File;
use std::io::{self, BufRead, BufReader};

use super::{apply_overrides, build_sink, collector_config};
use crate::core::{Collector, Config, MetricSink};

pub fn execute(matches: &ArgMatches, mut config: Config) -> Result<()> {
    apply_overrides(&mut config, matches);

    let reader: Box<dyn BufRead> = match matches.get_one::<String>("file") {
        Some(path) if path != "-" => {
            let file = File::open(path).with_context(|| format!("Failed to open {}", path))?;
            Box::new(BufReader::new(file))
        }
        _ => Box::new(io::stdin().lock()),
    };

    let mut sink = build_sink(&config, matches)?;
    sink.ensure_container(&config.database)
        .with_context(|| format!("Failed to create database '{}'", config.database))?;

    let mut collector = Collector::with_config(sink, collector_config(&config));
    let stats = collector.run(reader).context("Replay stopped")?;

    eprintln!(
        "{} {} lines, {} records in {} batches ({} stale, {} malformed)",
        "✓ Replayed".green(),
        stats.lines,
        stats.records.to_string().bold(),
        stats.batches,
        stats.stale,
        stats.malformed
    );
    Ok(())
}
