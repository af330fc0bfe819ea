use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;

use crate::core::config::SETTINGS;
use crate::core::Config;

pub fn execute(matches: &clap::ArgMatches, config_path: Option<&Path>) -> Result<()> {
    match matches.subcommand() {
        Some(("show", _)) => show(config_path),
        Some(("set", sub_matches)) => set(sub_matches, config_path),
        _ => {
            println!("Use 'atopflux config --help' for more information.");
            Ok(())
        }
    }
}

fn load(config_path: Option<&Path>) -> Result<Config> {
    match config_path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

fn show(config_path: Option<&Path>) -> Result<()> {
    let path = match config_path {
        Some(path) => path.to_path_buf(),
        None => Config::get_config_path()?,
    };
    let config = load(config_path)?;

    println!("{} {}", "Config file:".white(), path.display().to_string().cyan());
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

fn set(matches: &clap::ArgMatches, config_path: Option<&Path>) -> Result<()> {
    let key = matches
        .get_one::<String>("key")
        .context("Key argument is required")?;
    let value = matches
        .get_one::<String>("value")
        .context("Value argument is required")?;

    let mut config = load(config_path)?;
    if let Err(e) = config.set_value(key, value) {
        println!("{}", format!("✗ {}", e).red());
        println!("{} {}", "Settings:".dimmed(), SETTINGS.join(", ").dimmed());
        return Err(e.into());
    }

    match config_path {
        Some(path) => config.save_to(path)?,
        None => config.save()?,
    }

    println!("{} {}", format!("✓ {} set to:", key).green(), value);
    Ok(())
}
