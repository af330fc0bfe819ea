use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::CollectorError;

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    8086
}

fn default_database() -> String {
    "performance".to_string()
}

fn default_interval() -> u64 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default)]
    pub verbose: bool,
    /// atop sampling interval in seconds
    #[serde(default = "default_interval")]
    pub interval_secs: u64,
    /// Explicit atop binary; looked up in PATH when unset
    #[serde(default)]
    pub atop_path: Option<String>,
    #[serde(default)]
    pub flush_on_close: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database: default_database(),
            verbose: false,
            interval_secs: default_interval(),
            atop_path: None,
            flush_on_close: false,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Config::default());
        }

        let data = fs::read(config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        if data.iter().all(u8::is_ascii_whitespace) {
            return Ok(Config::default());
        }

        serde_json::from_slice(&data)
            .with_context(|| format!("Failed to parse config file: {:?}", config_path))
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let data = serde_json::to_vec_pretty(self).with_context(|| "Failed to serialize config")?;

        fs::write(config_path, data)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

        Ok(())
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir =
            dirs::config_dir().with_context(|| "Could not determine config directory")?;

        Ok(config_dir.join("atopflux").join("config.json"))
    }

    /// Root URL of the InfluxDB HTTP API
    pub fn base_url(&self) -> crate::error::Result<Url> {
        let host = if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        };
        Url::parse(&format!("http://{}:{}/", host, self.port)).map_err(|e| {
            CollectorError::config(format!(
                "Invalid InfluxDB address {}:{}: {}",
                self.host, self.port, e
            ))
        })
    }

    /// Update a single setting by its CLI name
    pub fn set_value(&mut self, key: &str, value: &str) -> crate::error::Result<()> {
        match key {
            "host" => {
                if value.trim().is_empty() {
                    return Err(CollectorError::config("host must not be empty"));
                }
                self.host = value.to_string();
            }
            "port" => self.port = parse_setting(key, value)?,
            "database" => {
                if value.trim().is_empty() {
                    return Err(CollectorError::config("database must not be empty"));
                }
                self.database = value.to_string();
            }
            "verbose" => self.verbose = parse_setting(key, value)?,
            "interval" => {
                let secs: u64 = parse_setting(key, value)?;
                if secs == 0 {
                    return Err(CollectorError::config("interval must be at least 1 second"));
                }
                self.interval_secs = secs;
            }
            "atop" => {
                self.atop_path = if value.is_empty() {
                    None
                } else {
                    Some(value.to_string())
                }
            }
            "flush-on-close" => self.flush_on_close = parse_setting(key, value)?,
            other => {
                return Err(CollectorError::config(format!(
                    "Unknown setting '{}' (expected one of: {})",
                    other,
                    SETTINGS.join(", ")
                )))
            }
        }
        Ok(())
    }
}

/// Keys accepted by [`Config::set_value`]
pub const SETTINGS: [&str; 7] = [
    "host",
    "port",
    "database",
    "verbose",
    "interval",
    "atop",
    "flush-on-close",
];

fn parse_setting<T: std::str::FromStr>(key: &str, value: &str) -> crate::error::Result<T> {
    value
        .parse()
        .map_err(|_| CollectorError::config(format!("Invalid value '{}' for {}", value, key)))
}
