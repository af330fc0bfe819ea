use reqwest::blocking::Client;
use std::time::Duration;
use url::Url;

use super::MetricSink;
use crate::core::atop::MetricRecord;
use crate::core::config::Config;
use crate::error::{CollectorError, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// InfluxDB 1.x sink speaking the HTTP `/query` and `/write` API
pub struct InfluxSink {
    client: Client,
    base_url: Url,
    database: String,
}

impl InfluxSink {
    pub fn new(base_url: Url, database: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("atopflux/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url,
            database: database.to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.base_url()?, &config.database)
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    /// `/write` endpoint for this database with second precision timestamps
    pub fn write_url(&self) -> Result<Url> {
        let mut url = self.endpoint("write")?;
        url.query_pairs_mut()
            .append_pair("db", &self.database)
            .append_pair("precision", "s");
        Ok(url)
    }

    /// `/query` endpoint carrying the given InfluxQL statement
    pub fn query_url(&self, statement: &str) -> Result<Url> {
        let mut url = self.endpoint("query")?;
        url.query_pairs_mut().append_pair("q", statement);
        Ok(url)
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| CollectorError::config(format!("Invalid InfluxDB URL: {}", e)))
    }

    fn post(&self, url: Url, body: String) -> Result<()> {
        let response = self.client.post(url).body(body).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(CollectorError::sink(format!(
                "InfluxDB returned status {}: {}",
                status,
                response.text().unwrap_or_default().trim()
            )));
        }
        Ok(())
    }
}

/// Render records as a newline-separated line-protocol body
pub fn line_protocol_body(records: &[MetricRecord]) -> String {
    records
        .iter()
        .filter_map(MetricRecord::to_line_protocol)
        .collect::<Vec<_>>()
        .join("\n")
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('\\', "\\\\").replace('"', "\\\""))
}

impl MetricSink for InfluxSink {
    fn ensure_container(&mut self, name: &str) -> Result<()> {
        // CREATE DATABASE is a no-op when the database already exists
        let url = self.query_url(&format!("CREATE DATABASE {}", quote_identifier(name)))?;
        self.post(url, String::new())?;
        log::info!("Database '{}' is ready", name);
        Ok(())
    }

    fn write_batch(&mut self, records: &[MetricRecord]) -> Result<()> {
        let body = line_protocol_body(records);
        if body.is_empty() {
            return Ok(());
        }
        self.post(self.write_url()?, body)
    }
}
