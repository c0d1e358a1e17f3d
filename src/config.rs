//! Configuration file management for certexpiry.
//!
//! Settings are layered: defaults, then a TOML file (`certexpiry.toml` or the
//! path given with `--config`), then command-line arguments.
//!
//! # Example Configuration File
//!
//! ```toml
//! hosts = ["example.com", "rust-lang.org"]
//! output = "text"
//! concurrency = 16
//! timeout = 10
//! exit_code = 1
//!
//! [source]
//! hosts_dir = "hosts"
//!
//! [prometheus]
//! enabled = true
//! address = "http://localhost:9091"
//! ```

use crate::evaluator::{NowCapture, DEFAULT_CONCURRENCY};
use crate::fetcher::DEFAULT_TIMEOUT;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Main configuration structure.
///
/// All fields are optional so partial files and CLI overrides can be merged.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct Config {
    /// Hosts to check
    pub hosts: Option<Vec<String>>,
    /// Output format: text, json, summary
    pub output: Option<String>,
    /// Maximum hosts checked at once
    pub concurrency: Option<usize>,
    /// Per-host DNS + connect + handshake budget, in seconds
    pub timeout: Option<u64>,
    /// Whole-batch budget, in seconds; hosts not started by then are skipped
    pub batch_timeout: Option<u64>,
    /// When "now" is taken: per-batch or per-host
    pub now_capture: Option<NowCapture>,
    /// Extra PEM trust anchors
    pub ca_file: Option<String>,
    /// Exit code to use when any host is expiring soon or failed
    pub exit_code: Option<i32>,
    /// Named host-list sources
    pub source: Option<SourceConfig>,
    /// Prometheus configuration
    pub prometheus: Option<PrometheusConfig>,
}

/// Where named host lists (`--pod`) are loaded from.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct SourceConfig {
    /// Directory holding `<pod>.txt` files
    pub hosts_dir: Option<String>,
    /// Base URL serving `<pod>.txt` files; takes priority over `hosts_dir`
    pub remote_url: Option<String>,
}

/// Prometheus Push Gateway settings.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct PrometheusConfig {
    pub enabled: Option<bool>,
    /// Push gateway address (e.g., "http://localhost:9091")
    pub address: Option<String>,
}

impl Config {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// * `ConfigError::Io` - File could not be read
    /// * `ConfigError::Parse` - File contains invalid TOML
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io(e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Configuration with every default filled in.
    pub fn with_defaults() -> Self {
        Config {
            hosts: None,
            output: Some("text".to_string()),
            concurrency: Some(DEFAULT_CONCURRENCY),
            timeout: Some(DEFAULT_TIMEOUT.as_secs()),
            batch_timeout: None,
            now_capture: Some(NowCapture::PerBatch),
            ca_file: None,
            exit_code: Some(0),
            source: Some(SourceConfig {
                hosts_dir: Some("hosts".to_string()),
                remote_url: None,
            }),
            prometheus: Some(PrometheusConfig {
                enabled: Some(false),
                address: Some("http://localhost:9091".to_string()),
            }),
        }
    }

    /// Merges `other` into this configuration; `other` wins where it is set.
    pub fn merge_with(mut self, other: Config) -> Self {
        if other.hosts.is_some() {
            self.hosts = other.hosts;
        }
        if other.output.is_some() {
            self.output = other.output;
        }
        if other.concurrency.is_some() {
            self.concurrency = other.concurrency;
        }
        if other.timeout.is_some() {
            self.timeout = other.timeout;
        }
        if other.batch_timeout.is_some() {
            self.batch_timeout = other.batch_timeout;
        }
        if other.now_capture.is_some() {
            self.now_capture = other.now_capture;
        }
        if other.ca_file.is_some() {
            self.ca_file = other.ca_file;
        }
        if other.exit_code.is_some() {
            self.exit_code = other.exit_code;
        }
        if let Some(other_source) = other.source {
            let source = self.source.get_or_insert_with(SourceConfig::default);
            if other_source.hosts_dir.is_some() {
                source.hosts_dir = other_source.hosts_dir;
            }
            if other_source.remote_url.is_some() {
                source.remote_url = other_source.remote_url;
            }
        }
        if let Some(other_prom) = other.prometheus {
            let prom = self.prometheus.get_or_insert_with(PrometheusConfig::default);
            if other_prom.enabled.is_some() {
                prom.enabled = other_prom.enabled;
            }
            if other_prom.address.is_some() {
                prom.address = other_prom.address;
            }
        }
        self
    }

    /// Rejects values that cannot drive a batch.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == Some(0) {
            return Err(ConfigError::Validation(
                "concurrency must be at least 1".to_string(),
            ));
        }
        if self.timeout == Some(0) {
            return Err(ConfigError::Validation(
                "timeout must be at least 1 second".to_string(),
            ));
        }
        Ok(())
    }

    pub fn timeout_duration(&self) -> Duration {
        self.timeout
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT)
    }

    pub fn batch_timeout_duration(&self) -> Option<Duration> {
        self.batch_timeout.map(Duration::from_secs)
    }

    /// Generates an example configuration file in TOML format.
    pub fn example_toml() -> String {
        let example = Config {
            hosts: Some(vec![
                "example.com".to_string(),
                "rust-lang.org".to_string(),
                "expired.badssl.com".to_string(),
            ]),
            output: Some("text".to_string()),
            concurrency: Some(16),
            timeout: Some(10),
            batch_timeout: Some(120),
            now_capture: Some(NowCapture::PerBatch),
            ca_file: None,
            exit_code: Some(1),
            source: Some(SourceConfig {
                hosts_dir: Some("hosts".to_string()),
                remote_url: None,
            }),
            prometheus: Some(PrometheusConfig {
                enabled: Some(false),
                address: Some("http://localhost:9091".to_string()),
            }),
        };

        toml::to_string_pretty(&example)
            .unwrap_or_else(|_| "# Error generating example".to_string())
    }
}

/// Errors that can occur during configuration loading and parsing.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error (file not found, permission denied, etc.)
    #[error("IO Error: {0}")]
    Io(String),
    /// TOML parsing error
    #[error("Parse Error: {0}")]
    Parse(String),
    /// Invalid configuration values
    #[error("Validation Error: {0}")]
    Validation(String),
}
