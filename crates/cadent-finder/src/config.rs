//! Finder configuration
//!
//! Configuration is fixed for the lifetime of a [`CadentFinder`](crate::CadentFinder).
//! It can be built in code, read from a TOML file, or taken from the
//! environment.
//!
//! # TOML
//!
//! ```toml
//! [cadent]
//! urls = ["http://cadent-a:8083", "http://cadent-b:8083"]
//! # or, for a single host:
//! # url = "http://cadent-a:8083/"
//! urllength = 8000
//! timeout_ms = 30000
//! ```
//!
//! # Environment
//!
//! - `CADENT_URLS`: comma-separated host list
//! - `CADENT_URL`: single host, used when `CADENT_URLS` is unset or empty
//! - `CADENT_URL_LENGTH`: request size budget
//! - `CADENT_TIMEOUT_MS`: per-request timeout

use cadent_common::protocol::error::{CadentError, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::chunker::DEFAULT_URL_LENGTH;

const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Configuration for a [`CadentFinder`](crate::CadentFinder)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinderConfig {
    /// Host base URLs, in ring order
    pub urls: Vec<String>,
    /// Budget for the encoded targets of one bulk request
    ///
    /// Default: 8000
    pub url_length: usize,
    /// Per-request timeout in milliseconds
    ///
    /// Default: 30000
    pub timeout_ms: u64,
}

impl FinderConfig {
    /// Config for `urls` with default limits
    pub fn new(urls: Vec<String>) -> Self {
        Self {
            urls,
            url_length: DEFAULT_URL_LENGTH,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    pub fn with_url_length(mut self, url_length: usize) -> Self {
        self.url_length = url_length;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Parse a TOML document with a `[cadent]` table
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let file: ConfigFile =
            toml::from_str(s).map_err(|e| CadentError::Configuration(e.to_string()))?;
        let section = file.cadent;

        let urls = match (section.urls, section.url) {
            (Some(urls), _) if !urls.is_empty() => urls,
            (_, Some(url)) => vec![url.trim_end_matches('/').to_string()],
            _ => Vec::new(),
        };

        let mut config = Self::new(urls);
        if let Some(url_length) = section.urllength {
            config.url_length = url_length;
        }
        if let Some(timeout_ms) = section.timeout_ms {
            config.timeout_ms = timeout_ms;
        }
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Build a config from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any variable lookup (see module docs for names)
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut urls: Vec<String> = lookup("CADENT_URLS")
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();
        if urls.is_empty() {
            if let Some(url) = lookup("CADENT_URL").filter(|u| !u.trim().is_empty()) {
                urls.push(url.trim().trim_end_matches('/').to_string());
            }
        }

        let mut config = Self::new(urls);
        if let Some(v) = lookup("CADENT_URL_LENGTH") {
            config.url_length = parse_var("CADENT_URL_LENGTH", &v)?;
        }
        if let Some(v) = lookup("CADENT_TIMEOUT_MS") {
            config.timeout_ms = parse_var("CADENT_TIMEOUT_MS", &v)?;
        }
        config.validate()?;
        Ok(config)
    }

    /// Check the config can back a finder
    pub fn validate(&self) -> Result<()> {
        if self.urls.is_empty() {
            return Err(CadentError::NoHosts);
        }
        if self.url_length == 0 {
            return Err(CadentError::Configuration(
                "urllength must be greater than zero".to_string(),
            ));
        }
        if self.timeout_ms == 0 {
            return Err(CadentError::Configuration(
                "timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| CadentError::Configuration(format!("invalid {}: '{}'", name, value)))
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    cadent: CadentSection,
}

#[derive(Debug, Deserialize)]
struct CadentSection {
    urls: Option<Vec<String>>,
    url: Option<String>,
    urllength: Option<usize>,
    timeout_ms: Option<u64>,
}
