use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;
use url::Url;

/// Collector webhook that receives every relayed submission.
pub const DEFAULT_COLLECTOR_URL: &str = "https://hooks.zapier.com/hooks/catch/14035339/28moaq8/";

/// Per-file size cap applied while decoding.
pub const DEFAULT_MAX_FILE_BYTES: u64 = 50 * 1024 * 1024;

/// Room for all eight attachment slots at the per-file cap, plus the text fields.
pub const DEFAULT_MAX_REQUEST_BYTES: usize = 8 * DEFAULT_MAX_FILE_BYTES as usize + 1024 * 1024;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error("Invalid collector URL {0}: {1}")]
    InvalidCollectorUrl(String, url::ParseError),

    #[error("Collector URL must use http or https, got {0}")]
    UnsupportedCollectorScheme(String),

    #[error("max_file_bytes cannot be 0")]
    ZeroFileLimit,

    #[error("max_request_bytes ({request}) is smaller than max_file_bytes ({file})")]
    RequestLimitBelowFileLimit { request: usize, file: u64 },
}

/// Relay configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    /// Listener for the submission endpoint
    #[serde(default)]
    pub listener: Listener,
    /// Listener for health and readiness checks
    #[serde(default = "Listener::admin_default")]
    pub admin_listener: Listener,
    /// Where rebuilt submissions are forwarded
    #[serde(default = "default_collector_url")]
    pub collector_url: String,
    /// Root under which each request gets its own staging directory
    #[serde(default = "default_staging_dir")]
    pub staging_dir: PathBuf,
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,
    #[serde(default = "default_max_request_bytes")]
    pub max_request_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            listener: Listener::default(),
            admin_listener: Listener::admin_default(),
            collector_url: default_collector_url(),
            staging_dir: default_staging_dir(),
            max_file_bytes: default_max_file_bytes(),
            max_request_bytes: default_max_request_bytes(),
        }
    }
}

impl Config {
    /// Validates the relay configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.listener.validate()?;
        self.admin_listener.validate()?;
        self.collector_url()?;

        if self.max_file_bytes == 0 {
            return Err(ValidationError::ZeroFileLimit);
        }

        if (self.max_request_bytes as u64) < self.max_file_bytes {
            return Err(ValidationError::RequestLimitBelowFileLimit {
                request: self.max_request_bytes,
                file: self.max_file_bytes,
            });
        }

        Ok(())
    }

    /// Parses the collector URL, accepting only http and https.
    pub fn collector_url(&self) -> Result<Url, ValidationError> {
        let url = Url::parse(&self.collector_url)
            .map_err(|e| ValidationError::InvalidCollectorUrl(self.collector_url.clone(), e))?;

        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ValidationError::UnsupportedCollectorScheme(other.to_string())),
        }
    }
}

/// Network listener configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Listener {
    /// Host address to bind to (e.g., "0.0.0.0" or "127.0.0.1")
    pub host: String,
    /// Port number to listen on
    pub port: u16,
}

impl Default for Listener {
    fn default() -> Self {
        Listener {
            host: "0.0.0.0".into(),
            port: 3000,
        }
    }
}

impl Listener {
    fn admin_default() -> Self {
        Listener {
            host: "127.0.0.1".into(),
            port: 3001,
        }
    }

    /// Validates the listener configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        Ok(())
    }
}

fn default_collector_url() -> String {
    DEFAULT_COLLECTOR_URL.to_string()
}

fn default_staging_dir() -> PathBuf {
    std::env::temp_dir().join("uploads")
}

fn default_max_file_bytes() -> u64 {
    DEFAULT_MAX_FILE_BYTES
}

fn default_max_request_bytes() -> usize {
    DEFAULT_MAX_REQUEST_BYTES
}
