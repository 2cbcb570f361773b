//! Configuration management following 12-factor app principles
//!
//! All configuration is loaded from environment variables to ensure
//! clean separation between code and config.

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

use crate::{Error, Result};

/// Default REST API base URL (the pipeline API's local dev server)
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

/// Default request timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Log filter used when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "vfxtrack=info";

/// Which pipeline API backend to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ApiProvider {
    /// Real REST API over HTTP
    Http,
    /// In-memory mock with a seeded demo dataset
    #[default]
    Mock,
}

impl FromStr for ApiProvider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(ApiProvider::Http),
            "mock" => Ok(ApiProvider::Mock),
            other => Err(Error::Configuration(format!(
                "Unknown API provider: {}. Supported providers: http, mock",
                other
            ))),
        }
    }
}

impl std::fmt::Display for ApiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiProvider::Http => write!(f, "http"),
            ApiProvider::Mock => write!(f, "mock"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Pipeline API backend
    pub api_provider: ApiProvider,

    /// Base URL of the pipeline REST API
    pub api_base_url: String,

    /// Per-request timeout
    pub request_timeout_secs: u64,

    /// Project selected on startup, if any
    pub project_id: Option<i64>,

    /// Runtime configuration
    pub rust_log: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_provider: ApiProvider::default(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            project_id: None,
            rust_log: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        let api_provider = match env::var("VFXTRACK_API_PROVIDER") {
            Ok(value) => value.parse()?,
            Err(_) => ApiProvider::default(),
        };

        let api_base_url = env::var("VFXTRACK_API_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string());
        if api_provider == ApiProvider::Http
            && !(api_base_url.starts_with("http://") || api_base_url.starts_with("https://"))
        {
            return Err(Error::Configuration(format!(
                "VFXTRACK_API_BASE_URL must be an http(s) URL, got '{}'",
                api_base_url
            )));
        }

        let request_timeout_secs = match env::var("VFXTRACK_REQUEST_TIMEOUT_SECS") {
            Ok(value) => value.parse().map_err(|_| {
                Error::Configuration(format!(
                    "VFXTRACK_REQUEST_TIMEOUT_SECS must be a positive integer, got '{}'",
                    value
                ))
            })?,
            Err(_) => DEFAULT_REQUEST_TIMEOUT_SECS,
        };

        let project_id = match env::var("VFXTRACK_PROJECT_ID") {
            Ok(value) => Some(value.parse().map_err(|_| {
                Error::Configuration(format!(
                    "VFXTRACK_PROJECT_ID must be an integer, got '{}'",
                    value
                ))
            })?),
            Err(_) => None,
        };

        let config = Self {
            api_provider,
            api_base_url,
            request_timeout_secs,
            project_id,
            rust_log: env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string()),
        };

        tracing::debug!(
            provider = %config.api_provider,
            base_url = %config.api_base_url,
            "Configuration loaded"
        );

        Ok(config)
    }
}
