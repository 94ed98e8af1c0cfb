//! Configuration System
//!
//! Layered configuration for the client: merge-policy defaults, the global
//! config file, workspace config files, then `TABULA__`-prefixed environment
//! variables. Later layers win.

use crate::logging::LoggingConfig;
use crate::query::QueryDefaults;
use serde::{Deserialize, Serialize};
use std::fmt;

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TabulaConfig {
    /// HTTP client settings
    #[serde(default)]
    pub client: ClientConfig,

    /// Loader defaults for collection queries
    #[serde(default)]
    pub query: QueryDefaults,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP client configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// API origin, e.g. https://www.notion.so
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Session token sent as the `token_v2` cookie
    #[serde(default)]
    pub auth_token: Option<String>,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

pub(crate) fn default_base_url() -> String {
    "https://www.notion.so".to_string()
}

pub(crate) fn default_connect_timeout_secs() -> u64 {
    10
}

pub(crate) fn default_request_timeout_secs() -> u64 {
    120
}

fn default_user_agent() -> String {
    format!("tabula/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            auth_token: None,
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

// Keeps the token out of logs and `config show` output.
impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "<redacted>"))
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl ClientConfig {
    /// Validate client configuration
    pub fn validate(&self) -> Result<(), String> {
        let url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| format!("Invalid base_url '{}': {}", self.base_url, e))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(format!("base_url must be http or https, got '{}'", url.scheme()));
        }
        if self.connect_timeout_secs == 0 || self.request_timeout_secs == 0 {
            return Err("Timeouts must be greater than zero".to_string());
        }
        Ok(())
    }

    /// Copy with the auth token masked, for display.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.auth_token.is_some() {
            copy.auth_token = Some("<redacted>".to_string());
        }
        copy
    }
}

/// Configuration validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    Client(String),
    Query(String),
    Logging(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Client(msg) => write!(f, "Client: {}", msg),
            ValidationError::Query(msg) => write!(f, "Query: {}", msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl TabulaConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.client.validate() {
            errors.push(ValidationError::Client(e));
        }

        if self.query.limit == 0 {
            errors.push(ValidationError::Query(
                "Default limit must be greater than zero".to_string(),
            ));
        }
        if self.query.user_time_zone.trim().is_empty() {
            errors.push(ValidationError::Query(
                "User time zone cannot be empty".to_string(),
            ));
        }

        if self
            .logging
            .level
            .parse::<tracing::level_filters::LevelFilter>()
            .is_err()
        {
            errors.push(ValidationError::Logging(format!(
                "Invalid log level: {}",
                self.logging.level
            )));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Copy suitable for display.
    pub fn redacted(&self) -> Self {
        Self {
            client: self.client.redacted(),
            ..self.clone()
        }
    }
}
