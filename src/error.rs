//! Error types for the collection view client.

use thiserror::Error;

/// Errors surfaced by queries, view construction, and asset downloads.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request to '{url}' failed with status {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("Failed to decode response from '{url}': {message}")]
    Decode { url: String, message: String },

    #[error("Failed to resolve {table} record '{id}': {message}")]
    Resolve {
        table: String,
        id: String,
        message: String,
    },

    #[error("Collection is missing for page '{page_id}', collection view id: '{view_id}'")]
    MissingCollection { page_id: String, view_id: String },

    #[error("Collection view '{view_id}' not found in query result")]
    MissingCollectionView { view_id: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        map_http_error(err)
    }
}

/// Map a reqwest failure onto the transport/protocol split.
pub(crate) fn map_http_error(error: reqwest::Error) -> ApiError {
    let url = error
        .url()
        .map(|u| u.to_string())
        .unwrap_or_default();
    if let Some(status) = error.status() {
        ApiError::Status {
            url,
            status: status.as_u16(),
            body: error.to_string(),
        }
    } else if error.is_timeout() {
        ApiError::Transport(format!("Request timeout: {}", error))
    } else if error.is_connect() {
        ApiError::Transport(format!("Connection error: {}", error))
    } else if error.is_decode() {
        ApiError::Decode {
            url,
            message: error.to_string(),
        }
    } else {
        ApiError::Transport(format!("HTTP error: {}", error))
    }
}

impl ApiError {
    /// True for failures that happened before a response was received.
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport(_))
    }
}
