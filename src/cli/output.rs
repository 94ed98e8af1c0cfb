//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::ApiError;

/// Map domain errors to a string for CLI output, with a hint where one helps.
pub fn map_error(e: &ApiError) -> String {
    match e {
        ApiError::Status { status: 401, .. } | ApiError::Status { status: 403, .. } => format!(
            "{}\nHint: set client.auth_token in config or TABULA__CLIENT__AUTH_TOKEN",
            e
        ),
        _ if e.is_transport() => format!("{}\nHint: check client.base_url and network access", e),
        _ => e.to_string(),
    }
}
