//! Merge rules: defaults, override order, conflict handling.

use crate::config::{default_base_url, default_connect_timeout_secs, default_request_timeout_secs};
use crate::query::QueryDefaults;
use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    let query = QueryDefaults::default();
    Config::builder()
        .set_default("client.base_url", default_base_url())?
        .set_default(
            "client.connect_timeout_secs",
            default_connect_timeout_secs() as i64,
        )?
        .set_default(
            "client.request_timeout_secs",
            default_request_timeout_secs() as i64,
        )?
        .set_default("query.limit", query.limit as i64)?
        .set_default("query.user_time_zone", query.user_time_zone)
}
