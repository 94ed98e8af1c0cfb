//! Integration tests for collection view materialization

mod asset_downloads;
mod client_queries;
mod config_integration;
mod table_loading;
