//! Tabula: Collection View Materialization
//!
//! Turns a remote collection (a database-like table embedded in a document)
//! into a locally usable table: builds paginated collection queries, resolves
//! the returned node graph, reconciles the view's display configuration with
//! the collection schema, and assembles ordered rows and columns.

pub mod asset;
pub mod cli;
pub mod client;
pub mod collection;
pub mod config;
pub mod error;
pub mod logging;
pub mod query;
pub mod record;
pub mod table;
pub mod text;

pub use client::{Client, CollectionQuery};
pub use error::ApiError;
pub use table::{ColumnInfo, TableRow, TableView};
