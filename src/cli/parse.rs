//! CLI parse: clap types for Tabula. No behavior; definitions only.

use crate::logging::{LogFormat, LogOutput};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Tabula CLI - materialize collection views into tables
#[derive(Parser)]
#[command(name = "tabula")]
#[command(about = "Materialize workspace collection views into tables")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory (for config/config.toml)
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long)]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format
    #[arg(long, value_enum)]
    pub log_format: Option<LogFormat>,

    /// Log output
    #[arg(long, value_enum)]
    pub log_output: Option<LogOutput>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Query a collection view and print it as a table
    Table {
        /// Page that embeds the collection view
        #[arg(long)]
        page_id: String,
        #[arg(long)]
        collection_id: String,
        #[arg(long)]
        view_id: String,
        /// Owning workspace id
        #[arg(long)]
        space_id: String,
        /// Row cap for this request (server default applies when omitted)
        #[arg(long)]
        limit: Option<usize>,
        /// Also look up the workspace short id
        #[arg(long)]
        short_id: bool,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Look up a page's short id and owning workspace
    ShortId {
        #[arg(long)]
        page_id: String,
        #[arg(long)]
        view_id: String,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Download an asset through the proxy, original and signed-URL fallbacks
    Download {
        /// Raw asset reference (URL or attachment: reference)
        url: String,
        /// Destination file
        #[arg(long)]
        output: PathBuf,
        /// Id of the content node that owns the asset
        #[arg(long)]
        block_id: Option<String>,
        /// Parent table of the owning node
        #[arg(long, default_value = "block")]
        parent_table: String,
        /// Workspace id of the owning node
        #[arg(long, default_value = "")]
        space_id: String,
        /// Treat the reference as an attachment id
        #[arg(long)]
        attachment: bool,
    },
    /// Print the effective configuration (token redacted)
    Config,
}
