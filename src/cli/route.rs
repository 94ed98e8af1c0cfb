//! CLI route: single route table and run context. Dispatches to the client and presentation.

use crate::cli::parse::Commands;
use crate::cli::presentation::{
    format_short_id_json, format_short_id_text, format_table_json, format_table_text,
};
use crate::client::Client;
use crate::config::{ConfigLoader, TabulaConfig};
use crate::error::ApiError;
use crate::record::Block;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::runtime::Runtime;
use tracing::{debug, info};

/// Runtime context for CLI execution: loaded configuration and a
/// single-threaded runtime that drives each request to completion.
pub struct RunContext {
    config: TabulaConfig,
    runtime: Runtime,
}

impl RunContext {
    /// Create run context from workspace root and optional config path.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = match config_path {
            Some(ref path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load(&workspace_root)?,
        };
        Self::with_config(config)
    }

    pub fn with_config(config: TabulaConfig) -> Result<Self, ApiError> {
        config.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ApiError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| ApiError::ConfigError(format!("Failed to create runtime: {}", e)))?;

        Ok(Self { config, runtime })
    }

    pub fn config(&self) -> &TabulaConfig {
        &self.config
    }

    /// Execute a command and return its rendered output.
    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        match command {
            Commands::Table {
                page_id,
                collection_id,
                view_id,
                space_id,
                limit,
                short_id,
                format,
            } => {
                let client = Client::from_config(&self.config)?;
                let tv = self.runtime.block_on(async {
                    let mut tv = client
                        .load_table_view(page_id, collection_id, view_id, space_id, *limit)
                        .await?;
                    if *short_id {
                        client.attach_space_short_id(&mut tv).await?;
                    }
                    Ok::<_, ApiError>(tv)
                })?;

                let snapshot = tv.snapshot();
                match format.as_str() {
                    "json" => format_table_json(&snapshot, tv.space_short_id.as_deref()),
                    _ => Ok(format_table_text(&snapshot, tv.space_short_id.as_deref())),
                }
            }
            Commands::ShortId {
                page_id,
                view_id,
                format,
            } => {
                let client = Client::from_config(&self.config)?;
                let rsp = self
                    .runtime
                    .block_on(client.query_space_short_id(page_id, view_id))?;
                match format.as_str() {
                    "json" => format_short_id_json(&rsp),
                    _ => Ok(format_short_id_text(&rsp)),
                }
            }
            Commands::Download {
                url,
                output,
                block_id,
                parent_table,
                space_id,
                attachment,
            } => {
                let client = Client::from_config(&self.config)?;
                let node = block_id.as_ref().map(|id| Block {
                    id: id.clone(),
                    parent_table: parent_table.clone(),
                    space_id: space_id.clone(),
                    ..Default::default()
                });
                let written = self.runtime.block_on(download_to_file(
                    &client,
                    url,
                    node.as_ref(),
                    *attachment,
                    output,
                ))?;
                Ok(format!("Wrote {} bytes to {}", written, output.display()))
            }
            Commands::Config => serde_json::to_string_pretty(&self.config.redacted())
                .map_err(|e| ApiError::ConfigError(format!("Failed to render config: {}", e))),
        }
    }
}

async fn download_to_file(
    client: &Client,
    url: &str,
    node: Option<&Block>,
    attachment: bool,
    output: &Path,
) -> Result<u64, ApiError> {
    let response = match (attachment, node) {
        (true, Some(node)) => client.download_attachment_stream(url, node).await?,
        (true, None) => {
            return Err(ApiError::InvalidUrl(
                "--attachment requires --block-id".to_string(),
            ))
        }
        (false, _) => client.download_file_stream(url, node).await?,
    };

    let chunks = response.bytes_stream().map(|chunk| chunk.map_err(ApiError::from));
    let written = write_stream_to_file(chunks, output).await?;

    info!(url = %url, bytes = written, path = %output.display(), "Asset downloaded");
    Ok(written)
}

/// Sibling `<output>.part` path that receives bytes until the stream ends.
fn partial_path(output: &Path) -> PathBuf {
    let mut name = output.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

/// Write a byte stream to `output`, which only appears once the stream has
/// been fully written. On error nothing is left behind.
async fn write_stream_to_file<S>(stream: S, output: &Path) -> Result<u64, ApiError>
where
    S: Stream<Item = Result<Bytes, ApiError>>,
{
    let partial = partial_path(output);
    match copy_stream(stream, &partial).await {
        Ok(written) => {
            tokio::fs::rename(&partial, output).await?;
            Ok(written)
        }
        Err(e) => {
            if let Err(rm) = tokio::fs::remove_file(&partial).await {
                debug!(path = %partial.display(), error = %rm, "Partial download not removed");
            }
            Err(e)
        }
    }
}

async fn copy_stream<S>(stream: S, path: &Path) -> Result<u64, ApiError>
where
    S: Stream<Item = Result<Bytes, ApiError>>,
{
    futures::pin_mut!(stream);
    let mut file = tokio::fs::File::create(path).await?;
    let mut written = 0u64;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    Ok(written)
}
