//! Structured logging
//!
//! Installs a `tracing` subscriber whose filter, format and destination come
//! from [`LoggingConfig`]. The `TABULA_LOG`, `TABULA_LOG_MODULES`,
//! `TABULA_LOG_FORMAT` and `TABULA_LOG_OUTPUT` environment variables take
//! precedence over the configuration.

use crate::error::ApiError;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

const ENV_FILTER: &str = "TABULA_LOG";
const ENV_MODULES: &str = "TABULA_LOG_MODULES";
const ENV_FORMAT: &str = "TABULA_LOG_FORMAT";
const ENV_OUTPUT: &str = "TABULA_LOG_OUTPUT";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Where log lines go. Table output owns stdout, so stderr is the default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    Stdout,
    #[default]
    Stderr,
    File,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Base level directive: trace, debug, info, warn, error or off
    pub level: String,
    pub format: LogFormat,
    pub output: LogOutput,
    /// Used when `output` is `file`
    pub file: PathBuf,
    /// ANSI colors for text output on a terminal stream
    pub color: bool,
    /// Per-target levels, e.g. `tabula::client = "debug"`
    pub modules: HashMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::default(),
            output: LogOutput::default(),
            file: PathBuf::from("tabula.log"),
            color: true,
            modules: HashMap::new(),
        }
    }
}

impl LoggingConfig {
    /// Copy with the `TABULA_LOG_FORMAT` and `TABULA_LOG_OUTPUT` overrides applied.
    /// Unrecognized values are ignored.
    fn with_env_overrides(&self) -> Self {
        let mut resolved = self.clone();
        if let Some(format) = env_choice::<LogFormat>(ENV_FORMAT) {
            resolved.format = format;
        }
        if let Some(output) = env_choice::<LogOutput>(ENV_OUTPUT) {
            resolved.output = output;
        }
        resolved
    }
}

fn env_choice<T: ValueEnum>(key: &str) -> Option<T> {
    std::env::var(key)
        .ok()
        .and_then(|v| T::from_str(v.trim(), true).ok())
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(config: Option<&LoggingConfig>) -> Result<(), ApiError> {
    let config = config.cloned().unwrap_or_default().with_env_overrides();
    let filter = build_filter(&config)?;
    let writer = make_writer(&config)?;
    let ansi = config.color && config.output != LogOutput::File;

    let registry = Registry::default().with(filter);
    let installed = match config.format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_writer(writer),
            )
            .try_init(),
        LogFormat::Text => registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(ansi)
                    .with_writer(writer),
            )
            .try_init(),
    };

    installed.map_err(|e| ApiError::ConfigError(format!("Failed to install logger: {}", e)))
}

fn make_writer(config: &LoggingConfig) -> Result<BoxMakeWriter, ApiError> {
    match config.output {
        LogOutput::Stdout => Ok(BoxMakeWriter::new(std::io::stdout)),
        LogOutput::Stderr => Ok(BoxMakeWriter::new(std::io::stderr)),
        LogOutput::File => {
            let file = open_log_file(&config.file)?;
            Ok(BoxMakeWriter::new(Mutex::new(file)))
        }
    }
}

fn open_log_file(path: &Path) -> Result<std::fs::File, ApiError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|e| {
            ApiError::ConfigError(format!("Failed to create log directory {:?}: {}", dir, e))
        })?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| ApiError::ConfigError(format!("Failed to open log file {:?}: {}", path, e)))
}

/// `TABULA_LOG` replaces the whole filter. Otherwise the configured level is
/// the base, refined by configured modules and then `TABULA_LOG_MODULES`.
fn build_filter(config: &LoggingConfig) -> Result<EnvFilter, ApiError> {
    if let Ok(filter) = EnvFilter::try_from_env(ENV_FILTER) {
        return Ok(filter);
    }

    let mut filter = EnvFilter::new(&config.level);
    for (target, level) in &config.modules {
        filter = filter.add_directive(parse_directive(target, level)?);
    }

    if let Ok(spec) = std::env::var(ENV_MODULES) {
        for (target, level) in spec.split(',').filter_map(|pair| pair.split_once('=')) {
            filter = filter.add_directive(parse_directive(target.trim(), level.trim())?);
        }
    }

    Ok(filter)
}

fn parse_directive(target: &str, level: &str) -> Result<Directive, ApiError> {
    format!("{}={}", target, level)
        .parse()
        .map_err(|e| ApiError::ConfigError(format!("Invalid log directive '{}={}': {}", target, level, e)))
}
