use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use thiserror::Error;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Where log lines go
#[derive(Debug, Clone, PartialEq)]
pub enum LogTarget {
    /// Non-interactive commands
    Stderr,
    /// The interactive UI owns the terminal
    File(PathBuf),
}

#[derive(Debug, Error)]
pub enum LogError {
    #[error("Failed to open log file {path}: {source}")]
    OpenError {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to install log subscriber: {0}")]
    InitError(#[from] tracing_subscriber::util::TryInitError),
}

/// `RUST_LOG` when set, else the configured level
fn filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber
pub fn init(level: &str, target: LogTarget) -> Result<(), LogError> {
    let registry = tracing_subscriber::registry().with(filter(level));

    match target {
        LogTarget::Stderr => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false),
            )
            .try_init()?,
        LogTarget::File(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|source| LogError::OpenError {
                    path: path.display().to_string(),
                    source,
                })?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .map_err(|source| LogError::OpenError {
                    path: path.display().to_string(),
                    source,
                })?;
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(Mutex::new(file))
                        .with_ansi(false),
                )
                .try_init()?
        }
    }

    Ok(())
}
