use std::path::PathBuf;
use thiserror::Error;

use crate::providers::ConfigFormat;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("source {id} unavailable: {reason}")]
    SourceUnavailable { id: String, reason: String },

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {origin} as {format}: {message}")]
    Parse {
        origin: String,
        format: ConfigFormat,
        message: String,
    },

    #[error("{origin} does not contain a configuration object")]
    NotAnObject { origin: String },

    #[error("Remote configuration store error: {0}")]
    RemoteStore(String),

    #[error("Configuration section '{0}' is missing")]
    MissingSection(String),

    #[error("Configuration section '{section}' is invalid: {message}")]
    InvalidSection { section: String, message: String },
}

pub type Result<T> = std::result::Result<T, ConfigError>;
