//! Logging bootstrap with secret redaction
//!
//! Installs the global `tracing` subscriber for a service process and
//! provides [`ConfigRedactor`] so that configuration dumps written at
//! startup never leak credentials into the log stream.
//!
//! # Example
//!
//! ```rust,no_run
//! use logger_redacted::{init, ConfigRedactor, LoggerConfig};
//!
//! init(&LoggerConfig::default().with_level("debug")).unwrap();
//!
//! let redactor = ConfigRedactor::default();
//! let config = serde_json::json!({ "noun": { "host": "localhost", "token": "t" } });
//! tracing::info!(config = %redactor.redact_pretty(&config), "Configuration loaded");
//! ```

pub mod config;
pub mod redactor;

pub use config::*;
pub use redactor::*;

use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Error, Debug)]
pub enum LoggerError {
    #[error("Invalid log filter '{0}'")]
    InvalidFilter(String),

    #[error("Global subscriber already installed: {0}")]
    AlreadyInitialized(String),
}

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over [`LoggerConfig::log_level`].
pub fn init(config: &LoggerConfig) -> Result<(), LoggerError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log_level)
            .map_err(|_| LoggerError::InvalidFilter(config.log_level.clone()))?,
    };

    let registry = tracing_subscriber::registry().with(filter);

    if config.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .try_init()
            .map_err(|e| LoggerError::AlreadyInitialized(e.to_string()))
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init()
            .map_err(|e| LoggerError::AlreadyInitialized(e.to_string()))
    }
}

/// Redactor matching the logger configuration
pub fn redactor_for(config: &LoggerConfig) -> Option<ConfigRedactor> {
    config.redaction_enabled.then(ConfigRedactor::default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redactor_follows_config() {
        assert!(redactor_for(&LoggerConfig::default()).is_some());

        let disabled = LoggerConfig {
            redaction_enabled: false,
            ..Default::default()
        };
        assert!(redactor_for(&disabled).is_none());
    }
}
