//! Connection settings for the noun backend, read from the `noun`
//! section of the resolved configuration.

use config_engine::{ConfigError, ResolvedConfig};
use error_common::{codes, Result, ServiceError};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

/// Configuration section holding the backend settings
pub const CONFIG_SECTION: &str = "noun";

fn default_timeout_ms() -> u64 {
    5_000
}

fn default_health_path() -> String {
    "/health".to_string()
}

fn default_health_cache_ttl_ms() -> u64 {
    10_000
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NounServiceConfig {
    /// Backend host name or address
    #[serde(alias = "defaultHost")]
    pub host: String,

    /// Backend port
    #[serde(alias = "defaultPort")]
    pub port: u16,

    /// Use HTTPS
    #[serde(default)]
    pub ssl: bool,

    /// Prefix prepended to every request path, e.g. `/insults`
    #[serde(default)]
    pub path_base: String,

    /// Deadline for a single outbound call
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Path probed by the health check
    #[serde(default = "default_health_path")]
    pub health_path: String,

    /// How long a probe result is reused; 0 probes on every call
    #[serde(default = "default_health_cache_ttl_ms")]
    pub health_cache_ttl_ms: u64,
}

impl NounServiceConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ssl: false,
            path_base: String::new(),
            timeout_ms: default_timeout_ms(),
            health_path: default_health_path(),
            health_cache_ttl_ms: default_health_cache_ttl_ms(),
        }
    }

    /// Read and validate the `noun` section
    pub fn from_resolved(config: &ResolvedConfig) -> Result<Self> {
        let section: Self = config.section(CONFIG_SECTION).map_err(|e| {
            if matches!(e, ConfigError::MissingSection(_)) {
                warn!(error_code = codes::config::MISSING_SECTION, section = CONFIG_SECTION, "Configuration section missing");
            }
            ServiceError::ConfigError(e.to_string())
        })?;
        section.validate()?;
        Ok(section)
    }

    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(ServiceError::ConfigError("noun.host must not be empty".to_string()));
        }
        if self.port == 0 {
            return Err(ServiceError::ConfigError("noun.port must be non-zero".to_string()));
        }
        if self.timeout_ms == 0 {
            return Err(ServiceError::ConfigError("noun.timeout_ms must be positive".to_string()));
        }
        if !self.path_base.is_empty() && (!self.path_base.starts_with('/') || self.path_base.ends_with('/')) {
            return Err(ServiceError::ConfigError(format!(
                "noun.path_base '{}' must start with '/' and not end with '/'",
                self.path_base
            )));
        }
        if !self.health_path.starts_with('/') {
            return Err(ServiceError::ConfigError(format!(
                "noun.health_path '{}' must start with '/'",
                self.health_path
            )));
        }
        Ok(())
    }

    pub fn base_url(&self) -> String {
        let scheme = if self.ssl { "https" } else { "http" };
        format!("{}://{}:{}{}", scheme, self.host, self.port, self.path_base)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn health_cache_ttl(&self) -> Duration {
        Duration::from_millis(self.health_cache_ttl_ms)
    }
}
