//! Configuration sources (local files, Kubernetes ConfigMaps)

pub mod configmap;
pub mod file;

pub use configmap::ConfigMapSource;
pub use file::FileSource;

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::fmt;
use std::path::Path;

use crate::error::{ConfigError, Result};

/// A partial configuration document contributed by one source
pub type ConfigObject = Map<String, Value>;

/// One origin of configuration data.
///
/// Implementations only read; they never write back to their store.
#[async_trait]
pub trait ConfigSource: Send + Sync {
    /// Stable identifier used in logs and error messages
    fn id(&self) -> &str;

    /// Fetch and parse the source into a configuration object
    async fn load(&self) -> Result<ConfigObject>;
}

/// Serialisation format of a source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Yaml,
}

impl fmt::Display for ConfigFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigFormat::Json => f.write_str("json"),
            ConfigFormat::Yaml => f.write_str("yaml"),
        }
    }
}

impl ConfigFormat {
    /// Guess the format from a file name, `None` for unknown extensions
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "json" => Some(ConfigFormat::Json),
            "yaml" | "yml" => Some(ConfigFormat::Yaml),
            _ => None,
        }
    }

    /// Parse `content` into a configuration object.
    ///
    /// Blank content is an empty object; anything other than an object
    /// at the top level is rejected.
    pub fn parse(&self, content: &str, origin: &str) -> Result<ConfigObject> {
        if content.trim().is_empty() {
            return Ok(ConfigObject::new());
        }

        let value: Value = match self {
            ConfigFormat::Json => serde_json::from_str(content).map_err(|e| ConfigError::Parse {
                origin: origin.to_string(),
                format: *self,
                message: e.to_string(),
            })?,
            ConfigFormat::Yaml => serde_yaml::from_str(content).map_err(|e| ConfigError::Parse {
                origin: origin.to_string(),
                format: *self,
                message: e.to_string(),
            })?,
        };

        match value {
            Value::Object(map) => Ok(map),
            _ => Err(ConfigError::NotAnObject {
                origin: origin.to_string(),
            }),
        }
    }
}
