use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{ConfigFormat, ConfigObject, ConfigSource};
use crate::error::{ConfigError, Result};

/// Configuration file on the local filesystem
#[derive(Debug, Clone)]
pub struct FileSource {
    id: String,
    path: PathBuf,
    format: ConfigFormat,
}

impl FileSource {
    /// File source whose format is inferred from the extension,
    /// falling back to JSON
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let format = ConfigFormat::from_path(&path).unwrap_or(ConfigFormat::Json);
        Self::with_format(path, format)
    }

    pub fn json(path: impl Into<PathBuf>) -> Self {
        Self::with_format(path.into(), ConfigFormat::Json)
    }

    pub fn yaml(path: impl Into<PathBuf>) -> Self {
        Self::with_format(path.into(), ConfigFormat::Yaml)
    }

    fn with_format(path: PathBuf, format: ConfigFormat) -> Self {
        Self {
            id: format!("file:{}", path.display()),
            path,
            format,
        }
    }

    /// Override the identifier shown in logs and errors
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> ConfigFormat {
        self.format
    }
}

#[async_trait]
impl ConfigSource for FileSource {
    fn id(&self) -> &str {
        &self.id
    }

    async fn load(&self) -> Result<ConfigObject> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| ConfigError::Io {
                path: self.path.clone(),
                source,
            })?;

        let object = self.format.parse(&content, &self.id)?;
        debug!(source = %self.id, keys = object.len(), "Loaded configuration file");
        Ok(object)
    }
}
