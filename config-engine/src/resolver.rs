use error_common::codes;
use futures::future::join_all;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::activation::Activation;
use crate::error::{ConfigError, Result};
use crate::providers::{ConfigMapSource, ConfigObject, ConfigSource, FileSource};
use crate::resolved::ResolvedConfig;

/// A source together with its resolution policy
#[derive(Clone)]
pub struct SourceEntry {
    pub source: Arc<dyn ConfigSource>,
    pub required: bool,
    pub activation: Option<Activation>,
}

impl SourceEntry {
    pub fn required(source: impl ConfigSource + 'static) -> Self {
        Self {
            source: Arc::new(source),
            required: true,
            activation: None,
        }
    }

    pub fn optional(source: impl ConfigSource + 'static) -> Self {
        Self {
            source: Arc::new(source),
            required: false,
            activation: None,
        }
    }

    pub fn when(mut self, activation: Activation) -> Self {
        self.activation = Some(activation);
        self
    }

    fn is_active(&self) -> bool {
        self.activation.as_ref().map_or(true, Activation::is_active)
    }
}

/// Well-known locations of the service's configuration layers
#[derive(Debug, Clone)]
pub struct StandardSources {
    /// Bundled defaults, required
    pub default_path: PathBuf,
    /// Container specific overrides, optional
    pub local_path: PathBuf,
    /// ConfigMap holding cluster overrides, optional
    pub configmap_name: String,
    /// The ConfigMap is consulted only when this variable is set;
    /// its value is the namespace to read from
    pub namespace_var: String,
}

impl Default for StandardSources {
    fn default() -> Self {
        Self {
            default_path: PathBuf::from("insult_default_config.json"),
            local_path: PathBuf::from("/opt/docker_config.json"),
            configmap_name: "insult-config".to_string(),
            namespace_var: "KUBERNETES_NAMESPACE".to_string(),
        }
    }
}

/// Aggregates an ordered list of sources into one [`ResolvedConfig`].
///
/// Sources are loaded concurrently, then merged strictly in declared
/// order so the result never depends on I/O completion timing.
#[derive(Clone, Default)]
pub struct ConfigResolver {
    entries: Vec<SourceEntry>,
}

impl ConfigResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default file < local override file < cluster ConfigMap
    pub fn standard(sources: &StandardSources) -> Self {
        let configmap = ConfigMapSource::in_cluster(sources.configmap_name.clone())
            .namespace_from_env(sources.namespace_var.clone());

        Self::new()
            .add(SourceEntry::required(FileSource::new(&sources.default_path)))
            .add(SourceEntry::optional(FileSource::new(&sources.local_path)))
            .add(SourceEntry::optional(configmap).when(Activation::env_present(sources.namespace_var.clone())))
    }

    pub fn add(mut self, entry: SourceEntry) -> Self {
        self.entries.push(entry);
        self
    }

    pub fn add_required(self, source: impl ConfigSource + 'static) -> Self {
        self.add(SourceEntry::required(source))
    }

    pub fn add_optional(self, source: impl ConfigSource + 'static) -> Self {
        self.add(SourceEntry::optional(source))
    }

    pub fn add_optional_when(self, source: impl ConfigSource + 'static, activation: Activation) -> Self {
        self.add(SourceEntry::optional(source).when(activation))
    }

    pub fn entries(&self) -> &[SourceEntry] {
        &self.entries
    }

    /// Load every active source and merge the results.
    ///
    /// Fails with [`ConfigError::SourceUnavailable`] for the first required
    /// source (in declared order) that could not be loaded. Optional
    /// sources that fail contribute an empty object.
    #[instrument(skip(self), fields(sources = self.entries.len()))]
    pub async fn resolve(&self) -> Result<ResolvedConfig> {
        let active: Vec<&SourceEntry> = self
            .entries
            .iter()
            .filter(|entry| {
                let active = entry.is_active();
                if !active {
                    debug!(source = entry.source.id(), "Configuration source inactive, skipping");
                }
                active
            })
            .collect();

        let outcomes = join_all(active.iter().map(|entry| entry.source.load())).await;

        let mut layers: Vec<ConfigObject> = Vec::with_capacity(active.len());
        for (entry, outcome) in active.iter().zip(outcomes) {
            match outcome {
                Ok(layer) => {
                    debug!(source = entry.source.id(), keys = layer.len(), "Configuration source loaded");
                    layers.push(layer);
                }
                Err(e) if entry.required => {
                    return Err(ConfigError::SourceUnavailable {
                        id: entry.source.id().to_string(),
                        reason: e.to_string(),
                    });
                }
                Err(e) => {
                    warn!(
                        error_code = codes::config::SOURCE_UNAVAILABLE,
                        source = entry.source.id(),
                        error = %e,
                        "Optional configuration source unavailable"
                    );
                    layers.push(ConfigObject::new());
                }
            }
        }

        let resolved = ResolvedConfig::from_layers(layers);
        info!(layers = active.len(), keys = resolved.as_map().len(), "Configuration resolved");
        Ok(resolved)
    }
}
