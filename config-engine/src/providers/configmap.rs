use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, instrument};

use super::{ConfigFormat, ConfigObject, ConfigSource};
use crate::error::{ConfigError, Result};
use crate::merge::merge_objects;

const SERVICE_ACCOUNT_DIR: &str = "/var/run/secrets/kubernetes.io/serviceaccount";
const DEFAULT_API_SERVER: &str = "https://kubernetes.default.svc";

/// Kubernetes ConfigMap read through the cluster API server.
///
/// Entries whose key looks like a file name (`*.json`, `*.yaml`, `*.yml`)
/// are parsed and merged in key order; every other entry becomes a plain
/// string value under its key.
#[derive(Debug, Clone)]
pub struct ConfigMapSource {
    id: String,
    name: String,
    namespace: Option<String>,
    namespace_env: Option<String>,
    api_server: Option<String>,
    token_path: Option<PathBuf>,
    ca_path: Option<PathBuf>,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct ConfigMapBody {
    #[serde(default)]
    data: BTreeMap<String, String>,
}

impl ConfigMapSource {
    /// ConfigMap using the in-cluster service account for authentication
    pub fn in_cluster(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: format!("configmap:{}", name),
            name,
            namespace: None,
            namespace_env: None,
            api_server: None,
            token_path: Some(Path::new(SERVICE_ACCOUNT_DIR).join("token")),
            ca_path: Some(Path::new(SERVICE_ACCOUNT_DIR).join("ca.crt")),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Read the namespace from an environment variable at load time
    pub fn namespace_from_env(mut self, var: impl Into<String>) -> Self {
        self.namespace_env = Some(var.into());
        self
    }

    pub fn api_server(mut self, url: impl Into<String>) -> Self {
        self.api_server = Some(url.into().trim_end_matches('/').to_string());
        self
    }

    pub fn token_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_path = Some(path.into());
        self
    }

    /// Send requests without an `Authorization` header
    pub fn without_token(mut self) -> Self {
        self.token_path = None;
        self
    }

    /// Trust only the system roots (no cluster CA bundle)
    pub fn without_cluster_ca(mut self) -> Self {
        self.ca_path = None;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn resolve_namespace(&self) -> Result<String> {
        if let Some(namespace) = &self.namespace {
            return Ok(namespace.clone());
        }
        self.namespace_env
            .as_deref()
            .and_then(|var| std::env::var(var).ok())
            .filter(|ns| !ns.is_empty())
            .ok_or_else(|| ConfigError::RemoteStore(format!("no namespace configured for configmap {}", self.name)))
    }

    fn resolve_api_server(&self) -> String {
        if let Some(url) = &self.api_server {
            return url.clone();
        }
        match (
            std::env::var("KUBERNETES_SERVICE_HOST"),
            std::env::var("KUBERNETES_SERVICE_PORT"),
        ) {
            (Ok(host), Ok(port)) if !host.is_empty() => format!("https://{}:{}", host, port),
            _ => DEFAULT_API_SERVER.to_string(),
        }
    }

    fn url(&self, namespace: &str) -> String {
        format!(
            "{}/api/v1/namespaces/{}/configmaps/{}",
            self.resolve_api_server(),
            namespace,
            self.name
        )
    }

    async fn client(&self) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder().timeout(self.timeout);

        if let Some(ca_path) = &self.ca_path {
            // Outside a pod the bundle does not exist; fall back to system roots
            if let Ok(pem) = tokio::fs::read(ca_path).await {
                let cert = reqwest::Certificate::from_pem(&pem)
                    .map_err(|e| ConfigError::RemoteStore(format!("invalid cluster CA bundle: {}", e)))?;
                builder = builder.add_root_certificate(cert);
            }
        }

        builder
            .build()
            .map_err(|e| ConfigError::RemoteStore(format!("HTTP client setup failed: {}", e)))
    }

    async fn token(&self) -> Option<String> {
        let path = self.token_path.as_ref()?;
        tokio::fs::read_to_string(path)
            .await
            .ok()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
    }

    /// Turn the ConfigMap `data` section into a configuration object
    pub fn data_to_config(&self, data: BTreeMap<String, String>) -> Result<ConfigObject> {
        let mut config = ConfigObject::new();
        for (key, raw) in data {
            match ConfigFormat::from_path(Path::new(&key)) {
                Some(format) => {
                    let origin = format!("{}/{}", self.id, key);
                    let parsed = format.parse(&raw, &origin)?;
                    merge_objects(&mut config, parsed);
                }
                None => {
                    config.insert(key, serde_json::Value::String(raw));
                }
            }
        }
        Ok(config)
    }
}

#[async_trait]
impl ConfigSource for ConfigMapSource {
    fn id(&self) -> &str {
        &self.id
    }

    #[instrument(skip(self), fields(source = %self.id))]
    async fn load(&self) -> Result<ConfigObject> {
        let namespace = self.resolve_namespace()?;
        let url = self.url(&namespace);
        let client = self.client().await?;

        let mut request = client.get(&url).header("Accept", "application/json");
        if let Some(token) = self.token().await {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ConfigError::RemoteStore(format!("request to {} failed: {}", url, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(ConfigError::RemoteStore(format!(
                "configmap {}/{} returned {}",
                namespace, self.name, status
            )));
        }

        let body: ConfigMapBody = response
            .json()
            .await
            .map_err(|e| ConfigError::RemoteStore(format!("Response parse error: {}", e)))?;

        debug!(namespace = %namespace, entries = body.data.len(), "Fetched configmap");
        self.data_to_config(body.data)
    }
}
