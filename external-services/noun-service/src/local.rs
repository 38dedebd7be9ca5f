use async_trait::async_trait;
use config_engine::ResolvedConfig;
use error_common::{codes, CapabilityResult, Failure, Result, ServiceError};
use reqwest::StatusCode;
use std::error::Error as _;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::config::NounServiceConfig;
use crate::health::HealthCache;
use crate::model::NounRecord;
use crate::service::NounService;

/// Path of the noun resource on the backend
pub const NOUN_PATH: &str = "/api/v1/noun";

/// Noun capability backed by an HTTP endpoint.
///
/// Cloning is cheap; clones share the connection pool and health cache.
#[derive(Clone)]
pub struct NounServiceImpl {
    client: reqwest::Client,
    config: Arc<NounServiceConfig>,
    base_url: String,
    health: HealthCache,
}

impl NounServiceImpl {
    /// Build the service; invalid settings are rejected here, not per call
    pub fn new(config: NounServiceConfig) -> Result<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .connect_timeout(config.timeout())
            .build()
            .map_err(|e| ServiceError::NetworkError(format!("HTTP client setup failed: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url(),
            health: HealthCache::new(config.health_cache_ttl()),
            config: Arc::new(config),
        })
    }

    /// Build from the `noun` section of the resolved configuration
    pub fn from_config(resolved: &ResolvedConfig) -> Result<Self> {
        Self::new(NounServiceConfig::from_resolved(resolved)?)
    }

    pub fn config(&self) -> &NounServiceConfig {
        &self.config
    }

    /// [`NounService::get`] with a caller supplied deadline
    #[instrument(skip(self), fields(base_url = %self.base_url))]
    pub async fn get_with_timeout(&self, timeout: Duration) -> CapabilityResult<NounRecord> {
        match tokio::time::timeout(timeout, self.fetch_noun()).await {
            Ok(result) => result,
            Err(_) => {
                warn!(error_code = codes::network::TIMEOUT, timeout_ms = timeout.as_millis() as u64, "Noun request timed out");
                Err(Failure::timeout())
            }
        }
    }

    async fn fetch_noun(&self) -> CapabilityResult<NounRecord> {
        let url = format!("{}{}", self.base_url, NOUN_PATH);

        let response = self.client.get(&url).send().await.map_err(transport_failure)?;

        let status = response.status();
        if status != StatusCode::OK {
            let reason = status_message(&response);
            warn!(error_code = codes::network::UPSTREAM_STATUS, status = status.as_u16(), reason = %reason, "Noun backend returned an error status");
            return Err(Failure::new(reason));
        }

        let body = response.bytes().await.map_err(transport_failure)?;
        let record: NounRecord = serde_json::from_slice(&body)
            .map_err(|e| Failure::new(format!("malformed response body: {}", e)))?;

        debug!(noun = %record.value, "Fetched noun");
        Ok(record)
    }
}

async fn probe(client: reqwest::Client, url: String, timeout: Duration) -> bool {
    match tokio::time::timeout(timeout, client.get(&url).send()).await {
        Ok(Ok(response)) if response.status().is_success() => true,
        Ok(Ok(response)) => {
            warn!(url = %url, status = response.status().as_u16(), "Health probe returned an error status");
            false
        }
        Ok(Err(e)) => {
            warn!(url = %url, error = %describe(&e), "Health probe failed");
            false
        }
        Err(_) => {
            warn!(url = %url, "Health probe timed out");
            false
        }
    }
}

/// Reason phrase exactly as sent by the server, falling back to the
/// canonical phrase, then to the bare code
fn status_message(response: &reqwest::Response) -> String {
    response
        .extensions()
        .get::<hyper::ext::ReasonPhrase>()
        .and_then(|phrase| std::str::from_utf8(phrase.as_bytes()).ok())
        .filter(|phrase| !phrase.trim().is_empty())
        .map(str::to_string)
        .or_else(|| response.status().canonical_reason().map(str::to_string))
        .unwrap_or_else(|| response.status().as_str().to_string())
}

fn transport_failure(error: reqwest::Error) -> Failure {
    if error.is_timeout() {
        return Failure::timeout();
    }
    let description = describe(&error);
    warn!(error_code = codes::network::CONNECTION_FAILED, error = %description, "Noun backend call failed");
    Failure::new(description)
}

/// Error text including its causes, e.g. `... : Connection refused`
fn describe(error: &reqwest::Error) -> String {
    let mut description = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        description.push_str(": ");
        description.push_str(&cause.to_string());
        source = cause.source();
    }
    description
}

#[async_trait]
impl NounService for NounServiceImpl {
    async fn get(&self) -> CapabilityResult<NounRecord> {
        self.get_with_timeout(self.config.timeout()).await
    }

    async fn save(&self, record: NounRecord) -> CapabilityResult<NounRecord> {
        debug!(noun = %record.value, "save requested but not supported by the noun backend");
        Err(Failure::not_implemented())
    }

    async fn health_check(&self) -> CapabilityResult<bool> {
        let url = format!("{}{}", self.base_url, self.config.health_path);
        let probe = probe(self.client.clone(), url, self.config.timeout());
        Ok(self.health.get_or_probe(probe).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_invalid_config() {
        assert!(matches!(
            NounServiceImpl::new(NounServiceConfig::new("localhost", 0)),
            Err(ServiceError::ConfigError(_))
        ));
    }

    #[test]
    fn test_base_url_from_config() {
        let mut config = NounServiceConfig::new("noun-service", 8080);
        config.path_base = "/insults".to_string();
        let service = NounServiceImpl::new(config).unwrap();
        assert_eq!(service.base_url, "http://noun-service:8080/insults");
        assert_eq!(service.config().port, 8080);
    }

    #[tokio::test]
    async fn test_save_is_explicitly_not_implemented() {
        let service = NounServiceImpl::new(NounServiceConfig::new("localhost", 8080)).unwrap();
        let result = service.save(NounRecord::new("knave")).await;
        assert_eq!(result, Err(Failure::new("not implemented")));
    }
}
