use async_trait::async_trait;
use error_common::{codes, CapabilityResult, Failure};
use events_bus::{EventBusError, Message, Transport};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::binder::actions;
use crate::model::NounRecord;
use crate::service::NounService;

/// Default wait for a reply from the remote implementation
pub const DEFAULT_PROXY_TIMEOUT: Duration = Duration::from_secs(30);

/// [`NounService`] that forwards every call to whatever implementation is
/// bound at `address` on the transport.
#[derive(Clone)]
pub struct NounServiceProxy {
    transport: Arc<dyn Transport>,
    address: String,
    timeout: Duration,
}

impl NounServiceProxy {
    pub fn new(transport: Arc<dyn Transport>, address: impl Into<String>) -> Self {
        Self {
            transport,
            address: address.into(),
            timeout: DEFAULT_PROXY_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    async fn call<T: DeserializeOwned>(&self, action: &str, payload: Value) -> CapabilityResult<T> {
        let message = Message::new(&self.address, action, payload);
        debug!(address = %self.address, action, request_id = %message.id, "Dispatching request");

        let reply = self
            .transport
            .request(&self.address, message, self.timeout)
            .await
            .map_err(|e| {
                warn!(error_code = dispatch_error_code(&e), address = %self.address, action, error = %e, "Dispatch failed");
                match e {
                    EventBusError::Timeout { .. } => Failure::timeout(),
                    other => Failure::new(other.to_string()),
                }
            })?;

        let payload = reply.into_result()?;
        serde_json::from_value(payload).map_err(|e| Failure::new(format!("malformed reply payload: {}", e)))
    }
}

fn dispatch_error_code(error: &EventBusError) -> &'static str {
    match error {
        EventBusError::NoHandler(_) => codes::transport::NO_HANDLER,
        EventBusError::Timeout { .. } => codes::network::TIMEOUT,
        _ => codes::transport::DISPATCH_FAILED,
    }
}

#[async_trait]
impl NounService for NounServiceProxy {
    async fn get(&self) -> CapabilityResult<NounRecord> {
        self.call(actions::GET, Value::Null).await
    }

    async fn save(&self, record: NounRecord) -> CapabilityResult<NounRecord> {
        let payload = serde_json::to_value(&record).map_err(|e| Failure::new(format!("request encoding failed: {}", e)))?;
        self.call(actions::SAVE, payload).await
    }

    async fn health_check(&self) -> CapabilityResult<bool> {
        self.call(actions::HEALTH_CHECK, Value::Null).await
    }
}
