//! Noun capability for Insult Engine
//!
//! One business operation set ([`NounService`]) with two interchangeable
//! implementations:
//!
//! - [`NounServiceImpl`]: calls the HTTP noun backend directly
//! - [`NounServiceProxy`]: forwards calls over an [`events_bus::Transport`]
//!   to an implementation bound with [`ServiceBinder`]
//!
//! Callers hold an `Arc<dyn NounService>` and cannot tell which one they got.

pub mod binder;
pub mod config;
pub mod health;
pub mod local;
pub mod model;
pub mod proxy;
pub mod service;

pub use binder::{actions, dispatch, ServiceBinder};
pub use config::{NounServiceConfig, CONFIG_SECTION};
pub use health::HealthCache;
pub use local::{NounServiceImpl, NOUN_PATH};
pub use model::NounRecord;
pub use proxy::{NounServiceProxy, DEFAULT_PROXY_TIMEOUT};
pub use service::NounService;

use config_engine::ResolvedConfig;
use error_common::ServiceError;
use events_bus::Transport;
use std::str::FromStr;
use std::sync::Arc;

/// Address the noun implementation is bound to by default
pub const NOUN_SERVICE_ADDRESS: &str = "noun.service";

/// Where calls to the noun capability are executed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServiceMode {
    /// In this process, straight to the backend
    #[default]
    Local,
    /// Through the transport to a bound implementation
    Proxy,
}

impl FromStr for ServiceMode {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "proxy" => Ok(Self::Proxy),
            other => Err(ServiceError::ConfigError(format!(
                "unknown service mode '{}', expected 'local' or 'proxy'",
                other
            ))),
        }
    }
}

/// Local implementation from the resolved configuration
pub fn create(config: &ResolvedConfig) -> error_common::Result<Arc<dyn NounService>> {
    Ok(Arc::new(NounServiceImpl::from_config(config)?))
}

/// Proxy for the implementation bound at `address`
pub fn create_proxy(transport: Arc<dyn Transport>, address: &str) -> Arc<dyn NounService> {
    Arc::new(NounServiceProxy::new(transport, address))
}
