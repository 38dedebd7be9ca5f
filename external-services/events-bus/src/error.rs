use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EventBusError {
    #[error("No handler registered for address {0}")]
    NoHandler(String),

    #[error("Request to {address} timed out after {timeout_ms}ms")]
    Timeout { address: String, timeout_ms: u128 },

    #[error("Handler for {0} dropped the request without replying")]
    HandlerGone(String),

    #[error("Message serialization failed: {0}")]
    Serialization(String),

    #[error("Transport error: {0}")]
    Transport(String),
}

pub type Result<T> = std::result::Result<T, EventBusError>;
