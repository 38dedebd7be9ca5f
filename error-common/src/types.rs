use thiserror::Error;

/// Bootstrap and construction errors shared across services
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Configuration could not be resolved or is malformed
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Network setup errors (bad address, client construction)
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Message transport errors (registration, dispatch)
    #[error("Transport error: {0}")]
    TransportError(String),

    /// Internal system errors
    #[error("Internal error: {0}")]
    InternalError(String),

    /// Wrapped external errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ServiceError {
    /// Stable code for logs, see [`crate::codes`]
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::ConfigError(_) => crate::codes::config::INVALID_CONFIG,
            ServiceError::NetworkError(_) => crate::codes::network::CONNECTION_FAILED,
            ServiceError::TransportError(_) => crate::codes::transport::DISPATCH_FAILED,
            ServiceError::InternalError(_) | ServiceError::Other(_) => crate::codes::INTERNAL,
        }
    }
}

/// Result type alias for service construction
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Emit a structured error event
pub fn log_error(context: &str, error: &ServiceError) {
    tracing::error!(
        context = context,
        error_code = error.code(),
        error = %error,
        "Insult Engine error occurred"
    );
}
