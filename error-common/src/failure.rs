use serde::{Deserialize, Serialize};
use std::fmt;

/// Reason reported when an outbound call exceeds its deadline.
pub const TIMEOUT_REASON: &str = "timeout";

/// Reason reported by operations that are declared but not performed.
pub const NOT_IMPLEMENTED_REASON: &str = "not implemented";

/// Failed outcome of a capability call.
///
/// Carries only a human readable reason so that it can be rebuilt
/// byte-for-byte on the far side of a transport.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Failure {
    pub reason: String,
}

/// Tagged outcome of a capability call: `Ok(value)` or `Err(Failure)`.
pub type CapabilityResult<T> = std::result::Result<T, Failure>;

impl Failure {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn timeout() -> Self {
        Self::new(TIMEOUT_REASON)
    }

    pub fn not_implemented() -> Self {
        Self::new(NOT_IMPLEMENTED_REASON)
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn is_timeout(&self) -> bool {
        self.reason == TIMEOUT_REASON
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason)
    }
}

impl std::error::Error for Failure {}

impl From<String> for Failure {
    fn from(reason: String) -> Self {
        Self::new(reason)
    }
}

impl From<&str> for Failure {
    fn from(reason: &str) -> Self {
        Self::new(reason)
    }
}
