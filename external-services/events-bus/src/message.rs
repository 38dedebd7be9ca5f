// Request and reply documents exchanged over a transport
use chrono::{DateTime, Utc};
use error_common::{CapabilityResult, Failure};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// A request addressed to whatever handler is registered at `address`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub address: String,
    pub action: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub payload: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(address: &str, action: &str, payload: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            address: address.to_string(),
            action: action.to_string(),
            headers: HashMap::new(),
            payload,
            timestamp: Utc::now(),
        }
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }
}

/// Outcome carried back to the requester
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ReplyBody {
    Ok { payload: serde_json::Value },
    Err { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    pub correlation_id: Uuid,
    pub body: ReplyBody,
}

impl Reply {
    pub fn ok(correlation_id: Uuid, payload: serde_json::Value) -> Self {
        Self {
            correlation_id,
            body: ReplyBody::Ok { payload },
        }
    }

    pub fn err(correlation_id: Uuid, reason: impl Into<String>) -> Self {
        Self {
            correlation_id,
            body: ReplyBody::Err {
                reason: reason.into(),
            },
        }
    }

    /// Encode a capability outcome as the reply to `request`
    pub fn from_result<T: Serialize>(request: &Message, result: CapabilityResult<T>) -> Self {
        match result {
            Ok(value) => match serde_json::to_value(value) {
                Ok(payload) => Self::ok(request.id, payload),
                Err(e) => Self::err(request.id, format!("reply encoding failed: {}", e)),
            },
            Err(failure) => Self::err(request.id, failure.reason),
        }
    }

    pub fn into_result(self) -> CapabilityResult<serde_json::Value> {
        match self.body {
            ReplyBody::Ok { payload } => Ok(payload),
            ReplyBody::Err { reason } => Err(Failure::new(reason)),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self.body, ReplyBody::Ok { .. })
    }
}
