use base64::{engine::general_purpose, Engine as _};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

lazy_static! {
    static ref SENSITIVE_KEY_REGEX: Regex =
        Regex::new(r"(?i)(password|passwd|secret|token|api[_-]?key|private[_-]?key|credential)").unwrap();
    static ref URL_CREDENTIALS_REGEX: Regex =
        Regex::new(r"(?P<scheme>[a-zA-Z][a-zA-Z0-9+.-]*://)(?P<user>[^:@/\s]+):(?P<pass>[^@/\s]+)@").unwrap();
    static ref BEARER_REGEX: Regex = Regex::new(r"(?i)\bbearer\s+[A-Za-z0-9._~+/=-]+").unwrap();
}

const REDACTED: &str = "[REDACTED]";

/// Secret redaction configuration
#[derive(Debug, Clone)]
pub struct RedactionConfig {
    pub redact_sensitive_keys: bool,
    pub redact_url_credentials: bool,
    pub redact_bearer_tokens: bool,
    /// Replace secrets with a short hash instead of a fixed marker so
    /// that two dumps can be compared without revealing the value
    pub hash_for_correlation: bool,
    pub custom_key_patterns: Vec<Regex>,
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            redact_sensitive_keys: true,
            redact_url_credentials: true,
            redact_bearer_tokens: true,
            hash_for_correlation: false,
            custom_key_patterns: Vec::new(),
        }
    }
}

impl RedactionConfig {
    pub fn with_key_pattern(mut self, pattern: Regex) -> Self {
        self.custom_key_patterns.push(pattern);
        self
    }
}

/// Redacts secrets out of configuration documents before they are logged
pub struct ConfigRedactor {
    config: RedactionConfig,
}

impl Default for ConfigRedactor {
    fn default() -> Self {
        Self::new(RedactionConfig::default())
    }
}

impl ConfigRedactor {
    pub fn new(config: RedactionConfig) -> Self {
        Self { config }
    }

    /// Returns a copy of `value` with every secret masked
    pub fn redact_value(&self, value: &Value) -> Value {
        match value {
            Value::Object(map) => {
                let mut out = Map::with_capacity(map.len());
                for (key, child) in map {
                    let masked = if self.is_sensitive_key(key) && !child.is_object() {
                        self.mask(child)
                    } else {
                        self.redact_value(child)
                    };
                    out.insert(key.clone(), masked);
                }
                Value::Object(out)
            }
            Value::Array(items) => Value::Array(items.iter().map(|v| self.redact_value(v)).collect()),
            Value::String(s) => Value::String(self.redact_text(s)),
            other => other.clone(),
        }
    }

    /// Masks credentials embedded in free text
    pub fn redact_text(&self, text: &str) -> String {
        let mut result = text.to_string();

        if self.config.redact_url_credentials {
            result = URL_CREDENTIALS_REGEX
                .replace_all(&result, |caps: &regex::Captures| {
                    format!("{}{}:{}@", &caps["scheme"], &caps["user"], REDACTED)
                })
                .to_string();
        }

        if self.config.redact_bearer_tokens {
            result = BEARER_REGEX
                .replace_all(&result, |caps: &regex::Captures| {
                    if self.config.hash_for_correlation {
                        format!("Bearer TOKEN[{}]", self.hash_value(&caps[0]))
                    } else {
                        format!("Bearer {}", REDACTED)
                    }
                })
                .to_string();
        }

        result
    }

    /// Pretty JSON of the redacted document, for startup logs
    pub fn redact_pretty(&self, value: &Value) -> String {
        let redacted = self.redact_value(value);
        serde_json::to_string_pretty(&redacted).unwrap_or_else(|_| redacted.to_string())
    }

    fn is_sensitive_key(&self, key: &str) -> bool {
        (self.config.redact_sensitive_keys && SENSITIVE_KEY_REGEX.is_match(key))
            || self.config.custom_key_patterns.iter().any(|p| p.is_match(key))
    }

    fn mask(&self, value: &Value) -> Value {
        if value.is_null() {
            return Value::Null;
        }
        if self.config.hash_for_correlation {
            let raw = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            Value::String(format!("SECRET[{}]", self.hash_value(&raw)))
        } else {
            Value::String(REDACTED.to_string())
        }
    }

    fn hash_value(&self, value: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(value.as_bytes());
        let result = hasher.finalize();
        general_purpose::STANDARD.encode(&result[..8]) // Use first 8 bytes for shorter hash
    }
}
