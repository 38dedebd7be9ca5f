use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{ConfigError, Result};
use crate::merge::merge_all;

/// Final, merged configuration of a process.
///
/// Built once by the resolver and shared read-only (usually behind an
/// `Arc`); there is no way to mutate it after construction.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResolvedConfig {
    root: Map<String, Value>,
}

impl ResolvedConfig {
    /// Merge layers in declared order, later layers taking precedence
    pub fn from_layers<I>(layers: I) -> Self
    where
        I: IntoIterator<Item = Map<String, Value>>,
    {
        Self {
            root: merge_all(layers),
        }
    }

    pub fn from_object(root: Map<String, Value>) -> Self {
        Self { root }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.root.get(key)
    }

    /// JSON pointer lookup, e.g. `/noun/port`
    pub fn pointer(&self, pointer: &str) -> Option<&Value> {
        let mut segments = pointer.strip_prefix('/')?.split('/');
        let first = segments.next()?;
        segments.try_fold(self.root.get(&unescape(first))?, |value, segment| match value {
            Value::Object(map) => map.get(&unescape(segment)),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
    }

    /// Deserialize a named top-level section
    pub fn section<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        let value = self
            .root
            .get(key)
            .ok_or_else(|| ConfigError::MissingSection(key.to_string()))?;

        if !value.is_object() {
            return Err(ConfigError::InvalidSection {
                section: key.to_string(),
                message: "expected an object".to_string(),
            });
        }

        T::deserialize(value).map_err(|e| ConfigError::InvalidSection {
            section: key.to_string(),
            message: e.to_string(),
        })
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.root.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.root.keys()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.root
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.root.clone())
    }

    pub fn to_pretty(&self) -> String {
        serde_json::to_string_pretty(&self.root).unwrap_or_default()
    }
}

impl TryFrom<Value> for ResolvedConfig {
    type Error = ConfigError;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Object(root) => Ok(Self { root }),
            _ => Err(ConfigError::NotAnObject {
                origin: "value".to_string(),
            }),
        }
    }
}

fn unescape(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}
