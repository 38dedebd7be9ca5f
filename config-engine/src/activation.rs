use std::fmt;
use std::sync::Arc;

/// Predicate deciding whether a source takes part in a resolution.
///
/// Evaluated once per [`ConfigResolver::resolve`](crate::ConfigResolver::resolve)
/// call. An inactive source is treated as absent, never as failed.
#[derive(Clone)]
pub struct Activation {
    label: String,
    predicate: Arc<dyn Fn() -> bool + Send + Sync>,
}

impl Activation {
    pub fn new<F>(label: impl Into<String>, predicate: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            predicate: Arc::new(predicate),
        }
    }

    pub fn always() -> Self {
        Self::new("always", || true)
    }

    pub fn never() -> Self {
        Self::new("never", || false)
    }

    /// Active when the environment variable is set and non-empty
    pub fn env_present(var: impl Into<String>) -> Self {
        let var = var.into();
        let label = format!("env:{}", var);
        Self::new(label, move || {
            std::env::var(&var).map(|value| !value.is_empty()).unwrap_or(false)
        })
    }

    pub fn is_active(&self) -> bool {
        (self.predicate)()
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl fmt::Debug for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Activation").field("label", &self.label).finish()
    }
}
