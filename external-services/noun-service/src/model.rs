use serde::{Deserialize, Serialize};

/// The single business entity: one noun
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NounRecord {
    pub value: String,
}

impl NounRecord {
    pub fn new(value: impl Into<String>) -> Self {
        Self { value: value.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_fields_ignored() {
        let record: NounRecord =
            serde_json::from_str(r#"{"value": "idiot", "id": 7, "source": "shakespeare"}"#).unwrap();
        assert_eq!(record, NounRecord::new("idiot"));
    }

    #[test]
    fn test_missing_value_rejected() {
        assert!(serde_json::from_str::<NounRecord>(r#"{"noun": "idiot"}"#).is_err());
    }
}
