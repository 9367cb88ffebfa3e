//! Persisted connector records and selection payloads.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::configuration::{ConfigurationMethod, Parameters};

/// A connector record as loaded from or saved to storage.
///
/// `extra` is JSON text. Keys without a typed slot are kept in `fields`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine: Option<String>,
    /// Engine name reported by the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration_method: Option<ConfigurationMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Parameters>,
    /// JSON-encoded extra settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted_extra: Option<String>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl RawRecord {
    /// Get the record ID.
    pub fn id(&self) -> Option<i64> {
        self.fields.get("id").and_then(Value::as_i64)
    }

    /// Set the record ID.
    pub fn set_id(&mut self, id: i64) {
        self.fields.insert("id".to_string(), Value::from(id));
    }

    /// Get the display name.
    pub fn database_name(&self) -> Option<&str> {
        self.fields.get("database_name").and_then(Value::as_str)
    }

    /// Engine name, preferring the backend-reported one.
    pub fn engine_name(&self) -> Option<&str> {
        self.backend.as_deref().or(self.engine.as_deref())
    }
}

/// Payload for selecting an engine or switching configuration mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine: Option<String>,
    pub configuration_method: ConfigurationMethod,
}

impl SelectionPayload {
    /// Create a selection for the given engine and mode.
    pub fn new(engine: impl Into<String>, configuration_method: ConfigurationMethod) -> Self {
        Self { database_name: None, engine: Some(engine.into()), configuration_method }
    }

    /// Set the display name.
    pub fn with_database_name(mut self, name: impl Into<String>) -> Self {
        self.database_name = Some(name.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_raw_record_keeps_unknown_fields() {
        let record: RawRecord = serde_json::from_value(json!({
            "id": 12,
            "database_name": "warehouse",
            "backend": "postgresql",
            "configuration_method": "dynamic_form",
            "extra": "{}",
            "expose_in_sqllab": true
        }))
        .unwrap();

        assert_eq!(record.id(), Some(12));
        assert_eq!(record.database_name(), Some("warehouse"));
        assert_eq!(record.engine_name(), Some("postgresql"));
        assert_eq!(record.configuration_method, Some(ConfigurationMethod::DynamicForm));

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["expose_in_sqllab"], json!(true));
        assert!(value.get("engine").is_none());
    }

    #[test]
    fn test_set_id() {
        let mut record = RawRecord::default();
        assert_eq!(record.id(), None);
        record.set_id(3);
        assert_eq!(record.id(), Some(3));
    }

    #[test]
    fn test_selection_payload_builder() {
        let payload = SelectionPayload::new("mysql", ConfigurationMethod::SqlalchemyForm)
            .with_database_name("orders");
        assert_eq!(payload.engine.as_deref(), Some("mysql"));
        assert_eq!(payload.database_name.as_deref(), Some("orders"));
    }
}
