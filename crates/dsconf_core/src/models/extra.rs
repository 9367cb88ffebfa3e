//! Editable and wire forms of the "extra" settings.
//!
//! While editing, `metadata_params` and `engine_params` are JSON text so the
//! user can type freely; on the wire they are nested objects. The two forms
//! are distinct types and only the extra codec converts between them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::configuration::{set_or_remove, structured_slot, RejectedWrite};

pub const ALLOWS_VIRTUAL_TABLE_EXPLORE: &str = "allows_virtual_table_explore";
pub const METADATA_CACHE_TIMEOUT: &str = "metadata_cache_timeout";
pub const SCHEMA_CACHE_TIMEOUT: &str = "schema_cache_timeout";
pub const TABLE_CACHE_TIMEOUT: &str = "table_cache_timeout";
pub const SCHEMAS_ALLOWED_FOR_FILE_UPLOAD: &str = "schemas_allowed_for_file_upload";
pub const METADATA_PARAMS: &str = "metadata_params";
pub const ENGINE_PARAMS: &str = "engine_params";

fn default_true() -> bool {
    true
}

/// Cache lifetimes for connector metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataCacheTimeout {
    /// Schema list cache timeout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_cache_timeout: Option<Value>,
    /// Table list cache timeout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_cache_timeout: Option<Value>,
    /// Unrecognized keys.
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl MetadataCacheTimeout {
    /// Write one timeout by name; `null` clears it.
    pub fn set(&mut self, name: &str, value: Value) {
        let value = (!value.is_null()).then_some(value);
        match name {
            SCHEMA_CACHE_TIMEOUT => self.schema_cache_timeout = value,
            TABLE_CACHE_TIMEOUT => self.table_cache_timeout = value,
            _ => set_or_remove(&mut self.other, name, value.unwrap_or(Value::Null)),
        }
    }
}

/// Extra settings as held during an editing session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditableExtra {
    /// Whether virtual tables may be explored.
    #[serde(default = "default_true")]
    pub allows_virtual_table_explore: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_cache_timeout: Option<MetadataCacheTimeout>,
    /// May contain empty entries while editing; dropped on commit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schemas_allowed_for_file_upload: Option<Vec<String>>,
    /// JSON text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_params: Option<String>,
    /// JSON text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_params: Option<String>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl Default for EditableExtra {
    fn default() -> Self {
        Self {
            allows_virtual_table_explore: true,
            metadata_cache_timeout: None,
            schemas_allowed_for_file_upload: None,
            metadata_params: None,
            engine_params: None,
            other: Map::new(),
        }
    }
}

impl EditableExtra {
    /// Write a cache timeout into `metadata_cache_timeout`, creating it if needed.
    pub fn set_cache_timeout(&mut self, name: &str, value: Value) {
        self.metadata_cache_timeout.get_or_insert_with(MetadataCacheTimeout::default).set(name, value);
    }

    /// Replace the upload schema list from comma-separated text.
    ///
    /// Empty segments are kept until commit.
    pub fn set_schemas_from_text(&mut self, text: Option<&str>) {
        self.schemas_allowed_for_file_upload =
            Some(text.unwrap_or_default().split(',').map(String::from).collect());
    }

    /// Write a field by name.
    ///
    /// `metadata_params`/`engine_params` keep text as-is and encode anything
    /// structured into text. A `null` clears the field (or restores the
    /// default for `allows_virtual_table_explore`).
    pub fn set_field(&mut self, name: &str, value: Value) -> Result<(), RejectedWrite> {
        match name {
            ALLOWS_VIRTUAL_TABLE_EXPLORE => match value {
                Value::Bool(allowed) => self.allows_virtual_table_explore = allowed,
                Value::Null => self.allows_virtual_table_explore = true,
                other => return Err(RejectedWrite::new(name, &other, "expected a boolean")),
            },
            METADATA_CACHE_TIMEOUT => self.metadata_cache_timeout = structured_slot(name, value)?,
            SCHEMAS_ALLOWED_FOR_FILE_UPLOAD => {
                self.schemas_allowed_for_file_upload = structured_slot(name, value)?
            }
            METADATA_PARAMS => self.metadata_params = json_text(value),
            ENGINE_PARAMS => self.engine_params = json_text(value),
            _ => set_or_remove(&mut self.other, name, value),
        }
        Ok(())
    }
}

fn json_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text),
        other => Some(other.to_string()),
    }
}

/// Extra settings as persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WireExtra {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allows_virtual_table_explore: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_cache_timeout: Option<MetadataCacheTimeout>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schemas_allowed_for_file_upload: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_params: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_params: Option<Value>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl WireExtra {
    /// Get `engine_params.catalog` when it is a mapping.
    pub fn engine_params_catalog(&self) -> Option<&Map<String, Value>> {
        self.engine_params.as_ref()?.get("catalog")?.as_object()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_allows_virtual_table_explore() {
        let extra = EditableExtra::default();
        assert!(extra.allows_virtual_table_explore);

        let parsed: EditableExtra = serde_json::from_value(json!({})).unwrap();
        assert_eq!(parsed, extra);
    }

    #[test]
    fn test_set_cache_timeout_creates_container() {
        let mut extra = EditableExtra::default();
        extra.set_cache_timeout(SCHEMA_CACHE_TIMEOUT, json!("600"));
        extra.set_cache_timeout(TABLE_CACHE_TIMEOUT, json!("60"));

        let timeout = extra.metadata_cache_timeout.unwrap();
        assert_eq!(timeout.schema_cache_timeout, Some(json!("600")));
        assert_eq!(timeout.table_cache_timeout, Some(json!("60")));
    }

    #[test]
    fn test_set_schemas_keeps_empty_segments() {
        let mut extra = EditableExtra::default();
        extra.set_schemas_from_text(Some("a,,b"));
        assert_eq!(
            extra.schemas_allowed_for_file_upload,
            Some(vec!["a".to_string(), String::new(), "b".to_string()])
        );

        extra.set_schemas_from_text(None);
        assert_eq!(extra.schemas_allowed_for_file_upload, Some(vec![String::new()]));
    }

    #[test]
    fn test_set_field_params_stay_text() {
        let mut extra = EditableExtra::default();
        extra.set_field(METADATA_PARAMS, json!("{\"a\": 1}")).unwrap();
        extra.set_field(ENGINE_PARAMS, json!({"pool_size": 5})).unwrap();

        assert_eq!(extra.metadata_params.as_deref(), Some("{\"a\": 1}"));
        assert_eq!(extra.engine_params.as_deref(), Some("{\"pool_size\":5}"));
    }

    #[test]
    fn test_set_field_rejects_text_for_boolean() {
        let mut extra = EditableExtra::default();
        assert!(extra.set_field(ALLOWS_VIRTUAL_TABLE_EXPLORE, json!("no")).is_err());
        assert!(extra.allows_virtual_table_explore);

        extra.set_field(ALLOWS_VIRTUAL_TABLE_EXPLORE, json!(false)).unwrap();
        assert!(!extra.allows_virtual_table_explore);
    }

    #[test]
    fn test_unknown_keys_flatten() {
        let mut extra = EditableExtra::default();
        extra.set_field("cost_estimate_enabled", json!(true)).unwrap();

        let value = serde_json::to_value(&extra).unwrap();
        assert_eq!(value["cost_estimate_enabled"], json!(true));
        assert_eq!(value["allows_virtual_table_explore"], json!(true));
    }

    #[test]
    fn test_wire_engine_params_catalog() {
        let wire: WireExtra = serde_json::from_value(json!({
            "engine_params": {"catalog": {"sales": "https://sheet/1"}}
        }))
        .unwrap();
        let catalog = wire.engine_params_catalog().unwrap();
        assert_eq!(catalog.get("sales"), Some(&json!("https://sheet/1")));

        assert!(WireExtra::default().engine_params_catalog().is_none());
    }
}
