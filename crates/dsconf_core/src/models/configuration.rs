//! Editable configuration state for one data-source connector.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use super::extra::EditableExtra;
use super::record::SelectionPayload;

/// Free-form connector parameters.
///
/// Insertion-ordered; may hold a `query` object and a `catalog` object.
pub type Parameters = Map<String, Value>;

/// Key under which the query mapping lives in [`Parameters`].
pub const QUERY_PARAMETER: &str = "query";

/// Key under which the catalog projection lives in [`Parameters`].
pub const CATALOG_PARAMETER: &str = "catalog";

/// How the connector is being configured.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ConfigurationMethod {
    /// Connection URI entered by hand.
    SqlalchemyForm,
    /// Engine-specific form fields.
    DynamicForm,
    /// Any other method, kept verbatim.
    Custom(String),
}

impl ConfigurationMethod {
    /// Convert to string representation for storage.
    pub fn as_str(&self) -> &str {
        match self {
            Self::SqlalchemyForm => "sqlalchemy_form",
            Self::DynamicForm => "dynamic_form",
            Self::Custom(method) => method,
        }
    }

    /// Check if this is the engine-specific form mode.
    pub fn is_dynamic_form(&self) -> bool {
        matches!(self, Self::DynamicForm)
    }
}

impl From<String> for ConfigurationMethod {
    fn from(s: String) -> Self {
        match s.as_str() {
            "sqlalchemy_form" => Self::SqlalchemyForm,
            "dynamic_form" => Self::DynamicForm,
            _ => Self::Custom(s),
        }
    }
}

impl From<&str> for ConfigurationMethod {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<ConfigurationMethod> for String {
    fn from(method: ConfigurationMethod) -> Self {
        match method {
            ConfigurationMethod::Custom(method) => method,
            other => other.as_str().to_string(),
        }
    }
}

/// One named sub-resource of a connector (e.g. a sheet behind a table name).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Table name exposed by the connector.
    #[serde(default)]
    pub name: String,
    /// Location of the sub-resource.
    #[serde(default)]
    pub value: String,
}

impl CatalogEntry {
    /// Create a new catalog entry.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), value: value.into() }
    }
}

/// A named write that cannot be stored in its typed slot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot store {found} in '{field}': {reason}")]
pub struct RejectedWrite {
    /// Name of the targeted field.
    pub field: String,
    /// JSON kind of the rejected value.
    pub found: &'static str,
    /// Why the value does not fit.
    pub reason: String,
}

impl RejectedWrite {
    pub(crate) fn new(field: &str, value: &Value, reason: impl Into<String>) -> Self {
        Self { field: field.to_string(), found: value_kind(value), reason: reason.into() }
    }
}

/// Partially specified connector configuration being edited.
///
/// Every slot is optional until set. Keys without a typed slot (`id`,
/// `database_name`, `backend`, `extra`, ...) live in `fields` and are carried
/// through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationState {
    /// Engine name (e.g. "postgresql", "gsheets").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine: Option<String>,
    /// Configuration mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration_method: Option<ConfigurationMethod>,
    /// Opaque secret text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted_extra: Option<String>,
    /// Connector parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Parameters>,
    /// Ordered catalog entries; source of truth for `parameters.catalog`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<Vec<CatalogEntry>>,
    /// Editable form of the extra settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_json: Option<EditableExtra>,
    /// Text form of `parameters.query`; authoritative while editing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_input: Option<String>,
    /// Pass-through keys.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl ConfigurationState {
    /// Fresh state for a newly selected engine or configuration mode.
    pub fn from_selection(payload: SelectionPayload) -> Self {
        let mut fields = Map::new();
        if let Some(name) = payload.database_name {
            fields.insert("database_name".to_string(), Value::String(name));
        }

        Self {
            engine: payload.engine,
            configuration_method: Some(payload.configuration_method),
            extra_json: Some(EditableExtra::default()),
            fields,
            ..Self::default()
        }
    }

    /// Check if the engine-specific form mode is selected.
    pub fn is_dynamic_form(&self) -> bool {
        self.configuration_method.as_ref().is_some_and(ConfigurationMethod::is_dynamic_form)
    }

    /// Get the record ID, if this state was loaded from a persisted record.
    pub fn id(&self) -> Option<i64> {
        self.fields.get("id").and_then(Value::as_i64)
    }

    /// Get the display name.
    pub fn database_name(&self) -> Option<&str> {
        self.fields.get("database_name").and_then(Value::as_str)
    }

    /// Get a single parameter.
    pub fn parameter(&self, name: &str) -> Option<&Value> {
        self.parameters.as_ref().and_then(|p| p.get(name))
    }

    /// Write a top-level field by name.
    ///
    /// Recognized names go to their typed slot; anything else is stored in
    /// `fields`. `null` clears the slot.
    pub fn set_field(&mut self, name: &str, value: Value) -> Result<(), RejectedWrite> {
        match name {
            "engine" => self.engine = text_slot(name, value)?,
            "encrypted_extra" => self.encrypted_extra = text_slot(name, value)?,
            "query_input" => self.query_input = text_slot(name, value)?,
            "configuration_method" => {
                self.configuration_method = text_slot(name, value)?.map(ConfigurationMethod::from)
            }
            "parameters" => self.parameters = structured_slot(name, value)?,
            "catalog" => self.catalog = structured_slot(name, value)?,
            "extra_json" => self.extra_json = structured_slot(name, value)?,
            _ => set_or_remove(&mut self.fields, name, value),
        }
        Ok(())
    }
}

/// Insert `value` under `name`, or remove the key when `value` is null.
pub(crate) fn set_or_remove(map: &mut Map<String, Value>, name: &str, value: Value) {
    if value.is_null() {
        map.remove(name);
    } else {
        map.insert(name.to_string(), value);
    }
}

/// Coerce a scalar into text; objects and arrays do not fit.
pub(crate) fn text_slot(field: &str, value: Value) -> Result<Option<String>, RejectedWrite> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Bool(_) | Value::Number(_) => Ok(Some(value.to_string())),
        Value::Array(_) | Value::Object(_) => {
            Err(RejectedWrite::new(field, &value, "expected a scalar"))
        }
    }
}

/// Deserialize a structured value into its typed slot.
pub(crate) fn structured_slot<T: DeserializeOwned>(
    field: &str,
    value: Value,
) -> Result<Option<T>, RejectedWrite> {
    if value.is_null() {
        return Ok(None);
    }
    let kind = value_kind(&value);
    serde_json::from_value(value).map(Some).map_err(|e| RejectedWrite {
        field: field.to_string(),
        found: kind,
        reason: e.to_string(),
    })
}

/// Render a JSON value as plain text (strings without quotes).
pub(crate) fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
