//! Edit actions consumed by the configuration reducer.
//!
//! JSON form: `{"type": "<kind>", "payload": {...}}`, with `payload` omitted
//! for `addTableCatalogSheet` and `reset`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::record::{RawRecord, SelectionPayload};

/// Input type that carries its value in `checked`.
pub const CHECKBOX: &str = "checkbox";

/// A raw form-field edit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldInput {
    /// Target field name.
    pub name: String,
    /// Entered text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Input type ("checkbox", "text", "catalog-0", ...).
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub input_type: Option<String>,
    /// Checkbox state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,
}

impl FieldInput {
    /// Create a text edit.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), value: Some(value.into()), ..Self::default() }
    }

    /// Create a checkbox edit.
    pub fn checkbox(name: impl Into<String>, checked: bool) -> Self {
        Self {
            name: name.into(),
            input_type: Some(CHECKBOX.to_string()),
            checked: Some(checked),
            ..Self::default()
        }
    }

    /// Set the input type.
    pub fn with_type(mut self, input_type: impl Into<String>) -> Self {
        self.input_type = Some(input_type.into());
        self
    }

    /// Check if this edit comes from a checkbox.
    pub fn is_checkbox(&self) -> bool {
        self.input_type.as_deref() == Some(CHECKBOX)
    }

    /// The value to store: `checked` for checkboxes, `value` otherwise.
    pub fn resolved_value(&self) -> Value {
        if self.is_checkbox() {
            self.checked.map(Value::Bool).unwrap_or(Value::Null)
        } else {
            self.text_value()
        }
    }

    /// The entered text as JSON, `null` when absent.
    pub fn text_value(&self) -> Value {
        self.value.clone().map(Value::String).unwrap_or(Value::Null)
    }
}

/// An edit from a JSON editor; `json` is already structured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorInput {
    pub name: String,
    #[serde(default)]
    pub json: Value,
}

impl EditorInput {
    pub fn new(name: impl Into<String>, json: Value) -> Self {
        Self { name: name.into(), json }
    }
}

/// One discrete edit of a configuration session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Action {
    /// Top-level write; checkboxes store `checked`.
    InputChange(FieldInput),
    /// Top-level text write.
    TextChange(FieldInput),
    /// Top-level structured write.
    EditorChange(EditorInput),
    /// Parameter write, or a catalog entry edit for `catalog-<n>` types.
    ParametersChange(FieldInput),
    /// Append a blank catalog entry.
    AddTableCatalogSheet,
    /// Remove a catalog entry.
    RemoveTableCatalogSheet {
        #[serde(rename = "indexToDelete")]
        index: usize,
    },
    /// Write into the extra settings.
    ExtraInputChange(FieldInput),
    /// Structured write into the extra settings.
    ExtraEditorChange(EditorInput),
    /// Replace the query text and its mapping.
    QueryChange {
        #[serde(default)]
        value: String,
    },
    /// Engine selected; replaces the whole state.
    DbSelected(SelectionPayload),
    /// Configuration mode switched; replaces the whole state.
    ConfigMethodChange(SelectionPayload),
    /// Persisted record loaded; replaces the whole state.
    Fetched(RawRecord),
    /// End the session.
    Reset,
}

impl Action {
    /// Get the action kind name.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InputChange(_) => "inputChange",
            Self::TextChange(_) => "textChange",
            Self::EditorChange(_) => "editorChange",
            Self::ParametersChange(_) => "parametersChange",
            Self::AddTableCatalogSheet => "addTableCatalogSheet",
            Self::RemoveTableCatalogSheet { .. } => "removeTableCatalogSheet",
            Self::ExtraInputChange(_) => "extraInputChange",
            Self::ExtraEditorChange(_) => "extraEditorChange",
            Self::QueryChange { .. } => "queryChange",
            Self::DbSelected(_) => "dbSelected",
            Self::ConfigMethodChange(_) => "configMethodChange",
            Self::Fetched(_) => "fetched",
            Self::Reset => "reset",
        }
    }

    /// Check if this action replaces the whole state.
    pub fn replaces_state(&self) -> bool {
        matches!(
            self,
            Self::DbSelected(_) | Self::ConfigMethodChange(_) | Self::Fetched(_) | Self::Reset
        )
    }

    /// Parameter edit.
    pub fn parameter(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::ParametersChange(FieldInput::new(name, value))
    }

    /// Edit `field` ("name" or "value") of catalog entry `index`.
    pub fn catalog_field(index: usize, field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::ParametersChange(FieldInput::new(field, value).with_type(format!("catalog-{index}")))
    }

    /// Query text edit.
    pub fn query(value: impl Into<String>) -> Self {
        Self::QueryChange { value: value.into() }
    }
}
