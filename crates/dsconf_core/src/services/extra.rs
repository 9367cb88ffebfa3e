//! Extra settings codec.
//!
//! The only conversions between [`WireExtra`] (persisted, nested objects) and
//! [`EditableExtra`] (editing, JSON text for `metadata_params` and
//! `engine_params`).

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::ConfigError;
use crate::models::extra::{ENGINE_PARAMS, METADATA_PARAMS};
use crate::models::{EditableExtra, WireExtra};

/// Decode persisted extra text.
///
/// Fails only when the text is not a JSON object. Recognized keys holding the
/// wrong type are dropped with a warning and every other key is kept.
pub fn decode_wire_extra(text: &str) -> Result<WireExtra, ConfigError> {
    let value: Value = serde_json::from_str(text).map_err(ConfigError::extra_decode)?;
    match WireExtra::deserialize(&value) {
        Ok(wire) => Ok(wire),
        Err(e) => match value {
            Value::Object(settings) => Ok(decode_fitting_keys(settings)),
            _ => Err(ConfigError::extra_decode(e)),
        },
    }
}

fn decode_fitting_keys(settings: Map<String, Value>) -> WireExtra {
    let mut kept = Map::new();
    for (key, value) in settings {
        let single = Value::Object(Map::from_iter([(key.clone(), value)]));
        match WireExtra::deserialize(&single) {
            Ok(_) => {
                if let Value::Object(entry) = single {
                    kept.extend(entry);
                }
            }
            Err(e) => tracing::warn!(key = %key, error = %e, "Dropping mistyped extra setting"),
        }
    }
    WireExtra::deserialize(&Value::Object(kept)).unwrap_or_default()
}

/// Convert the persisted form into the editing form.
///
/// Nested params are re-encoded to JSON text; the schema list is copied as is.
pub fn to_editable(wire: WireExtra) -> EditableExtra {
    EditableExtra {
        allows_virtual_table_explore: wire.allows_virtual_table_explore.unwrap_or(true),
        metadata_cache_timeout: wire.metadata_cache_timeout,
        schemas_allowed_for_file_upload: wire.schemas_allowed_for_file_upload,
        metadata_params: wire.metadata_params.map(|params| params.to_string()),
        engine_params: wire.engine_params.map(|params| params.to_string()),
        other: wire.other,
    }
}

/// Decode persisted extra text straight into the editing form.
pub fn hydrate_extra(text: &str) -> Result<EditableExtra, ConfigError> {
    decode_wire_extra(text).map(to_editable)
}

/// Convert the editing form into the persisted form.
///
/// Params text is parsed (absent or empty text becomes `{}`) and empty schema
/// entries are dropped.
pub fn to_wire(extra: &EditableExtra) -> Result<WireExtra, ConfigError> {
    let schemas = extra
        .schemas_allowed_for_file_upload
        .iter()
        .flatten()
        .filter(|schema| !schema.is_empty())
        .cloned()
        .collect();

    Ok(WireExtra {
        allows_virtual_table_explore: Some(extra.allows_virtual_table_explore),
        metadata_cache_timeout: extra.metadata_cache_timeout.clone(),
        schemas_allowed_for_file_upload: Some(schemas),
        metadata_params: Some(parse_params(METADATA_PARAMS, extra.metadata_params.as_deref())?),
        engine_params: Some(parse_params(ENGINE_PARAMS, extra.engine_params.as_deref())?),
        other: extra.other.clone(),
    })
}

/// Encode the persisted form as text.
pub fn encode_wire_extra(wire: &WireExtra) -> Result<String, ConfigError> {
    serde_json::to_string(wire)
        .map_err(|e| ConfigError::internal(format!("Failed to encode extra: {e}")))
}

/// Produce the persisted extra text for the editing form.
pub fn serialize_extra(extra: &EditableExtra) -> Result<String, ConfigError> {
    encode_wire_extra(&to_wire(extra)?)
}

fn parse_params(field: &str, text: Option<&str>) -> Result<Value, ConfigError> {
    match text.map(str::trim) {
        None | Some("") => Ok(Value::Object(Map::new())),
        Some(text) => {
            serde_json::from_str(text).map_err(|e| ConfigError::invalid_extra_field(field, e))
        }
    }
}
