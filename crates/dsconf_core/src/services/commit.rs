//! Commit path: editable state to persisted record.

use serde::de::Error as _;
use serde_json::{Map, Value};

use crate::error::ConfigError;
use crate::models::configuration::text_slot;
use crate::models::extra::ENGINE_PARAMS;
use crate::models::{ConfigurationState, RawRecord, CATALOG_PARAMETER, QUERY_PARAMETER};
use crate::services::{catalog, extra, query};

/// Produce the wire record for `state`.
///
/// - `parameters.query` is re-derived from `query_input`
/// - `parameters.catalog` is projected from the catalog list when one is in use,
///   and mirrored into `extra.engine_params.catalog`
/// - `extra` is encoded from `extra_json`; without it, any pass-through `extra`
///   text is kept
///
/// Fails when `metadata_params` or `engine_params` holds invalid JSON, or when
/// a catalog is in use and `engine_params` is not a JSON object.
pub fn serialize(state: &ConfigurationState) -> Result<RawRecord, ConfigError> {
    let mut fields = state.fields.clone();
    let backend = take_text(&mut fields, "backend");
    let passthrough_extra = take_text(&mut fields, "extra");

    let mut parameters = state.parameters.clone();
    if let Some(text) = state.query_input.as_deref() {
        if !text.is_empty() || parameters.is_some() {
            parameters
                .get_or_insert_with(Map::new)
                .insert(QUERY_PARAMETER.to_string(), Value::Object(query::query_mapping(text)));
        }
    }

    let catalog_projection = state.catalog.as_deref().map(catalog::project);
    if let Some(projection) = &catalog_projection {
        parameters
            .get_or_insert_with(Map::new)
            .insert(CATALOG_PARAMETER.to_string(), Value::Object(projection.clone()));
    }

    let extra_text = match (&state.extra_json, catalog_projection) {
        (None, None) => passthrough_extra,
        (editable, projection) => {
            let mut wire = extra::to_wire(&editable.clone().unwrap_or_default())?;
            if let Some(projection) = projection {
                match wire.engine_params.as_mut() {
                    Some(Value::Object(engine_params)) => {
                        engine_params
                            .insert(CATALOG_PARAMETER.to_string(), Value::Object(projection));
                    }
                    _ => {
                        return Err(ConfigError::invalid_extra_field(
                            ENGINE_PARAMS,
                            serde_json::Error::custom("expected a JSON object to hold the catalog"),
                        ))
                    }
                }
            }
            Some(extra::encode_wire_extra(&wire)?)
        }
    };

    tracing::debug!(
        id = ?state.id(),
        engine = ?state.engine,
        has_catalog = state.catalog.is_some(),
        "Serialized configuration"
    );

    Ok(RawRecord {
        engine: state.engine.clone(),
        backend,
        configuration_method: state.configuration_method.clone(),
        parameters,
        extra: extra_text,
        encrypted_extra: state.encrypted_extra.clone(),
        fields,
    })
}

fn take_text(fields: &mut Map<String, Value>, name: &str) -> Option<String> {
    let value = fields.remove(name)?;
    match text_slot(name, value) {
        Ok(text) => text,
        Err(rejected) => {
            tracing::warn!(field = name, found = rejected.found, "Dropping non-text field");
            None
        }
    }
}
