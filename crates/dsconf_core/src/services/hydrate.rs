//! Hydrate path: persisted record to editable state.

use serde_json::{Map, Value};

use crate::models::{ConfigurationState, EditableExtra, RawRecord, QUERY_PARAMETER};
use crate::services::{catalog, extra, query};

/// Build editable state from a persisted record.
pub fn hydrate(record: RawRecord) -> ConfigurationState {
    hydrate_onto(None, record)
}

/// Build editable state from a persisted record, replacing `current`.
///
/// Only the engine can survive from `current`, and only when the record has
/// no `backend`. Malformed `extra` text never fails hydration. Mistyped keys
/// are dropped one by one; text that is not a JSON object is logged and
/// replaced by default extra settings.
pub fn hydrate_onto(current: Option<&ConfigurationState>, record: RawRecord) -> ConfigurationState {
    let RawRecord {
        engine,
        backend,
        configuration_method,
        parameters,
        extra: extra_text,
        encrypted_extra,
        mut fields,
    } = record;

    let (extra_json, engine_params_catalog) = match extra_text.as_deref().filter(|t| !t.is_empty())
    {
        Some(text) => match extra::decode_wire_extra(text) {
            Ok(wire) => {
                let catalog = wire.engine_params_catalog().cloned();
                (extra::to_editable(wire), catalog)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Malformed extra in record, using defaults");
                (EditableExtra::default(), None)
            }
        },
        None => (EditableExtra::default(), None),
    };

    let query_input = parameters
        .as_ref()
        .and_then(|params| params.get(QUERY_PARAMETER))
        .and_then(Value::as_object)
        .map(query::format_query)
        .unwrap_or_default();

    let dynamic_form = encrypted_extra.as_deref().is_some_and(|s| !s.is_empty())
        && configuration_method.as_ref().is_some_and(|m| m.is_dynamic_form());
    let catalog_list = dynamic_form
        .then(|| catalog::from_mapping(&engine_params_catalog.unwrap_or_else(Map::new)));

    let engine = backend
        .clone()
        .or_else(|| current.and_then(|state| state.engine.clone()))
        .or(engine);

    if let Some(backend) = backend {
        fields.insert("backend".to_string(), Value::String(backend));
    }
    if let Some(text) = extra_text {
        fields.insert("extra".to_string(), Value::String(text));
    }

    tracing::debug!(
        engine = ?engine,
        dynamic_form,
        catalog_entries = catalog_list.as_ref().map(Vec::len),
        "Hydrated configuration"
    );

    ConfigurationState {
        engine,
        configuration_method,
        encrypted_extra,
        parameters,
        catalog: catalog_list,
        extra_json: Some(extra_json),
        query_input: Some(query_input),
        fields,
    }
}
