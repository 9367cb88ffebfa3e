//! Configuration reducer.
//!
//! `reduce` is pure: it takes the current state by reference, never touches
//! it, and returns the next state. It performs no I/O and never fails; a
//! write that does not fit its typed slot is logged and dropped.

use serde_json::Value;

use crate::models::configuration::set_or_remove;
use crate::models::extra::{
    SCHEMAS_ALLOWED_FOR_FILE_UPLOAD, SCHEMA_CACHE_TIMEOUT, TABLE_CACHE_TIMEOUT,
};
use crate::models::{
    Action, ConfigurationState, EditableExtra, EditorInput, FieldInput, RejectedWrite,
    CATALOG_PARAMETER, QUERY_PARAMETER,
};
use crate::services::catalog::EntryEdit;
use crate::services::{catalog, hydrate, query};

/// Apply one action to the current state.
///
/// `None` is the absent state: before the first selection and after `Reset`.
pub fn reduce(state: Option<&ConfigurationState>, action: Action) -> Option<ConfigurationState> {
    tracing::debug!(action = action.kind(), has_state = state.is_some(), "Reducing action");

    let mut next = state.cloned().unwrap_or_default();
    let result = match action {
        Action::InputChange(input) => next.set_field(&input.name, input.resolved_value()),
        Action::TextChange(input) => next.set_field(&input.name, input.text_value()),
        Action::EditorChange(EditorInput { name, json }) => next.set_field(&name, json),
        Action::ParametersChange(input) => {
            change_parameter(&mut next, input);
            Ok(())
        }
        Action::AddTableCatalogSheet => {
            catalog::append_blank(next.catalog.get_or_insert_with(Vec::new));
            Ok(())
        }
        Action::RemoveTableCatalogSheet { index } => {
            if let Some(list) = next.catalog.as_mut() {
                if catalog::remove_at(list, index).is_none() {
                    tracing::debug!(index, len = list.len(), "Catalog index out of range");
                }
            }
            Ok(())
        }
        Action::ExtraInputChange(input) => change_extra_input(&mut next, input),
        Action::ExtraEditorChange(EditorInput { name, json }) => {
            next.extra_json.get_or_insert_with(EditableExtra::default).set_field(&name, json)
        }
        Action::QueryChange { value } => {
            next.parameters
                .get_or_insert_with(Default::default)
                .insert(QUERY_PARAMETER.to_string(), Value::Object(query::query_mapping(&value)));
            next.query_input = Some(value);
            Ok(())
        }
        Action::DbSelected(payload) | Action::ConfigMethodChange(payload) => {
            return Some(ConfigurationState::from_selection(payload));
        }
        Action::Fetched(record) => return Some(hydrate::hydrate_onto(state, record)),
        Action::Reset => return None,
    };

    match result {
        Ok(()) => Some(next),
        Err(rejected) => {
            log_rejected(&rejected);
            state.cloned()
        }
    }
}

/// Plain parameter write, or a catalog entry edit.
///
/// The catalog branch applies only when a catalog list exists and the input
/// type is `catalog-<n>`. It rewrites `parameters.catalog` from the full list
/// and keeps every other parameter.
fn change_parameter(next: &mut ConfigurationState, input: FieldInput) {
    let target = input.input_type.as_deref().and_then(catalog::catalog_target);

    match (next.catalog.as_mut(), target) {
        (Some(list), Some(index)) => {
            match index {
                Some(index) => {
                    let value = input.value.unwrap_or_default();
                    match catalog::set_entry_field(list, index, &input.name, value) {
                        EntryEdit::Applied => {}
                        EntryEdit::UnknownField => tracing::warn!(
                            field = %input.name,
                            "Ignoring unknown catalog entry field"
                        ),
                        EntryEdit::OutOfRange => tracing::warn!(
                            index,
                            max = catalog::MAX_CATALOG_ENTRIES,
                            "Ignoring catalog edit past the list limit"
                        ),
                    }
                }
                None => tracing::warn!(
                    input_type = ?input.input_type,
                    "Catalog input type has no valid index"
                ),
            }

            let projection = catalog::project(list);
            next.parameters
                .get_or_insert_with(Default::default)
                .insert(CATALOG_PARAMETER.to_string(), Value::Object(projection));
        }
        _ => {
            let value = input.text_value();
            set_or_remove(next.parameters.get_or_insert_with(Default::default), &input.name, value);
        }
    }
}

fn change_extra_input(next: &mut ConfigurationState, input: FieldInput) -> Result<(), RejectedWrite> {
    let extra = next.extra_json.get_or_insert_with(EditableExtra::default);

    match input.name.as_str() {
        SCHEMA_CACHE_TIMEOUT | TABLE_CACHE_TIMEOUT => {
            extra.set_cache_timeout(&input.name, input.text_value());
            Ok(())
        }
        SCHEMAS_ALLOWED_FOR_FILE_UPLOAD => {
            extra.set_schemas_from_text(input.value.as_deref());
            Ok(())
        }
        _ => extra.set_field(&input.name, input.resolved_value()),
    }
}

fn log_rejected(rejected: &RejectedWrite) {
    tracing::warn!(
        field = %rejected.field,
        found = rejected.found,
        reason = %rejected.reason,
        "Rejected field write"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CatalogEntry, ConfigurationMethod, RawRecord, SelectionPayload};
    use serde_json::json;

    fn state_with_catalog(entries: &[(&str, &str)]) -> ConfigurationState {
        ConfigurationState {
            catalog: Some(entries.iter().map(|(n, v)| CatalogEntry::new(*n, *v)).collect()),
            ..ConfigurationState::default()
        }
    }

    fn apply(state: Option<ConfigurationState>, actions: Vec<Action>) -> Option<ConfigurationState> {
        actions.into_iter().fold(state, |state, action| reduce(state.as_ref(), action))
    }

    // ========== Top-level writes ==========

    #[test]
    fn test_input_change_text_and_checkbox() {
        let state = apply(
            None,
            vec![
                Action::InputChange(FieldInput::new("database_name", "warehouse")),
                Action::InputChange(FieldInput::checkbox("expose_in_sqllab", true)),
            ],
        )
        .unwrap();

        assert_eq!(state.database_name(), Some("warehouse"));
        assert_eq!(state.fields.get("expose_in_sqllab"), Some(&json!(true)));
    }

    #[test]
    fn test_input_change_checkbox_ignores_value() {
        let input = FieldInput {
            name: "allow_dml".into(),
            value: Some("on".into()),
            input_type: Some("checkbox".into()),
            checked: Some(false),
        };
        let state = reduce(None, Action::InputChange(input)).unwrap();
        assert_eq!(state.fields.get("allow_dml"), Some(&json!(false)));
    }

    #[test]
    fn test_text_change_overwrites() {
        let state = apply(
            None,
            vec![
                Action::TextChange(FieldInput::new("engine", "mysql")),
                Action::TextChange(FieldInput::new("engine", "postgresql")),
            ],
        )
        .unwrap();
        assert_eq!(state.engine.as_deref(), Some("postgresql"));
    }

    #[test]
    fn test_editor_change_structured_value() {
        let state = reduce(
            None,
            Action::EditorChange(EditorInput::new("masked_encrypted_extra", json!({"k": "v"}))),
        )
        .unwrap();
        assert_eq!(state.fields.get("masked_encrypted_extra"), Some(&json!({"k": "v"})));
    }

    #[test]
    fn test_rejected_write_keeps_prior_state() {
        let prior = reduce(None, Action::TextChange(FieldInput::new("engine", "mysql")));
        let next = reduce(
            prior.as_ref(),
            Action::EditorChange(EditorInput::new("engine", json!(["not", "text"]))),
        );
        assert_eq!(next, prior);
    }

    // ========== Parameters and catalog ==========

    #[test]
    fn test_parameters_change_plain() {
        let state = apply(
            None,
            vec![Action::parameter("host", "db.local"), Action::parameter("port", "5432")],
        )
        .unwrap();
        assert_eq!(state.parameter("host"), Some(&json!("db.local")));
        assert_eq!(state.parameter("port"), Some(&json!("5432")));
    }

    #[test]
    fn test_catalog_type_without_catalog_list_is_plain_write() {
        let state = reduce(None, Action::catalog_field(0, "value", "x")).unwrap();
        assert_eq!(state.parameter("value"), Some(&json!("x")));
        assert!(state.catalog.is_none());
    }

    #[test]
    fn test_catalog_edit_preserves_sibling_parameters() {
        let mut state = state_with_catalog(&[("", "")]);
        state.parameters = Some(
            json!({"service_account_info": "{}", "query": {"a": "1"}})
                .as_object()
                .cloned()
                .unwrap(),
        );

        let next = reduce(Some(&state), Action::catalog_field(0, "value", "x")).unwrap();

        assert_eq!(next.catalog, Some(vec![CatalogEntry::new("", "x")]));
        assert_eq!(next.parameter("catalog"), Some(&json!({"": "x"})));
        assert_eq!(next.parameter("service_account_info"), Some(&json!("{}")));
        assert_eq!(next.parameter("query"), Some(&json!({"a": "1"})));
    }

    #[test]
    fn test_catalog_edit_past_end_creates_entry() {
        let state = state_with_catalog(&[("a", "1")]);
        let next = reduce(Some(&state), Action::catalog_field(2, "name", "late")).unwrap();

        assert_eq!(
            next.catalog,
            Some(vec![
                CatalogEntry::new("a", "1"),
                CatalogEntry::default(),
                CatalogEntry::new("late", ""),
            ])
        );
        assert_eq!(next.parameter("catalog"), Some(&json!({"a": "1", "": "", "late": ""})));
    }

    #[test]
    fn test_catalog_edit_bad_index_only_reprojects() {
        let state = state_with_catalog(&[("a", "1")]);
        let input = FieldInput::new("value", "x").with_type("catalog-abc");
        let next = reduce(Some(&state), Action::ParametersChange(input)).unwrap();

        assert_eq!(next.catalog, state.catalog);
        assert_eq!(next.parameter("catalog"), Some(&json!({"a": "1"})));
    }

    #[test]
    fn test_catalog_edit_with_huge_index_only_reprojects() {
        let state = state_with_catalog(&[("a", "1")]);
        for index in [usize::MAX, 1_000_000_000_000] {
            let next = reduce(Some(&state), Action::catalog_field(index, "value", "x")).unwrap();
            assert_eq!(next.catalog, state.catalog);
            assert_eq!(next.parameter("catalog"), Some(&json!({"a": "1"})));
        }
    }

    #[test]
    fn test_add_and_remove_catalog_sheets() {
        let state = apply(None, vec![Action::AddTableCatalogSheet, Action::AddTableCatalogSheet])
            .unwrap();
        assert_eq!(state.catalog, Some(vec![CatalogEntry::default(), CatalogEntry::default()]));

        let state = state_with_catalog(&[("a", "1"), ("b", "2")]);
        let next = reduce(Some(&state), Action::RemoveTableCatalogSheet { index: 0 }).unwrap();
        assert_eq!(next.catalog, Some(vec![CatalogEntry::new("b", "2")]));

        let unchanged = reduce(Some(&next), Action::RemoveTableCatalogSheet { index: 4 }).unwrap();
        assert_eq!(unchanged, next);
    }

    #[test]
    fn test_remove_without_catalog_is_noop() {
        let state = ConfigurationState::default();
        let next = reduce(Some(&state), Action::RemoveTableCatalogSheet { index: 0 }).unwrap();
        assert_eq!(next, state);
    }

    #[test]
    fn test_edit_observes_preceding_add() {
        let state = apply(
            Some(ConfigurationState::default()),
            vec![
                Action::AddTableCatalogSheet,
                Action::catalog_field(0, "name", "sales"),
                Action::AddTableCatalogSheet,
                Action::catalog_field(1, "name", "costs"),
                Action::catalog_field(1, "value", "https://sheet/2"),
                Action::RemoveTableCatalogSheet { index: 0 },
                Action::catalog_field(0, "value", "https://sheet/3"),
            ],
        )
        .unwrap();

        assert_eq!(state.catalog, Some(vec![CatalogEntry::new("costs", "https://sheet/3")]));
        assert_eq!(state.parameter("catalog"), Some(&json!({"costs": "https://sheet/3"})));
    }

    // ========== Extra ==========

    #[test]
    fn test_extra_input_cache_timeouts() {
        let state = apply(
            None,
            vec![
                Action::ExtraInputChange(FieldInput::new("schema_cache_timeout", "600")),
                Action::ExtraInputChange(FieldInput::new("table_cache_timeout", "30")),
            ],
        )
        .unwrap();

        let timeout = state.extra_json.unwrap().metadata_cache_timeout.unwrap();
        assert_eq!(timeout.schema_cache_timeout, Some(json!("600")));
        assert_eq!(timeout.table_cache_timeout, Some(json!("30")));
    }

    #[test]
    fn test_extra_input_schema_list_replaced_wholesale() {
        let state = apply(
            None,
            vec![
                Action::ExtraInputChange(FieldInput::new("schemas_allowed_for_file_upload", "x,y")),
                Action::ExtraInputChange(FieldInput::new(
                    "schemas_allowed_for_file_upload",
                    "a,b,,c",
                )),
            ],
        )
        .unwrap();

        assert_eq!(
            state.extra_json.unwrap().schemas_allowed_for_file_upload,
            Some(vec!["a".into(), "b".into(), String::new(), "c".into()])
        );
    }

    #[test]
    fn test_extra_input_checkbox_and_text() {
        let state = apply(
            None,
            vec![
                Action::ExtraInputChange(FieldInput::checkbox(
                    "allows_virtual_table_explore",
                    false,
                )),
                Action::ExtraInputChange(FieldInput::new("cancel_query_on_windows_unload", "1")),
            ],
        )
        .unwrap();

        let extra = state.extra_json.unwrap();
        assert!(!extra.allows_virtual_table_explore);
        assert_eq!(extra.other.get("cancel_query_on_windows_unload"), Some(&json!("1")));
    }

    #[test]
    fn test_extra_editor_change_keeps_text() {
        let state = reduce(
            None,
            Action::ExtraEditorChange(EditorInput::new("metadata_params", json!("{\"a\": 1}"))),
        )
        .unwrap();
        assert_eq!(state.extra_json.unwrap().metadata_params.as_deref(), Some("{\"a\": 1}"));
    }

    // ========== Query ==========

    #[test]
    fn test_query_change_sets_mapping_and_text() {
        let mut state = ConfigurationState::default();
        state.parameters = Some(json!({"host": "h"}).as_object().cloned().unwrap());

        let next = reduce(Some(&state), Action::query("a=1&b=2")).unwrap();

        assert_eq!(next.query_input.as_deref(), Some("a=1&b=2"));
        assert_eq!(next.parameter("query"), Some(&json!({"a": "1", "b": "2"})));
        assert_eq!(next.parameter("host"), Some(&json!("h")));
    }

    #[test]
    fn test_query_change_replaces_previous_mapping() {
        let state = apply(None, vec![Action::query("a=1&b=2"), Action::query("c=3")]).unwrap();
        assert_eq!(state.parameter("query"), Some(&json!({"c": "3"})));
    }

    // ========== Whole-state transitions ==========

    #[test]
    fn test_db_selected_discards_edits() {
        let state = apply(
            None,
            vec![
                Action::parameter("host", "h"),
                Action::AddTableCatalogSheet,
                Action::DbSelected(SelectionPayload::new(
                    "gsheets",
                    ConfigurationMethod::DynamicForm,
                )),
            ],
        )
        .unwrap();

        assert_eq!(state.engine.as_deref(), Some("gsheets"));
        assert!(state.parameters.is_none());
        assert!(state.catalog.is_none());
        assert!(state.extra_json.unwrap().allows_virtual_table_explore);
    }

    #[test]
    fn test_config_method_change_replaces_state() {
        let state = apply(
            None,
            vec![
                Action::query("x=1"),
                Action::ConfigMethodChange(SelectionPayload::new(
                    "postgresql",
                    ConfigurationMethod::SqlalchemyForm,
                )),
            ],
        )
        .unwrap();

        assert!(state.query_input.is_none());
        assert_eq!(state.configuration_method, Some(ConfigurationMethod::SqlalchemyForm));
    }

    #[test]
    fn test_fetched_retains_engine_without_backend() {
        let prior = reduce(None, Action::TextChange(FieldInput::new("engine", "mysql")));
        let next = reduce(prior.as_ref(), Action::Fetched(RawRecord::default())).unwrap();
        assert_eq!(next.engine.as_deref(), Some("mysql"));
    }

    #[test]
    fn test_reset_yields_absent() {
        let state = reduce(None, Action::parameter("host", "h"));
        assert!(state.is_some());
        assert!(reduce(state.as_ref(), Action::Reset).is_none());
        assert!(reduce(None, Action::Reset).is_none());
    }

    #[test]
    fn test_reduce_does_not_mutate_input() {
        let state = state_with_catalog(&[("a", "1"), ("b", "2")]);
        let before = state.clone();

        let _ = reduce(Some(&state), Action::RemoveTableCatalogSheet { index: 0 });
        let _ = reduce(Some(&state), Action::catalog_field(0, "value", "z"));

        assert_eq!(state, before);
    }
}
