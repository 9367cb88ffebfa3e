//! Data models for dsconf.
//!
//! - `configuration` - ConfigurationState, ConfigurationMethod, CatalogEntry
//! - `extra` - EditableExtra (editing form) and WireExtra (persisted form)
//! - `record` - RawRecord, SelectionPayload
//! - `action` - Action and its payloads

pub mod action;
pub mod configuration;
pub mod extra;
pub mod record;

pub use action::{Action, EditorInput, FieldInput};
pub use configuration::{
    CatalogEntry, ConfigurationMethod, ConfigurationState, Parameters, RejectedWrite,
    CATALOG_PARAMETER, QUERY_PARAMETER,
};
pub use extra::{EditableExtra, MetadataCacheTimeout, WireExtra};
pub use record::{RawRecord, SelectionPayload};
