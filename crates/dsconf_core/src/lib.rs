//! Core types and services for dsconf.
//!
//! This crate holds the connector-configuration state machine:
//!
//! - **error**: Error handling for decode, session and storage boundaries
//! - **models**: Configuration state, extra settings, records and actions
//! - **services**: Reducer, hydrate/commit codecs, record storage
//! - **session**: Editing sessions and the session registry
//! - **logging**: Structured logging setup

pub mod error;
pub mod logging;
pub mod models;
pub mod services;
pub mod session;


pub use error::ConfigError;
pub use models::{
    Action, CatalogEntry, ConfigurationMethod, ConfigurationState, EditableExtra, EditorInput,
    FieldInput, Parameters, RawRecord, SelectionPayload, WireExtra,
};
pub use services::{hydrate, reduce, serialize, RecordStore};
pub use session::{ConfigSession, SessionRegistry};
