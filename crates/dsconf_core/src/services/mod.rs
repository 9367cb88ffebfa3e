//! Services for dsconf.
//!
//! The pure transition logic and its boundaries:
//! - `extra` - conversions between editable and persisted extra settings
//! - `catalog` - catalog list edits and mapping projection
//! - `query` - query text transcoding
//! - `reducer` - the configuration reducer
//! - `hydrate` - persisted record to editable state
//! - `commit` - editable state to persisted record
//! - `storage` - local SQLite record store

pub mod catalog;
pub mod commit;
pub mod extra;
pub mod hydrate;
pub mod query;
pub mod reducer;
pub mod storage;

pub use commit::serialize;
pub use extra::{hydrate_extra, serialize_extra};
pub use hydrate::{hydrate, hydrate_onto};
pub use query::{format_query, parse_query};
pub use reducer::reduce;
pub use storage::{RecordStore, RecordSummary};
