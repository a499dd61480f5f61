//! In-memory relational schema model.
//!
//! These types are plain data. They are produced by the builders in
//! [`crate::migrations`] and consumed by the DDL emitter, the relation
//! scanner and downstream generators.

mod column;
mod index;
mod snapshot;
mod table;
mod types;

pub use column::Column;
pub use index::{Index, MAX_IDENTIFIER_LEN, index_name};
pub use snapshot::SchemaSnapshot;
pub use table::{LIFECYCLE_COLUMNS, Table};
pub use types::{ColumnType, DefaultValue};
