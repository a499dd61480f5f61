//! Column definitions.

use serde::{Deserialize, Serialize};

use super::types::{ColumnType, DefaultValue};

/// One table column.
///
/// A primary key column is never nullable; builders enforce this when the flag
/// is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Column name, unique within its table.
    pub name: String,
    /// Logical type (carries length/precision/scale where relevant).
    pub ty: ColumnType,
    /// Whether NULL is allowed.
    pub nullable: bool,
    /// Whether values are unique. Always backed by a single-column index.
    #[serde(default)]
    pub unique: bool,
    /// Whether this column is the primary key.
    #[serde(default)]
    pub primary_key: bool,
    /// Whether values are generated by the database.
    #[serde(default)]
    pub auto_increment: bool,
    /// Default value, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<DefaultValue>,
    /// Logical reference to another table. Metadata only; no constraint is emitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references: Option<String>,
}

impl Column {
    /// Creates a NOT NULL column with no other attributes.
    #[must_use]
    pub fn new(name: impl Into<String>, ty: ColumnType) -> Self {
        Self {
            name: name.into(),
            ty,
            nullable: false,
            unique: false,
            primary_key: false,
            auto_increment: false,
            default: None,
            references: None,
        }
    }
}
