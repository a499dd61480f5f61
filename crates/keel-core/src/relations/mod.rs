//! Relations inferred from logical references.
//!
//! [`scan`] walks a [`SchemaSnapshot`](crate::schema::SchemaSnapshot) and turns
//! every `references` column into a has-many/belongs-to pair, and every
//! junction table into a pair of many-to-many relations.
//! [`relation_query`] renders one relation as a SELECT that nests the related
//! rows as JSON.

mod scanner;
mod sql;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use scanner::scan;
pub use sql::{OWNER_KEY_PARAM, RelationQuery, relation_queries, relation_query};

/// Kind of an inferred relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    /// One owner row, many related rows pointing at it.
    HasMany,
    /// The owner row points at one related row.
    BelongsTo,
    /// Owner and related rows linked through a junction table.
    ManyToMany,
}

impl RelationKind {
    /// Returns the snake_case name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::HasMany => "has_many",
            Self::BelongsTo => "belongs_to",
            Self::ManyToMany => "many_to_many",
        }
    }

    /// Whether related rows are aggregated into an array.
    #[must_use]
    pub const fn is_collection(&self) -> bool {
        matches!(self, Self::HasMany | Self::ManyToMany)
    }
}

/// How the two tables of a relation are linked.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "via", rename_all = "snake_case")]
pub enum RelationVia {
    /// A reference column. It lives on the related table for has-many and on
    /// the owner table for belongs-to.
    Column {
        /// Reference column name.
        column: String,
    },
    /// A junction table.
    Junction {
        /// Junction table name.
        table: String,
        /// Junction column referencing the owner table.
        from_column: String,
        /// Junction column referencing the related table.
        to_column: String,
    },
}

/// An inferred association between two tables.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Relation {
    /// Relation kind.
    pub kind: RelationKind,
    /// Owner table.
    pub from_table: String,
    /// Related table.
    pub to_table: String,
    /// Link between the two.
    #[serde(flatten)]
    pub via: RelationVia,
}

impl Relation {
    /// Name of the nested payload.
    ///
    /// Has-many uses the related table name, belongs-to the reference column
    /// without its `_id` suffix, many-to-many the junction table name.
    #[must_use]
    pub fn name(&self) -> &str {
        match (&self.kind, &self.via) {
            (RelationKind::BelongsTo, RelationVia::Column { column }) => {
                column.strip_suffix("_id").unwrap_or(column)
            }
            (_, RelationVia::Junction { table, .. }) => table,
            _ => &self.to_table,
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.from_table, self.kind.as_str(), self.to_table)?;
        match &self.via {
            RelationVia::Column { column } => write!(f, " via {column}"),
            RelationVia::Junction { table, .. } => write!(f, " through {table}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn belongs_to(column: &str) -> Relation {
        Relation {
            kind: RelationKind::BelongsTo,
            from_table: "pets".into(),
            to_table: "categories".into(),
            via: RelationVia::Column {
                column: column.into(),
            },
        }
    }

    #[test]
    fn test_names() {
        assert_eq!(belongs_to("category_id").name(), "category");
        assert_eq!(belongs_to("category").name(), "category");

        let has_many = Relation {
            kind: RelationKind::HasMany,
            from_table: "categories".into(),
            to_table: "pets".into(),
            via: RelationVia::Column {
                column: "category_id".into(),
            },
        };
        assert_eq!(has_many.name(), "pets");
        assert_eq!(has_many.to_string(), "categories has_many pets via category_id");
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(belongs_to("category_id")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "kind": "belongs_to",
                "from_table": "pets",
                "to_table": "categories",
                "via": "column",
                "column": "category_id",
            })
        );
    }
}
