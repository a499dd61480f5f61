//! PostgreSQL dialect.

use super::{Dialect, DialectKind, PlaceholderStyle, json_pairs};

/// PostgreSQL dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl PostgresDialect {
    /// Creates a new PostgreSQL dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for PostgresDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::Postgres
    }

    fn placeholder_style(&self) -> PlaceholderStyle {
        PlaceholderStyle::Dollar
    }

    fn json_object(&self, fields: &[(String, String)]) -> String {
        format!("JSON_BUILD_OBJECT({})", json_pairs(self, fields))
    }

    fn json_array_agg(&self, element: &str, marker: &str) -> String {
        format!("COALESCE(JSON_AGG({element}) FILTER (WHERE {marker} IS NOT NULL), '[]'::json)")
    }
}
