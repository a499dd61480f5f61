//! SQLite dialect.

use super::{Dialect, DialectKind, PlaceholderStyle, json_pairs};

/// SQLite dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl SqliteDialect {
    /// Creates a new SQLite dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for SqliteDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::Sqlite
    }

    fn placeholder_style(&self) -> PlaceholderStyle {
        PlaceholderStyle::Numbered
    }

    fn bool_literal(&self, value: bool) -> &'static str {
        // SQLite stores booleans as 0/1
        if value {
            "1"
        } else {
            "0"
        }
    }

    fn unbounded_limit(&self) -> Option<&'static str> {
        Some("-1")
    }

    fn json_object(&self, fields: &[(String, String)]) -> String {
        format!("json_object({})", json_pairs(self, fields))
    }

    fn json_array_agg(&self, element: &str, marker: &str) -> String {
        format!(
            "COALESCE(json_group_array({element}) FILTER (WHERE {marker} IS NOT NULL), json_array())"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlite_surface() {
        let dialect = SqliteDialect::new();
        assert_eq!(dialect.placeholder_style(), PlaceholderStyle::Numbered);
        assert_eq!(dialect.bool_literal(true), "1");
        assert_eq!(dialect.unbounded_limit(), Some("-1"));
        assert_eq!(
            dialect.json_object(&[("name".into(), "\"p\".\"name\"".into())]),
            "json_object('name', \"p\".\"name\")"
        );
    }
}
