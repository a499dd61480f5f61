//! MySQL dialect.

use super::{Dialect, DialectKind, PlaceholderStyle, json_pairs};

/// MySQL dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlDialect;

impl MySqlDialect {
    /// Creates a new MySQL dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for MySqlDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::MySql
    }

    fn identifier_quote(&self) -> char {
        '`'
    }

    fn placeholder_style(&self) -> PlaceholderStyle {
        PlaceholderStyle::Sequential
    }

    fn string_literal(&self, value: &str) -> String {
        // Backslash is an escape character unless NO_BACKSLASH_ESCAPES is set.
        format!("'{}'", value.replace('\\', "\\\\").replace('\'', "''"))
    }

    fn concat(&self, left: &str, right: &str) -> String {
        format!("CONCAT({left}, {right})")
    }

    fn unbounded_limit(&self) -> Option<&'static str> {
        Some("18446744073709551615")
    }

    fn json_object(&self, fields: &[(String, String)]) -> String {
        format!("JSON_OBJECT({})", json_pairs(self, fields))
    }

    fn json_array_agg(&self, element: &str, marker: &str) -> String {
        // JSON_ARRAYAGG has no FILTER clause. Relation joins only produce a
        // NULL marker for an owner with no related rows at all, so a group
        // is either one placeholder or only real rows.
        format!("IF(COUNT({marker}) = 0, JSON_ARRAY(), JSON_ARRAYAGG({element}))")
    }
}
