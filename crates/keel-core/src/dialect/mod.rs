//! SQL dialect support.
//!
//! The three supported databases differ in identifier quoting, placeholder
//! syntax, literal spelling and JSON functions. [`Dialect`] captures those
//! surface differences; DDL generation lives in
//! [`MigrationDialect`](crate::migrations::MigrationDialect), which builds on it.

mod mysql;
mod postgres;
mod sqlite;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use mysql::MySqlDialect;
pub use postgres::PostgresDialect;
pub use sqlite::SqliteDialect;

use crate::error::Error;
use crate::migrations::MigrationDialect;

/// How bind parameters are spelled in compiled SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceholderStyle {
    /// `$1`, `$2`, ... numbered by declaration order (PostgreSQL).
    Dollar,
    /// `?1`, `?2`, ... numbered by declaration order (SQLite).
    Numbered,
    /// `?` per occurrence; the caller binds in occurrence order (MySQL).
    Sequential,
    /// `:name` per occurrence.
    Named,
}

impl PlaceholderStyle {
    /// Renders the placeholder for a parameter.
    ///
    /// `position` is the 1-based index of the parameter in the declared list.
    #[must_use]
    pub fn render(self, position: usize, name: &str) -> String {
        match self {
            Self::Dollar => format!("${position}"),
            Self::Numbered => format!("?{position}"),
            Self::Sequential => String::from("?"),
            Self::Named => format!(":{name}"),
        }
    }
}

/// Surface syntax of one SQL dialect.
pub trait Dialect: Send + Sync {
    /// Which dialect this is.
    fn kind(&self) -> DialectKind;

    /// Returns the dialect name.
    fn name(&self) -> &'static str {
        self.kind().as_str()
    }

    /// Returns the identifier quote character.
    fn identifier_quote(&self) -> char {
        '"'
    }

    /// Quotes an identifier, doubling any embedded quote character.
    fn quote_identifier(&self, name: &str) -> String {
        let q = self.identifier_quote();
        let mut quoted = String::with_capacity(name.len() + 2);
        quoted.push(q);
        for ch in name.chars() {
            if ch == q {
                quoted.push(q);
            }
            quoted.push(ch);
        }
        quoted.push(q);
        quoted
    }

    /// Quotes a `table.column` pair.
    fn quote_qualified(&self, table: &str, column: &str) -> String {
        format!(
            "{}.{}",
            self.quote_identifier(table),
            self.quote_identifier(column)
        )
    }

    /// Default placeholder style for this dialect's drivers.
    fn placeholder_style(&self) -> PlaceholderStyle;

    /// Renders a string literal.
    fn string_literal(&self, value: &str) -> String {
        format!("'{}'", value.replace('\'', "''"))
    }

    /// Renders a boolean literal.
    fn bool_literal(&self, value: bool) -> &'static str {
        if value {
            "TRUE"
        } else {
            "FALSE"
        }
    }

    /// Renders string concatenation of two already-rendered operands.
    fn concat(&self, left: &str, right: &str) -> String {
        format!("{left} || {right}")
    }

    /// LIMIT value meaning "no limit", for dialects that need one before OFFSET.
    fn unbounded_limit(&self) -> Option<&'static str> {
        None
    }

    /// Builds a JSON object from `(key, rendered expression)` pairs.
    fn json_object(&self, fields: &[(String, String)]) -> String;

    /// Aggregates `element` into a JSON array, skipping rows where `marker` is NULL.
    ///
    /// Groups whose rows all have a NULL marker yield an empty array.
    fn json_array_agg(&self, element: &str, marker: &str) -> String;

    /// Renders `element` as a JSON object, or NULL when `marker` is NULL.
    fn json_object_or_null(&self, element: &str, marker: &str) -> String {
        format!("CASE WHEN {marker} IS NULL THEN NULL ELSE {element} END")
    }
}

/// Renders the `'key', value` argument list shared by the JSON object builders.
pub(crate) fn json_pairs(dialect: &(impl Dialect + ?Sized), fields: &[(String, String)]) -> String {
    fields
        .iter()
        .map(|(key, value)| format!("{}, {value}", dialect.string_literal(key)))
        .collect::<Vec<_>>()
        .join(", ")
}

static POSTGRES: PostgresDialect = PostgresDialect;
static MYSQL: MySqlDialect = MySqlDialect;
static SQLITE: SqliteDialect = SqliteDialect;

/// The supported dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialectKind {
    /// PostgreSQL.
    Postgres,
    /// MySQL / MariaDB.
    MySql,
    /// SQLite.
    Sqlite,
}

impl DialectKind {
    /// All dialects, in a fixed order.
    pub const ALL: [Self; 3] = [Self::Postgres, Self::MySql, Self::Sqlite];

    /// Returns the canonical name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::MySql => "mysql",
            Self::Sqlite => "sqlite",
        }
    }

    /// Returns the dialect implementation.
    #[must_use]
    pub fn dialect(self) -> &'static dyn MigrationDialect {
        match self {
            Self::Postgres => &POSTGRES,
            Self::MySql => &MYSQL,
            Self::Sqlite => &SQLITE,
        }
    }

    /// Infers the dialect from a database URL scheme.
    pub fn from_url(url: &str) -> Result<Self, Error> {
        let scheme = url.split(':').next().unwrap_or_default();
        match scheme {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "mysql" | "mariadb" => Ok(Self::MySql),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(Error::UnknownDialect(other.to_string())),
        }
    }
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DialectKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            "mysql" | "mariadb" => Ok(Self::MySql),
            "sqlite" | "sqlite3" => Ok(Self::Sqlite),
            _ => Err(Error::UnknownDialect(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dialect_names() {
        assert_eq!("postgres".parse::<DialectKind>().unwrap(), DialectKind::Postgres);
        assert_eq!("MySQL".parse::<DialectKind>().unwrap(), DialectKind::MySql);
        assert_eq!("sqlite3".parse::<DialectKind>().unwrap(), DialectKind::Sqlite);
        assert!(matches!(
            "oracle".parse::<DialectKind>(),
            Err(Error::UnknownDialect(name)) if name == "oracle"
        ));
    }

    #[test]
    fn test_from_url() {
        assert_eq!(
            DialectKind::from_url("postgres://localhost/app").unwrap(),
            DialectKind::Postgres
        );
        assert_eq!(
            DialectKind::from_url("mysql://root@localhost/app").unwrap(),
            DialectKind::MySql
        );
        assert_eq!(
            DialectKind::from_url("sqlite::memory:").unwrap(),
            DialectKind::Sqlite
        );
        assert!(DialectKind::from_url("mssql://host/db").is_err());
    }

    #[test]
    fn test_quote_identifier_escapes_quotes() {
        let pg = DialectKind::Postgres.dialect();
        assert_eq!(pg.quote_identifier("users"), "\"users\"");
        assert_eq!(pg.quote_identifier("we\"ird"), "\"we\"\"ird\"");

        let my = DialectKind::MySql.dialect();
        assert_eq!(my.quote_identifier("users"), "`users`");
        assert_eq!(my.quote_identifier("we`ird"), "`we``ird`");
    }

    #[test]
    fn test_placeholder_rendering() {
        assert_eq!(PlaceholderStyle::Dollar.render(2, "id"), "$2");
        assert_eq!(PlaceholderStyle::Numbered.render(2, "id"), "?2");
        assert_eq!(PlaceholderStyle::Sequential.render(2, "id"), "?");
        assert_eq!(PlaceholderStyle::Named.render(2, "id"), ":id");
    }
}
