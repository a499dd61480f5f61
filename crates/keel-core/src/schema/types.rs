//! Logical column types and default values.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Portable column type. Each dialect maps it to a concrete SQL type name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ColumnType {
    /// 32-bit integer.
    Integer,
    /// 64-bit integer.
    BigInt,
    /// Exact decimal with precision and scale.
    Decimal {
        /// Total digits.
        precision: u8,
        /// Digits after the decimal point.
        scale: u8,
    },
    /// Double precision float.
    Float,
    /// Boolean.
    Bool,
    /// Variable-length string with a maximum length.
    Varchar {
        /// Maximum length in characters.
        length: u32,
    },
    /// Unbounded text.
    Text,
    /// Date and time without time zone.
    DateTime,
    /// Point in time.
    Timestamp,
    /// Binary large object.
    Binary,
    /// JSON document.
    Json,
}

impl ColumnType {
    /// Whether every supported dialect accepts a DEFAULT clause for this type.
    ///
    /// MySQL rejects literal defaults on TEXT, BLOB and JSON columns.
    #[must_use]
    pub const fn supports_default(self) -> bool {
        !matches!(self, Self::Text | Self::Binary | Self::Json)
    }

    /// Whether every supported dialect can index this type without a prefix length.
    #[must_use]
    pub const fn supports_index(self) -> bool {
        !matches!(self, Self::Text | Self::Binary | Self::Json)
    }

    /// Whether this is an integer type usable for auto-increment keys.
    #[must_use]
    pub const fn is_integer(self) -> bool {
        matches!(self, Self::Integer | Self::BigInt)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer => f.write_str("integer"),
            Self::BigInt => f.write_str("bigint"),
            Self::Decimal { precision, scale } => write!(f, "decimal({precision}, {scale})"),
            Self::Float => f.write_str("float"),
            Self::Bool => f.write_str("bool"),
            Self::Varchar { length } => write!(f, "varchar({length})"),
            Self::Text => f.write_str("text"),
            Self::DateTime => f.write_str("datetime"),
            Self::Timestamp => f.write_str("timestamp"),
            Self::Binary => f.write_str("binary"),
            Self::Json => f.write_str("json"),
        }
    }
}

/// Default value for a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DefaultValue {
    /// NULL default.
    Null,
    /// Boolean default.
    Bool(bool),
    /// Integer default.
    Integer(i64),
    /// Float default.
    Float(f64),
    /// String default.
    String(String),
    /// The database's current timestamp at insert time.
    CurrentTimestamp,
}

impl From<bool> for DefaultValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for DefaultValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for DefaultValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for DefaultValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for DefaultValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for DefaultValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_support() {
        assert!(ColumnType::Integer.supports_default());
        assert!(ColumnType::Varchar { length: 10 }.supports_default());
        assert!(!ColumnType::Text.supports_default());
        assert!(!ColumnType::Binary.supports_default());
        assert!(!ColumnType::Json.supports_default());
    }

    #[test]
    fn test_type_serialization_is_tagged() {
        let json = serde_json::to_string(&ColumnType::Decimal {
            precision: 10,
            scale: 2,
        })
        .unwrap();
        assert_eq!(json, r#"{"type":"decimal","precision":10,"scale":2}"#);
    }

    #[test]
    fn test_default_from_conversions() {
        assert_eq!(DefaultValue::from(true), DefaultValue::Bool(true));
        assert_eq!(DefaultValue::from(7), DefaultValue::Integer(7));
        assert_eq!(
            DefaultValue::from("draft"),
            DefaultValue::String("draft".to_string())
        );
    }
}
