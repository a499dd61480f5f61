//! Table definitions.

use serde::{Deserialize, Serialize};

use super::column::Column;
use super::index::Index;
use super::types::DefaultValue;
use crate::error::{Error, Result};

/// Columns every table built with the lifecycle constructor carries.
pub const LIFECYCLE_COLUMNS: [&str; 5] = ["id", "public_id", "created_at", "updated_at", "deleted_at"];

/// A named collection of columns and indexes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Table name.
    pub name: String,
    /// Columns in declaration order.
    pub columns: Vec<Column>,
    /// Indexes in declaration order.
    #[serde(default)]
    pub indexes: Vec<Index>,
    /// Whether this is a many-to-many junction table.
    #[serde(default)]
    pub junction: bool,
}

impl Table {
    /// Creates an empty table.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            indexes: Vec::new(),
            junction: false,
        }
    }

    /// Looks up a column by name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Looks up a column by name for mutation.
    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.name == name)
    }

    /// Looks up a column, failing with [`Error::UnknownColumn`].
    pub fn require_column(&self, name: &str) -> Result<&Column> {
        self.column(name).ok_or_else(|| Error::UnknownColumn {
            table: self.name.clone(),
            column: name.to_string(),
        })
    }

    /// Looks up an index by name.
    #[must_use]
    pub fn index(&self, name: &str) -> Option<&Index> {
        self.indexes.iter().find(|i| i.name == name)
    }

    /// Returns the primary key column, if any.
    #[must_use]
    pub fn primary_key(&self) -> Option<&Column> {
        self.columns.iter().find(|c| c.primary_key)
    }

    /// Returns the columns carrying a logical reference.
    pub fn reference_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.references.is_some())
    }

    /// Checks the table-level invariants.
    ///
    /// Column and index names are unique. At most one column is the primary
    /// key, and it is NOT NULL. Auto-increment is only allowed on an integer
    /// primary key. Float defaults are finite. A junction table has exactly
    /// two reference columns and no primary key, lifecycle column or default.
    pub fn validate(&self) -> Result<()> {
        let mut primary_key: Option<&Column> = None;
        for (i, column) in self.columns.iter().enumerate() {
            if self.columns[..i].iter().any(|c| c.name == column.name) {
                return Err(Error::DuplicateColumn {
                    table: self.name.clone(),
                    column: column.name.clone(),
                });
            }
            if column.primary_key {
                if column.nullable {
                    return Err(Error::NullablePrimaryKey {
                        table: self.name.clone(),
                        column: column.name.clone(),
                    });
                }
                if let Some(first) = primary_key {
                    return Err(Error::MultiplePrimaryKeys {
                        table: self.name.clone(),
                        first: first.name.clone(),
                        second: column.name.clone(),
                    });
                }
                primary_key = Some(column);
            }
            self.validate_auto_increment(column)?;
            if let Some(DefaultValue::Float(value)) = &column.default {
                if !value.is_finite() {
                    return Err(Error::NonFiniteDefault {
                        column: column.name.clone(),
                    });
                }
            }
            if self.junction {
                self.validate_junction_column(column)?;
            }
        }
        for (i, index) in self.indexes.iter().enumerate() {
            if self.indexes[..i].iter().any(|x| x.name == index.name) {
                return Err(Error::DuplicateIndex {
                    table: self.name.clone(),
                    index: index.name.clone(),
                });
            }
            for column in &index.columns {
                self.require_column(column)?;
            }
        }
        if self.junction {
            let found = self.reference_columns().count();
            if found != 2 {
                return Err(Error::InvalidJunction {
                    table: self.name.clone(),
                    found,
                });
            }
        }
        Ok(())
    }

    fn validate_auto_increment(&self, column: &Column) -> Result<()> {
        if !column.auto_increment {
            return Ok(());
        }
        let reason = if !column.ty.is_integer() {
            format!("type {} is not an integer", column.ty)
        } else if !column.primary_key {
            "it is not the primary key".to_string()
        } else {
            return Ok(());
        };
        Err(Error::InvalidAutoIncrement {
            table: self.name.clone(),
            column: column.name.clone(),
            reason,
        })
    }

    fn validate_junction_column(&self, column: &Column) -> Result<()> {
        let reason = if LIFECYCLE_COLUMNS.contains(&column.name.as_str()) {
            "lifecycle columns are not allowed"
        } else if column.primary_key {
            "a primary key is not allowed"
        } else if column.default.is_some() {
            "defaults are not allowed"
        } else {
            return Ok(());
        };
        Err(Error::InvalidJunctionColumn {
            table: self.name.clone(),
            column: column.name.clone(),
            reason: reason.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnType;

    fn pets() -> Table {
        let mut table = Table::new("pets");
        let mut id = Column::new("id", ColumnType::BigInt);
        id.primary_key = true;
        table.columns.push(id);
        table.columns.push(Column::new("name", ColumnType::Text));
        table
    }

    #[test]
    fn test_lookup() {
        let table = pets();
        assert!(table.column("name").is_some());
        assert!(table.column("missing").is_none());
        assert_eq!(table.primary_key().map(|c| c.name.as_str()), Some("id"));
        assert!(matches!(
            table.require_column("missing"),
            Err(Error::UnknownColumn { .. })
        ));
    }

    #[test]
    fn test_duplicate_column_rejected() {
        let mut table = pets();
        table.columns.push(Column::new("name", ColumnType::Integer));
        assert!(matches!(
            table.validate(),
            Err(Error::DuplicateColumn { column, .. }) if column == "name"
        ));
    }

    #[test]
    fn test_nullable_primary_key_rejected() {
        let mut table = pets();
        table.columns[0].nullable = true;
        assert!(matches!(
            table.validate(),
            Err(Error::NullablePrimaryKey { .. })
        ));
    }

    #[test]
    fn test_junction_needs_two_references() {
        let mut table = Table::new("pet_tags");
        table.junction = true;
        let mut pet = Column::new("pet_id", ColumnType::BigInt);
        pet.references = Some("pets".to_string());
        table.columns.push(pet);
        assert!(matches!(
            table.validate(),
            Err(Error::InvalidJunction { found: 1, .. })
        ));
    }
}
