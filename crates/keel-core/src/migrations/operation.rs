//! Schema change operations.
//!
//! A migration is an ordered list of [`Change`]s. Table alterations are a
//! closed set of [`AlterOperation`] kinds so every consumer matches them
//! exhaustively. Applying operations here is the single place where the
//! schema model is mutated; builders, replay and the DDL emitter all go
//! through it.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::schema::{Column, ColumnType, DefaultValue, Index, SchemaSnapshot, Table};

/// One atomic table mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AlterOperation {
    /// Add a column.
    AddColumn {
        /// The new column.
        column: Column,
    },
    /// Drop a column.
    DropColumn {
        /// Column name.
        column: String,
    },
    /// Rename a column.
    RenameColumn {
        /// Current name.
        from: String,
        /// New name.
        to: String,
    },
    /// Change a column's type.
    ChangeType {
        /// Column name.
        column: String,
        /// New type.
        ty: ColumnType,
    },
    /// Change a column's nullability.
    ChangeNullable {
        /// Column name.
        column: String,
        /// Whether NULL is allowed afterwards.
        nullable: bool,
    },
    /// Set or drop a column default.
    ChangeDefault {
        /// Column name.
        column: String,
        /// New default; `None` drops it.
        default: Option<DefaultValue>,
    },
    /// Add an index.
    AddIndex {
        /// The new index.
        index: Index,
    },
    /// Drop an index.
    DropIndex {
        /// Index name.
        name: String,
    },
    /// Rename an index.
    RenameIndex {
        /// Current name.
        from: String,
        /// New name.
        to: String,
    },
}

impl AlterOperation {
    /// Short kind tag, as used in the serialized form.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::AddColumn { .. } => "add_column",
            Self::DropColumn { .. } => "drop_column",
            Self::RenameColumn { .. } => "rename_column",
            Self::ChangeType { .. } => "change_type",
            Self::ChangeNullable { .. } => "change_nullable",
            Self::ChangeDefault { .. } => "change_default",
            Self::AddIndex { .. } => "add_index",
            Self::DropIndex { .. } => "drop_index",
            Self::RenameIndex { .. } => "rename_index",
        }
    }

    /// Applies this operation to a table.
    pub fn apply_to(&self, table: &mut Table) -> Result<()> {
        match self {
            Self::AddColumn { column } => {
                if table.column(&column.name).is_some() {
                    return Err(Error::DuplicateColumn {
                        table: table.name.clone(),
                        column: column.name.clone(),
                    });
                }
                check_default(column.ty, column.default.as_ref(), &column.name)?;
                table.columns.push(column.clone());
            }

            Self::DropColumn { column } => {
                table.require_column(column)?;
                if let Some(index) = table.indexes.iter().find(|i| i.covers(column)) {
                    return Err(Error::ColumnInUse {
                        table: table.name.clone(),
                        column: column.clone(),
                        index: index.name.clone(),
                    });
                }
                table.columns.retain(|c| c.name != *column);
            }

            Self::RenameColumn { from, to } => {
                table.require_column(from)?;
                if table.column(to).is_some() {
                    return Err(Error::DuplicateColumn {
                        table: table.name.clone(),
                        column: to.clone(),
                    });
                }
                for index in &mut table.indexes {
                    for column in &mut index.columns {
                        if column == from {
                            column.clone_from(to);
                        }
                    }
                }
                if let Some(column) = table.column_mut(from) {
                    column.name.clone_from(to);
                }
            }

            Self::ChangeType { column, ty } => {
                let existing = table.require_column(column)?;
                check_default(*ty, existing.default.as_ref(), column)?;
                if !ty.supports_index() && table.indexes.iter().any(|i| i.covers(column)) {
                    return Err(Error::IndexNotSupported {
                        column: column.clone(),
                        ty: *ty,
                        dialect: "mysql",
                    });
                }
                if let Some(c) = table.column_mut(column) {
                    c.ty = *ty;
                }
            }

            Self::ChangeNullable { column, nullable } => {
                let existing = table.require_column(column)?;
                if existing.primary_key && *nullable {
                    return Err(Error::NullablePrimaryKey {
                        table: table.name.clone(),
                        column: column.clone(),
                    });
                }
                if let Some(c) = table.column_mut(column) {
                    c.nullable = *nullable;
                }
            }

            Self::ChangeDefault { column, default } => {
                let existing = table.require_column(column)?;
                check_default(existing.ty, default.as_ref(), column)?;
                if let Some(c) = table.column_mut(column) {
                    c.default.clone_from(default);
                }
            }

            Self::AddIndex { index } => {
                if table.index(&index.name).is_some() {
                    return Err(Error::DuplicateIndex {
                        table: table.name.clone(),
                        index: index.name.clone(),
                    });
                }
                for name in &index.columns {
                    let column = table.require_column(name)?;
                    check_indexable(column)?;
                }
                if let [only] = index.columns.as_slice() {
                    if index.unique {
                        if let Some(c) = table.column_mut(only) {
                            c.unique = true;
                        }
                    }
                }
                table.indexes.push(index.clone());
            }

            Self::DropIndex { name } => {
                let position = table
                    .indexes
                    .iter()
                    .position(|i| i.name == *name)
                    .ok_or_else(|| Error::UnknownIndex {
                        table: table.name.clone(),
                        index: name.clone(),
                    })?;
                let removed = table.indexes.remove(position);
                if let [only] = removed.columns.as_slice() {
                    if removed.unique {
                        let still_unique = table
                            .indexes
                            .iter()
                            .any(|i| i.unique && i.columns.len() == 1 && i.covers(only));
                        if let Some(c) = table.column_mut(only) {
                            c.unique = still_unique;
                        }
                    }
                }
            }

            Self::RenameIndex { from, to } => {
                if table.index(to).is_some() {
                    return Err(Error::DuplicateIndex {
                        table: table.name.clone(),
                        index: to.clone(),
                    });
                }
                let index = table
                    .indexes
                    .iter_mut()
                    .find(|i| i.name == *from)
                    .ok_or_else(|| Error::UnknownIndex {
                        table: table.name.clone(),
                        index: from.clone(),
                    })?;
                index.name.clone_from(to);
            }
        }
        Ok(())
    }
}

/// Rejects a default on a column type that some dialect cannot default.
pub(crate) fn check_default(
    ty: ColumnType,
    default: Option<&DefaultValue>,
    column: &str,
) -> Result<()> {
    match default {
        Some(DefaultValue::Null) | None => Ok(()),
        Some(DefaultValue::Float(value)) if !value.is_finite() => Err(Error::NonFiniteDefault {
            column: column.to_string(),
        }),
        Some(_) if ty.supports_default() => Ok(()),
        Some(_) => Err(Error::DefaultNotSupported {
            column: column.to_string(),
            ty,
            dialect: "mysql",
        }),
    }
}

/// Rejects an index over a column type that some dialect cannot index.
pub(crate) fn check_indexable(column: &Column) -> Result<()> {
    if column.ty.supports_index() {
        Ok(())
    } else {
        Err(Error::IndexNotSupported {
            column: column.name.clone(),
            ty: column.ty,
            dialect: "mysql",
        })
    }
}

/// One entry of a migration: a table creation or a batch of alterations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum Change {
    /// Create a table.
    CreateTable {
        /// The table to create.
        table: Table,
    },
    /// Alter an existing table, applying operations in order.
    AlterTable {
        /// Table name.
        table: String,
        /// Operations, in declaration order.
        operations: Vec<AlterOperation>,
    },
}

impl Change {
    /// Name of the table this change touches.
    #[must_use]
    pub fn table_name(&self) -> &str {
        match self {
            Self::CreateTable { table } => &table.name,
            Self::AlterTable { table, .. } => table,
        }
    }

    /// Applies this change to a snapshot.
    ///
    /// The snapshot is left untouched if the change fails.
    pub fn apply(&self, snapshot: &mut SchemaSnapshot) -> Result<()> {
        match self {
            Self::CreateTable { table } => {
                if snapshot.contains(&table.name) {
                    return Err(Error::DuplicateTable(table.name.clone()));
                }
                table.validate()?;
                for column in table.reference_columns() {
                    check_reference(snapshot, &table.name, column)?;
                }
                snapshot.tables.insert(table.name.clone(), table.clone());
            }
            Self::AlterTable { table, operations } => {
                let mut altered = snapshot.require_table(table)?.clone();
                for operation in operations {
                    if let AlterOperation::AddColumn { column } = operation {
                        check_reference(snapshot, table, column)?;
                    }
                    operation.apply_to(&mut altered)?;
                }
                altered.validate()?;
                snapshot.tables.insert(table.clone(), altered);
            }
        }
        Ok(())
    }
}

fn check_reference(snapshot: &SchemaSnapshot, owner: &str, column: &Column) -> Result<()> {
    match column.references.as_deref() {
        Some(target) if target != owner && !snapshot.contains(target) => {
            Err(Error::UnknownTable(target.to_string()))
        }
        _ => Ok(()),
    }
}
