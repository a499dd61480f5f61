//! Builder for new tables.

use super::column_builder::{ColumnRef, DeclareColumns, TableId};
use crate::error::{Error, Result};
use crate::schema::{Column, ColumnType, DefaultValue, Index, Table, index_name};

/// Builds a [`Table`] for a create-table change.
///
/// # Example
///
/// ```rust
/// use keel_core::migrations::{DeclareColumns, TableBuilder};
///
/// let mut pets = TableBuilder::new("pets");
/// let name = pets.varchar("name", 100).handle();
/// let owner = pets.bigint("owner_id").references("owners").indexed()?.handle();
/// pets.add_index(&[&owner, &name])?;
/// let table = pets.build()?;
///
/// assert!(table.column("public_id").is_some());
/// assert!(table.index("idx_pets_owner_id_name").is_some());
/// # Ok::<(), keel_core::Error>(())
/// ```
#[derive(Debug)]
pub struct TableBuilder {
    id: TableId,
    table: Table,
}

impl TableBuilder {
    /// Starts a table with the standard lifecycle columns.
    ///
    /// `id` (auto-increment primary key), `public_id` (unique opaque id),
    /// `created_at`, `updated_at` (default current timestamp) and
    /// `deleted_at` (nullable).
    #[must_use]
    pub fn new(name: &str) -> Self {
        let mut builder = Self::empty(name);

        let mut id = Column::new("id", ColumnType::BigInt);
        id.primary_key = true;
        id.auto_increment = true;
        builder.table.columns.push(id);

        let mut public_id = Column::new("public_id", ColumnType::Varchar { length: 36 });
        public_id.unique = true;
        builder.table.columns.push(public_id);
        builder
            .table
            .indexes
            .push(Index::new(name, vec!["public_id".to_string()], true));

        for stamp in ["created_at", "updated_at"] {
            let mut column = Column::new(stamp, ColumnType::Timestamp);
            column.default = Some(DefaultValue::CurrentTimestamp);
            builder.table.columns.push(column);
        }

        let mut deleted_at = Column::new("deleted_at", ColumnType::Timestamp);
        deleted_at.nullable = true;
        builder.table.columns.push(deleted_at);

        builder
    }

    /// Starts a table with no columns at all.
    #[must_use]
    pub fn empty(name: &str) -> Self {
        Self {
            id: TableId::fresh(),
            table: Table::new(name),
        }
    }

    /// Starts a many-to-many junction table.
    ///
    /// Declare exactly two referencing columns; [`build`](Self::build) adds a
    /// unique index over the pair.
    #[must_use]
    pub fn junction(name: &str) -> Self {
        let mut builder = Self::empty(name);
        builder.table.junction = true;
        builder
    }

    /// Returns a handle to an already declared column.
    pub fn column(&self, name: &str) -> Result<ColumnRef> {
        let column = self.table.require_column(name)?;
        Ok(ColumnRef::new(self.id, &self.table.name, column))
    }

    /// Adds a composite index over two or more handles from this builder.
    pub fn add_index(&mut self, columns: &[&ColumnRef]) -> Result<&mut Self> {
        self.push_composite(columns, false)
    }

    /// Adds a unique composite index over two or more handles from this builder.
    pub fn add_unique_index(&mut self, columns: &[&ColumnRef]) -> Result<&mut Self> {
        self.push_composite(columns, true)
    }

    fn push_composite(&mut self, columns: &[&ColumnRef], unique: bool) -> Result<&mut Self> {
        let names = composite_columns(self.id, &self.table.name, columns)?;
        for name in &names {
            super::operation::check_indexable(self.table.require_column(name)?)?;
        }
        let index = Index::new(&self.table.name, names, unique);
        if self.table.index(&index.name).is_some() {
            return Err(Error::DuplicateIndex {
                table: self.table.name.clone(),
                index: index.name,
            });
        }
        self.table.indexes.push(index);
        Ok(self)
    }

    /// Finishes the table, checking its invariants.
    pub fn build(mut self) -> Result<Table> {
        if self.table.junction {
            let references: Vec<String> = self
                .table
                .reference_columns()
                .map(|c| c.name.clone())
                .collect();
            if references.len() != 2 {
                return Err(Error::InvalidJunction {
                    table: self.table.name.clone(),
                    found: references.len(),
                });
            }
            let name = index_name(&self.table.name, &references);
            if self.table.index(&name).is_none() {
                self.table
                    .indexes
                    .push(Index::new(&self.table.name, references, true));
            }
        }
        self.table.validate()?;
        Ok(self.table)
    }
}

/// Resolves handles for a composite index, checking count and ownership.
pub(crate) fn composite_columns(
    id: TableId,
    table: &str,
    columns: &[&ColumnRef],
) -> Result<Vec<String>> {
    if columns.len() < 2 {
        return Err(Error::IndexTooNarrow {
            table: table.to_string(),
            count: columns.len(),
        });
    }
    columns
        .iter()
        .map(|handle| {
            handle.check_owner(id, table)?;
            Ok(handle.name().to_string())
        })
        .collect()
}

impl DeclareColumns for TableBuilder {
    fn table_id(&self) -> TableId {
        self.id
    }

    fn table_name(&self) -> &str {
        &self.table.name
    }

    fn push_column(&mut self, column: Column) -> usize {
        self.table.columns.push(column);
        self.table.columns.len() - 1
    }

    fn column_at(&mut self, slot: usize) -> &mut Column {
        &mut self.table.columns[slot]
    }

    fn index_column_at(&mut self, slot: usize, unique: bool) {
        let column = self.table.columns[slot].name.clone();
        let name = index_name(&self.table.name, &[&column]);
        match self.table.indexes.iter_mut().find(|i| i.name == name) {
            Some(index) => index.unique |= unique,
            None => self
                .table
                .indexes
                .push(Index::new(&self.table.name, vec![column], unique)),
        }
    }
}
