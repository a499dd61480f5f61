//! Fluent column declaration shared by the create and alter builders.
//!
//! Columns are declared through [`DeclareColumns`], which both
//! [`TableBuilder`](super::TableBuilder) and
//! [`AlterTableBuilder`](super::AlterTableBuilder) implement. Each typed
//! constructor records the column immediately and returns a [`ColumnBuilder`]
//! that edits it in place; [`ColumnBuilder::handle`] yields a [`ColumnRef`]
//! usable in composite indexes and alter operations of the same builder.

use std::sync::atomic::{AtomicU64, Ordering};

use super::operation::{check_default, check_indexable};
use crate::error::{Error, Result};
use crate::schema::{Column, ColumnType, DefaultValue};

static NEXT_TABLE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one builder instance.
///
/// Two builders for the same table name still get distinct ids, so a handle
/// obtained from one cannot be passed to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TableId(u64);

impl TableId {
    pub(crate) fn fresh() -> Self {
        Self(NEXT_TABLE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A typed reference to a declared column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    table: TableId,
    table_name: String,
    name: String,
    ty: ColumnType,
}

impl ColumnRef {
    pub(crate) fn new(table: TableId, table_name: &str, column: &Column) -> Self {
        Self {
            table,
            table_name: table_name.to_string(),
            name: column.name.clone(),
            ty: column.ty,
        }
    }

    /// Column name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Column type at the time the handle was taken.
    #[must_use]
    pub const fn ty(&self) -> ColumnType {
        self.ty
    }

    /// Name of the owning table.
    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Fails unless this handle was issued by the builder `table`.
    pub(crate) fn check_owner(&self, table: TableId, table_name: &str) -> Result<()> {
        if self.table == table {
            Ok(())
        } else {
            Err(Error::ForeignColumnHandle {
                table: table_name.to_string(),
                column: self.name.clone(),
            })
        }
    }
}

/// A builder that columns can be declared on.
///
/// The required methods are the storage hooks; the provided methods are the
/// typed constructors.
pub trait DeclareColumns: Sized {
    /// Identity handed out with every [`ColumnRef`].
    fn table_id(&self) -> TableId;

    /// Name of the table being built.
    fn table_name(&self) -> &str;

    /// Records a new column and returns its slot.
    fn push_column(&mut self, column: Column) -> usize;

    /// The column recorded at `slot`. Slots come from [`push_column`](Self::push_column).
    fn column_at(&mut self, slot: usize) -> &mut Column;

    /// Adds or updates the single-column index of the column at `slot`.
    fn index_column_at(&mut self, slot: usize, unique: bool);

    /// Declares a column of an arbitrary type.
    fn add_column(&mut self, name: &str, ty: ColumnType) -> ColumnBuilder<'_, Self> {
        let slot = self.push_column(Column::new(name, ty));
        ColumnBuilder { target: self, slot }
    }

    /// Declares a 32-bit integer column.
    fn integer(&mut self, name: &str) -> ColumnBuilder<'_, Self> {
        self.add_column(name, ColumnType::Integer)
    }

    /// Declares a 64-bit integer column.
    fn bigint(&mut self, name: &str) -> ColumnBuilder<'_, Self> {
        self.add_column(name, ColumnType::BigInt)
    }

    /// Declares an exact decimal column.
    fn decimal(&mut self, name: &str, precision: u8, scale: u8) -> ColumnBuilder<'_, Self> {
        self.add_column(name, ColumnType::Decimal { precision, scale })
    }

    /// Declares a double precision column.
    fn float(&mut self, name: &str) -> ColumnBuilder<'_, Self> {
        self.add_column(name, ColumnType::Float)
    }

    /// Declares a boolean column.
    fn bool(&mut self, name: &str) -> ColumnBuilder<'_, Self> {
        self.add_column(name, ColumnType::Bool)
    }

    /// Declares a bounded string column. Alias of [`varchar`](Self::varchar).
    fn string(&mut self, name: &str, length: u32) -> ColumnBuilder<'_, Self> {
        self.varchar(name, length)
    }

    /// Declares a bounded string column.
    fn varchar(&mut self, name: &str, length: u32) -> ColumnBuilder<'_, Self> {
        self.add_column(name, ColumnType::Varchar { length })
    }

    /// Declares an unbounded text column.
    fn text(&mut self, name: &str) -> ColumnBuilder<'_, Self> {
        self.add_column(name, ColumnType::Text)
    }

    /// Declares a date-time column.
    fn datetime(&mut self, name: &str) -> ColumnBuilder<'_, Self> {
        self.add_column(name, ColumnType::DateTime)
    }

    /// Declares a timestamp column.
    fn timestamp(&mut self, name: &str) -> ColumnBuilder<'_, Self> {
        self.add_column(name, ColumnType::Timestamp)
    }

    /// Declares a binary column.
    fn binary(&mut self, name: &str) -> ColumnBuilder<'_, Self> {
        self.add_column(name, ColumnType::Binary)
    }

    /// Declares a JSON column.
    fn json(&mut self, name: &str) -> ColumnBuilder<'_, Self> {
        self.add_column(name, ColumnType::Json)
    }
}

/// Chainable editor for a column that was just declared.
///
/// Every method edits the recorded column directly, so dropping the builder
/// without calling [`handle`](Self::handle) still keeps the column.
#[must_use = "call .handle() to keep a reference to the column"]
pub struct ColumnBuilder<'t, T: DeclareColumns> {
    target: &'t mut T,
    slot: usize,
}

impl<T: DeclareColumns> ColumnBuilder<'_, T> {
    fn edit(&mut self, f: impl FnOnce(&mut Column)) {
        f(self.target.column_at(self.slot));
    }

    fn column(&mut self) -> &Column {
        self.target.column_at(self.slot)
    }

    /// Allows NULL.
    pub fn nullable(mut self) -> Self {
        self.edit(|c| c.nullable = true);
        self
    }

    /// Forbids NULL (the default).
    pub fn not_null(mut self) -> Self {
        self.edit(|c| c.nullable = false);
        self
    }

    /// Marks the column as primary key. Primary keys are always NOT NULL.
    pub fn primary_key(mut self) -> Self {
        self.edit(|c| {
            c.primary_key = true;
            c.nullable = false;
        });
        self
    }

    /// Lets the database generate values.
    pub fn auto_increment(mut self) -> Self {
        self.edit(|c| c.auto_increment = true);
        self
    }

    /// Records a logical reference to `table`. No constraint is emitted.
    pub fn references(mut self, table: &str) -> Self {
        self.edit(|c| c.references = Some(table.to_string()));
        self
    }

    /// Sets the default value.
    ///
    /// Fails for types on which some dialect forbids a default.
    pub fn default(mut self, value: impl Into<DefaultValue>) -> Result<Self> {
        let value = value.into();
        let column = self.column();
        check_default(column.ty, Some(&value), &column.name)?;
        self.edit(|c| c.default = Some(value));
        Ok(self)
    }

    /// Marks the column unique and backs it with a unique single-column index.
    pub fn unique(mut self) -> Result<Self> {
        check_indexable(self.column())?;
        self.edit(|c| c.unique = true);
        self.target.index_column_at(self.slot, true);
        Ok(self)
    }

    /// Backs the column with a single-column index.
    pub fn indexed(mut self) -> Result<Self> {
        let column = self.column();
        check_indexable(column)?;
        let unique = column.unique;
        self.target.index_column_at(self.slot, unique);
        Ok(self)
    }

    /// Finishes the declaration and returns a handle to the column.
    pub fn handle(mut self) -> ColumnRef {
        let id = self.target.table_id();
        let column = self.column().clone();
        ColumnRef::new(id, self.target.table_name(), &column)
    }
}
