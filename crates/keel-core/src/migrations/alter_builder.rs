//! Builder for alterations of an existing table.

use super::column_builder::{ColumnRef, DeclareColumns, TableId};
use super::operation::{AlterOperation, check_indexable};
use super::table_builder::composite_columns;
use crate::error::{Error, Result};
use crate::schema::{Column, ColumnType, DefaultValue, Index, Table, index_name};

/// Accumulates [`AlterOperation`]s against one existing table.
///
/// Operations are kept in call order. Column lookups see the table as it
/// will be after the operations recorded so far, so a renamed column is found
/// under its new name.
///
/// # Example
///
/// ```rust
/// use keel_core::migrations::{AlterTableBuilder, DeclareColumns, TableBuilder};
///
/// let mut users = TableBuilder::empty("users");
/// users.varchar("name", 100).handle();
/// let users = users.build()?;
///
/// let mut alter = AlterTableBuilder::new(&users);
/// let name = alter.column("name")?;
/// alter.rename_column(&name, "full_name")?;
/// alter.text("bio").nullable().handle();
///
/// let kinds: Vec<_> = alter.operations().iter().map(|op| op.kind()).collect();
/// assert_eq!(kinds, ["rename_column", "add_column"]);
/// # Ok::<(), keel_core::Error>(())
/// ```
#[derive(Debug)]
pub struct AlterTableBuilder {
    id: TableId,
    base: Table,
    operations: Vec<AlterOperation>,
}

impl AlterTableBuilder {
    /// Starts altering `table`.
    #[must_use]
    pub fn new(table: &Table) -> Self {
        Self {
            id: TableId::fresh(),
            base: table.clone(),
            operations: Vec::new(),
        }
    }

    /// The table as it will be once the recorded operations are applied.
    pub fn view(&self) -> Result<Table> {
        let mut table = self.base.clone();
        for operation in &self.operations {
            operation.apply_to(&mut table)?;
        }
        Ok(table)
    }

    /// Returns a handle to a column of the current view.
    pub fn column(&self, name: &str) -> Result<ColumnRef> {
        let view = self.view()?;
        let column = view.require_column(name)?;
        Ok(ColumnRef::new(self.id, &view.name, column))
    }

    fn resolve(&self, column: &ColumnRef) -> Result<Column> {
        column.check_owner(self.id, &self.base.name)?;
        Ok(self.view()?.require_column(column.name())?.clone())
    }

    /// Pushes an operation after checking it against the current view.
    fn record(&mut self, operation: AlterOperation) -> Result<()> {
        let mut view = self.view()?;
        operation.apply_to(&mut view)?;
        self.operations.push(operation);
        Ok(())
    }

    /// Renames a column and returns a handle under the new name.
    pub fn rename_column(&mut self, column: &ColumnRef, to: &str) -> Result<ColumnRef> {
        let from = self.resolve(column)?;
        self.record(AlterOperation::RenameColumn {
            from: from.name,
            to: to.to_string(),
        })?;
        self.column(to)
    }

    /// Drops a column, first dropping every index that covers it.
    pub fn drop_column(&mut self, column: &ColumnRef) -> Result<&mut Self> {
        let target = self.resolve(column)?;
        let view = self.view()?;
        let mut batch: Vec<AlterOperation> = view
            .indexes
            .iter()
            .filter(|i| i.covers(&target.name))
            .map(|i| AlterOperation::DropIndex {
                name: i.name.clone(),
            })
            .collect();
        batch.push(AlterOperation::DropColumn {
            column: target.name,
        });

        let mut check = view;
        for operation in &batch {
            operation.apply_to(&mut check)?;
        }
        self.operations.extend(batch);
        Ok(self)
    }

    /// Changes a column's type.
    pub fn change_type(&mut self, column: &ColumnRef, ty: ColumnType) -> Result<&mut Self> {
        let target = self.resolve(column)?;
        self.record(AlterOperation::ChangeType {
            column: target.name,
            ty,
        })?;
        Ok(self)
    }

    /// Changes a column's nullability.
    pub fn set_nullable(&mut self, column: &ColumnRef, nullable: bool) -> Result<&mut Self> {
        let target = self.resolve(column)?;
        self.record(AlterOperation::ChangeNullable {
            column: target.name,
            nullable,
        })?;
        Ok(self)
    }

    /// Sets a column default.
    pub fn set_default(
        &mut self,
        column: &ColumnRef,
        default: impl Into<DefaultValue>,
    ) -> Result<&mut Self> {
        let target = self.resolve(column)?;
        self.record(AlterOperation::ChangeDefault {
            column: target.name,
            default: Some(default.into()),
        })?;
        Ok(self)
    }

    /// Drops a column default.
    pub fn drop_default(&mut self, column: &ColumnRef) -> Result<&mut Self> {
        let target = self.resolve(column)?;
        self.record(AlterOperation::ChangeDefault {
            column: target.name,
            default: None,
        })?;
        Ok(self)
    }

    /// Adds a composite index over two or more handles from this builder.
    pub fn add_index(&mut self, columns: &[&ColumnRef]) -> Result<&mut Self> {
        self.add_composite(columns, false)
    }

    /// Adds a unique composite index over two or more handles from this builder.
    pub fn add_unique_index(&mut self, columns: &[&ColumnRef]) -> Result<&mut Self> {
        self.add_composite(columns, true)
    }

    fn add_composite(&mut self, columns: &[&ColumnRef], unique: bool) -> Result<&mut Self> {
        let names = composite_columns(self.id, &self.base.name, columns)?;
        let index = Index::new(&self.base.name, names, unique);
        self.record(AlterOperation::AddIndex { index })?;
        Ok(self)
    }

    /// Adds a single-column index on an existing column.
    pub fn index_column(&mut self, column: &ColumnRef, unique: bool) -> Result<&mut Self> {
        let target = self.resolve(column)?;
        check_indexable(&target)?;
        let index = Index::new(&self.base.name, vec![target.name], unique);
        self.record(AlterOperation::AddIndex { index })?;
        Ok(self)
    }

    /// Drops an index by name.
    pub fn drop_index(&mut self, name: &str) -> Result<&mut Self> {
        self.record(AlterOperation::DropIndex {
            name: name.to_string(),
        })?;
        Ok(self)
    }

    /// Renames an index.
    pub fn rename_index(&mut self, from: &str, to: &str) -> Result<&mut Self> {
        self.record(AlterOperation::RenameIndex {
            from: from.to_string(),
            to: to.to_string(),
        })?;
        Ok(self)
    }

    /// Operations recorded so far, in call order.
    #[must_use]
    pub fn operations(&self) -> &[AlterOperation] {
        &self.operations
    }

    /// Portable JSON form of the recorded operations.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.operations)?)
    }

    /// Name of the table being altered.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.base.name
    }

    /// Finishes the batch, returning the table name and its operations.
    ///
    /// Added columns must be nullable or carry a default so existing rows
    /// stay valid.
    pub fn finish(self) -> Result<(String, Vec<AlterOperation>)> {
        for operation in &self.operations {
            if let AlterOperation::AddColumn { column } = operation {
                if !column.nullable && column.default.is_none() {
                    return Err(Error::NotNullWithoutDefault {
                        table: self.base.name.clone(),
                        column: column.name.clone(),
                    });
                }
            }
        }
        self.view()?.validate()?;
        Ok((self.base.name, self.operations))
    }
}

impl DeclareColumns for AlterTableBuilder {
    fn table_id(&self) -> TableId {
        self.id
    }

    fn table_name(&self) -> &str {
        &self.base.name
    }

    fn push_column(&mut self, column: Column) -> usize {
        self.operations.push(AlterOperation::AddColumn { column });
        self.operations.len() - 1
    }

    fn column_at(&mut self, slot: usize) -> &mut Column {
        match &mut self.operations[slot] {
            AlterOperation::AddColumn { column } => column,
            other => unreachable!("slot {slot} holds {}, not add_column", other.kind()),
        }
    }

    fn index_column_at(&mut self, slot: usize, unique: bool) {
        let column = self.column_at(slot).name.clone();
        let name = index_name(&self.base.name, &[&column]);
        if let Some(AlterOperation::AddIndex { index }) = self.operations.get_mut(slot + 1) {
            if index.name == name {
                index.unique |= unique;
                return;
            }
        }
        let index = Index::new(&self.base.name, vec![column], unique);
        self.operations
            .insert(slot + 1, AlterOperation::AddIndex { index });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::TableBuilder;

    fn users() -> Table {
        let mut users = TableBuilder::new("users");
        users.varchar("name", 100).indexed().unwrap().handle();
        users.varchar("email", 255).handle();
        users.build().unwrap()
    }

    #[test]
    fn test_operations_keep_call_order() {
        let table = users();
        let mut alter = AlterTableBuilder::new(&table);
        let email = alter.column("email").unwrap();
        alter.set_nullable(&email, true).unwrap();
        let name = alter.column("name").unwrap();
        alter.rename_column(&name, "full_name").unwrap();
        alter.text("bio").nullable().handle();

        let kinds: Vec<_> = alter.operations().iter().map(AlterOperation::kind).collect();
        assert_eq!(kinds, ["change_nullable", "rename_column", "add_column"]);
    }

    #[test]
    fn test_lookup_sees_renames() {
        let table = users();
        let mut alter = AlterTableBuilder::new(&table);
        let name = alter.column("name").unwrap();
        let renamed = alter.rename_column(&name, "full_name").unwrap();
        assert_eq!(renamed.name(), "full_name");
        assert!(matches!(
            alter.column("name"),
            Err(Error::UnknownColumn { .. })
        ));
        // The stale handle no longer resolves.
        assert!(alter.change_type(&name, ColumnType::Text).is_err());
    }

    #[test]
    fn test_drop_column_drops_covering_indexes_first() {
        let table = users();
        let mut alter = AlterTableBuilder::new(&table);
        let name = alter.column("name").unwrap();
        alter.drop_column(&name).unwrap();
        assert_eq!(
            alter.operations(),
            [
                AlterOperation::DropIndex {
                    name: "idx_users_name".into()
                },
                AlterOperation::DropColumn {
                    column: "name".into()
                },
            ]
        );
        let (_, operations) = alter.finish().unwrap();
        assert_eq!(operations.len(), 2);
    }

    #[test]
    fn test_unique_added_column_gets_index_right_after() {
        let table = users();
        let mut alter = AlterTableBuilder::new(&table);
        alter
            .varchar("nickname", 50)
            .nullable()
            .unique()
            .unwrap()
            .handle();
        alter.integer("age").nullable().handle();
        let kinds: Vec<_> = alter.operations().iter().map(AlterOperation::kind).collect();
        assert_eq!(kinds, ["add_column", "add_index", "add_column"]);
        let view = alter.view().unwrap();
        assert!(view.column("nickname").unwrap().unique);
    }

    #[test]
    fn test_not_null_add_needs_default() {
        let table = users();
        let mut alter = AlterTableBuilder::new(&table);
        alter.integer("age").handle();
        assert!(matches!(
            alter.finish(),
            Err(Error::NotNullWithoutDefault { column, .. }) if column == "age"
        ));

        let mut alter = AlterTableBuilder::new(&table);
        alter.integer("age").default(0).unwrap().handle();
        assert!(alter.finish().is_ok());
    }

    #[test]
    fn test_handle_from_other_builder_rejected() {
        let table = users();
        let first = AlterTableBuilder::new(&table);
        let mut second = AlterTableBuilder::new(&table);
        let name = first.column("name").unwrap();
        assert!(matches!(
            second.set_nullable(&name, true),
            Err(Error::ForeignColumnHandle { .. })
        ));
    }

    #[test]
    fn test_composite_index_over_new_and_existing_columns() {
        let table = users();
        let mut alter = AlterTableBuilder::new(&table);
        let age = alter.integer("age").nullable().handle();
        let email = alter.column("email").unwrap();
        alter.add_unique_index(&[&email, &age]).unwrap();
        let view = alter.view().unwrap();
        assert!(view.index("idx_users_email_age").unwrap().unique);
    }

    #[test]
    fn test_rename_and_drop_index() {
        let table = users();
        let mut alter = AlterTableBuilder::new(&table);
        alter.rename_index("idx_users_name", "users_by_name").unwrap();
        assert!(alter.drop_index("idx_users_name").is_err());
        alter.drop_index("users_by_name").unwrap();
        assert!(alter.view().unwrap().indexes.iter().all(|i| i.name != "users_by_name"));
    }

    #[test]
    fn test_serialized_operations() {
        let table = users();
        let mut alter = AlterTableBuilder::new(&table);
        let name = alter.column("name").unwrap();
        alter.rename_column(&name, "full_name").unwrap();
        let json: serde_json::Value = serde_json::from_str(&alter.to_json().unwrap()).unwrap();
        assert_eq!(json[0]["kind"], "rename_column");
        assert_eq!(json[0]["from"], "name");
        assert_eq!(json[0]["to"], "full_name");
    }
}
