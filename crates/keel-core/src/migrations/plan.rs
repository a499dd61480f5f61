//! The mutable handle an authoring unit records its changes on.

use super::alter_builder::AlterTableBuilder;
use super::operation::Change;
use super::table_builder::TableBuilder;
use crate::error::Result;
use crate::schema::{SchemaSnapshot, Table};

/// Collects the changes of one migration.
///
/// The plan carries the schema as it stands before the migration, updated
/// after every recorded change, so later changes in the same migration see
/// earlier ones.
#[derive(Debug)]
pub struct Plan {
    snapshot: SchemaSnapshot,
    changes: Vec<Change>,
}

impl Plan {
    /// Starts a plan over `snapshot`.
    #[must_use]
    pub const fn new(snapshot: SchemaSnapshot) -> Self {
        Self {
            snapshot,
            changes: Vec::new(),
        }
    }

    /// Looks up an existing table, failing if it does not exist.
    pub fn table(&self, name: &str) -> Result<&Table> {
        self.snapshot.require_table(name)
    }

    /// The current schema view.
    #[must_use]
    pub const fn snapshot(&self) -> &SchemaSnapshot {
        &self.snapshot
    }

    /// Changes recorded so far.
    #[must_use]
    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    /// Creates a table with the standard lifecycle columns.
    pub fn create_table<F>(&mut self, name: &str, define: F) -> Result<()>
    where
        F: FnOnce(&mut TableBuilder) -> Result<()>,
    {
        let mut builder = TableBuilder::new(name);
        define(&mut builder)?;
        self.add_table(builder)
    }

    /// Creates a table without lifecycle columns.
    pub fn create_empty_table<F>(&mut self, name: &str, define: F) -> Result<()>
    where
        F: FnOnce(&mut TableBuilder) -> Result<()>,
    {
        let mut builder = TableBuilder::empty(name);
        define(&mut builder)?;
        self.add_table(builder)
    }

    /// Creates a many-to-many junction table.
    pub fn create_junction_table<F>(&mut self, name: &str, define: F) -> Result<()>
    where
        F: FnOnce(&mut TableBuilder) -> Result<()>,
    {
        let mut builder = TableBuilder::junction(name);
        define(&mut builder)?;
        self.add_table(builder)
    }

    /// Records a create-table change from a finished builder.
    ///
    /// Reference targets must exist in the current view (self-references are
    /// allowed).
    pub fn add_table(&mut self, builder: TableBuilder) -> Result<()> {
        self.push(Change::CreateTable {
            table: builder.build()?,
        })
    }

    /// Alters an existing table.
    pub fn alter_table<F>(&mut self, name: &str, define: F) -> Result<()>
    where
        F: FnOnce(&mut AlterTableBuilder) -> Result<()>,
    {
        let mut builder = AlterTableBuilder::new(self.table(name)?);
        define(&mut builder)?;
        self.apply_alter(builder)
    }

    /// Records an alter-table change from a finished builder.
    pub fn apply_alter(&mut self, builder: AlterTableBuilder) -> Result<()> {
        let (table, operations) = builder.finish()?;
        if operations.is_empty() {
            return Ok(());
        }
        self.push(Change::AlterTable { table, operations })
    }

    fn push(&mut self, change: Change) -> Result<()> {
        change.apply(&mut self.snapshot)?;
        self.changes.push(change);
        Ok(())
    }

    /// Consumes the plan, returning the resulting schema and the changes.
    #[must_use]
    pub fn into_parts(self) -> (SchemaSnapshot, Vec<Change>) {
        (self.snapshot, self.changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::migrations::DeclareColumns;

    #[test]
    fn test_later_changes_see_earlier_ones() {
        let mut plan = Plan::new(SchemaSnapshot::new());
        plan.create_table("owners", |t| {
            t.varchar("name", 100).handle();
            Ok(())
        })
        .unwrap();
        plan.create_table("pets", |t| {
            t.bigint("owner_id").references("owners").indexed()?.handle();
            Ok(())
        })
        .unwrap();
        plan.alter_table("owners", |t| {
            t.text("bio").nullable().handle();
            Ok(())
        })
        .unwrap();

        assert_eq!(plan.changes().len(), 3);
        let (snapshot, _) = plan.into_parts();
        assert!(snapshot.table("owners").unwrap().column("bio").is_some());
    }

    #[test]
    fn test_missing_table_lookup_fails() {
        let mut plan = Plan::new(SchemaSnapshot::new());
        assert!(matches!(plan.table("users"), Err(Error::UnknownTable(_))));
        let err = plan.alter_table("users", |_| Ok(())).unwrap_err();
        assert!(matches!(err, Error::UnknownTable(name) if name == "users"));
    }

    #[test]
    fn test_reference_must_exist() {
        let mut plan = Plan::new(SchemaSnapshot::new());
        let err = plan
            .create_table("pets", |t| {
                t.bigint("owner_id").references("owners").handle();
                Ok(())
            })
            .unwrap_err();
        assert!(matches!(err, Error::UnknownTable(name) if name == "owners"));
        assert!(plan.changes().is_empty());
    }

    #[test]
    fn test_self_reference_allowed() {
        let mut plan = Plan::new(SchemaSnapshot::new());
        plan.create_table("categories", |t| {
            t.bigint("parent_id").nullable().references("categories").handle();
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_empty_alter_records_nothing() {
        let mut plan = Plan::new(SchemaSnapshot::new());
        plan.create_empty_table("settings", |t| {
            t.varchar("key", 64).primary_key().handle();
            Ok(())
        })
        .unwrap();
        plan.alter_table("settings", |_| Ok(())).unwrap();
        assert_eq!(plan.changes().len(), 1);
    }
}
