//! Dialect-specific DDL generation.
//!
//! [`MigrationDialect`] extends [`Dialect`] with the statements needed to
//! create tables and replay alter operations. Most of the SQL is shared and
//! lives in provided methods; each database overrides type names,
//! auto-increment syntax and the alter kinds it spells differently.

mod mysql;
mod postgres;
mod sqlite;

use crate::dialect::Dialect;
use crate::error::Result;
use crate::migrations::migration::Migration;
use crate::migrations::operation::{AlterOperation, Change};
use crate::schema::{Column, ColumnType, DefaultValue, Index, SchemaSnapshot, Table};

/// DDL generation for one dialect.
///
/// Input is assumed valid: builders have already rejected defaults and
/// indexes a dialect cannot express.
pub trait MigrationDialect: Dialect {
    /// Maps a logical type to this dialect's SQL type.
    fn map_type(&self, ty: ColumnType) -> String;

    /// Renders a default value.
    fn render_default(&self, default: &DefaultValue) -> String {
        match default {
            DefaultValue::Null => String::from("NULL"),
            DefaultValue::Bool(b) => self.bool_literal(*b).to_string(),
            DefaultValue::Integer(i) => i.to_string(),
            DefaultValue::Float(f) => f.to_string(),
            DefaultValue::String(s) => self.string_literal(s),
            DefaultValue::CurrentTimestamp => String::from("CURRENT_TIMESTAMP"),
        }
    }

    /// Whether nullable columns spell out `NULL`.
    fn explicit_null(&self) -> bool {
        false
    }

    /// Renders the auto-increment primary key column definition.
    fn auto_increment_definition(&self, column: &Column) -> String;

    /// Renders a column definition as used in CREATE TABLE and ADD COLUMN.
    ///
    /// Uniqueness is never inlined; it is carried by a separate index.
    fn column_definition(&self, column: &Column) -> String {
        if column.primary_key && column.auto_increment {
            return self.auto_increment_definition(column);
        }

        let mut sql = format!(
            "{} {}",
            self.quote_identifier(&column.name),
            self.map_type(column.ty)
        );
        if column.nullable {
            if self.explicit_null() {
                sql.push_str(" NULL");
            }
        } else {
            sql.push_str(" NOT NULL");
        }
        if let Some(default) = &column.default {
            sql.push_str(" DEFAULT ");
            sql.push_str(&self.render_default(default));
        }
        if column.primary_key {
            sql.push_str(" PRIMARY KEY");
        }
        sql
    }

    /// Renders a CREATE TABLE statement without indexes.
    fn create_table_statement(&self, table: &Table, if_not_exists: bool) -> String {
        let mut sql = String::from("CREATE TABLE ");
        if if_not_exists {
            sql.push_str("IF NOT EXISTS ");
        }
        sql.push_str(&self.quote_identifier(&table.name));
        sql.push_str(" (\n");
        let columns: Vec<String> = table
            .columns
            .iter()
            .map(|c| format!("    {}", self.column_definition(c)))
            .collect();
        sql.push_str(&columns.join(",\n"));
        sql.push_str("\n)");
        sql
    }

    /// Renders CREATE TABLE followed by one CREATE INDEX per index.
    fn create_table(&self, table: &Table) -> Vec<String> {
        let mut statements = vec![self.create_table_statement(table, false)];
        statements.extend(table.indexes.iter().map(|i| self.create_index(&table.name, i)));
        statements
    }

    /// Renders CREATE [UNIQUE] INDEX.
    fn create_index(&self, table: &str, index: &Index) -> String {
        let columns: Vec<String> = index
            .columns
            .iter()
            .map(|c| self.quote_identifier(c))
            .collect();
        format!(
            "CREATE {}INDEX {} ON {} ({})",
            if index.unique { "UNIQUE " } else { "" },
            self.quote_identifier(&index.name),
            self.quote_identifier(table),
            columns.join(", ")
        )
    }

    /// Renders DROP INDEX.
    fn drop_index(&self, _table: &str, name: &str) -> String {
        format!("DROP INDEX {}", self.quote_identifier(name))
    }

    /// Renders an index rename. `index` is the index under its new name.
    fn rename_index(&self, table: &str, from: &str, index: &Index) -> Vec<String>;

    /// Renders ADD COLUMN.
    fn add_column(&self, _before: &Table, column: &Column, after: &Table) -> Vec<String> {
        vec![format!(
            "ALTER TABLE {} ADD COLUMN {}",
            self.quote_identifier(&after.name),
            self.column_definition(column)
        )]
    }

    /// Renders a change of type, nullability or default.
    ///
    /// `before` and `after` are the table around the operation.
    fn alter_column(&self, before: &Table, operation: &AlterOperation, after: &Table)
    -> Vec<String>;

    /// Renders one operation as one or more statements.
    fn alter_operation(
        &self,
        before: &Table,
        operation: &AlterOperation,
        after: &Table,
    ) -> Vec<String> {
        let table = self.quote_identifier(&after.name);
        match operation {
            AlterOperation::AddColumn { column } => self.add_column(before, column, after),
            AlterOperation::DropColumn { column } => vec![format!(
                "ALTER TABLE {table} DROP COLUMN {}",
                self.quote_identifier(column)
            )],
            AlterOperation::RenameColumn { from, to } => vec![format!(
                "ALTER TABLE {table} RENAME COLUMN {} TO {}",
                self.quote_identifier(from),
                self.quote_identifier(to)
            )],
            AlterOperation::ChangeType { .. }
            | AlterOperation::ChangeNullable { .. }
            | AlterOperation::ChangeDefault { .. } => self.alter_column(before, operation, after),
            AlterOperation::AddIndex { index } => vec![self.create_index(&after.name, index)],
            AlterOperation::DropIndex { name } => vec![self.drop_index(&after.name, name)],
            AlterOperation::RenameIndex { from, to } => after
                .index(to)
                .map(|index| self.rename_index(&after.name, from, index))
                .unwrap_or_default(),
        }
    }

    /// Renders a batch of operations, preserving their order.
    fn alter_table(&self, table: &Table, operations: &[AlterOperation]) -> Result<Vec<String>> {
        let mut working = table.clone();
        let mut statements = Vec::new();
        for operation in operations {
            let before = working.clone();
            operation.apply_to(&mut working)?;
            statements.extend(self.alter_operation(&before, operation, &working));
        }
        Ok(statements)
    }

    /// Renders every statement of `migration` against the schema before it.
    fn migration_statements(
        &self,
        snapshot: &SchemaSnapshot,
        migration: &Migration,
    ) -> Result<Vec<String>> {
        let mut working = snapshot.clone();
        let mut statements = Vec::new();
        for change in &migration.changes {
            match change {
                Change::CreateTable { table } => statements.extend(self.create_table(table)),
                Change::AlterTable { table, operations } => {
                    let current = working.require_table(table)?;
                    statements.extend(self.alter_table(current, operations)?);
                }
            }
            change.apply(&mut working)?;
        }
        Ok(statements)
    }
}
