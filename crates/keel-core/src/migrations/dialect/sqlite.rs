//! SQLite DDL.
//!
//! SQLite cannot change a column's type, nullability or default in place, and
//! cannot add a column whose default is not constant. Those operations are
//! emitted as a table rebuild: create a copy with the new shape, copy the
//! rows, drop the original, rename the copy and recreate the indexes.

use super::MigrationDialect;
use crate::dialect::{Dialect, SqliteDialect};
use crate::migrations::operation::AlterOperation;
use crate::schema::{Column, ColumnType, DefaultValue, Index, Table};

/// Prefix of the scratch table used while rebuilding.
const REBUILD_PREFIX: &str = "_keel_rebuild_";

impl SqliteDialect {
    /// Statements that rebuild `before` into the shape of `after`.
    ///
    /// Columns present in both are copied by name.
    pub fn rebuild_table(&self, before: &Table, after: &Table) -> Vec<String> {
        let scratch = Table {
            name: format!("{REBUILD_PREFIX}{}", after.name),
            columns: after.columns.clone(),
            indexes: Vec::new(),
            junction: after.junction,
        };
        let shared: Vec<String> = after
            .columns
            .iter()
            .filter(|c| before.column(&c.name).is_some())
            .map(|c| self.quote_identifier(&c.name))
            .collect();
        let shared = shared.join(", ");

        let mut statements = vec![
            self.create_table_statement(&scratch, false),
            format!(
                "INSERT INTO {} ({shared}) SELECT {shared} FROM {}",
                self.quote_identifier(&scratch.name),
                self.quote_identifier(&before.name)
            ),
            format!("DROP TABLE {}", self.quote_identifier(&before.name)),
            format!(
                "ALTER TABLE {} RENAME TO {}",
                self.quote_identifier(&scratch.name),
                self.quote_identifier(&after.name)
            ),
        ];
        statements.extend(after.indexes.iter().map(|i| self.create_index(&after.name, i)));
        statements
    }
}

impl MigrationDialect for SqliteDialect {
    fn map_type(&self, ty: ColumnType) -> String {
        // SQLite has type affinity rather than strict types
        match ty {
            ColumnType::Integer | ColumnType::BigInt | ColumnType::Bool => "INTEGER",
            ColumnType::Decimal { .. } => "NUMERIC",
            ColumnType::Float => "REAL",
            ColumnType::Varchar { .. }
            | ColumnType::Text
            | ColumnType::DateTime
            | ColumnType::Timestamp
            | ColumnType::Json => "TEXT",
            ColumnType::Binary => "BLOB",
        }
        .to_string()
    }

    fn auto_increment_definition(&self, column: &Column) -> String {
        // Only INTEGER PRIMARY KEY aliases the rowid
        format!(
            "{} INTEGER PRIMARY KEY AUTOINCREMENT",
            self.quote_identifier(&column.name)
        )
    }

    fn rename_index(&self, table: &str, from: &str, index: &Index) -> Vec<String> {
        vec![self.drop_index(table, from), self.create_index(table, index)]
    }

    fn alter_column(&self, before: &Table, operation: &AlterOperation, after: &Table) -> Vec<String> {
        match operation {
            AlterOperation::ChangeType { .. }
            | AlterOperation::ChangeNullable { .. }
            | AlterOperation::ChangeDefault { .. } => self.rebuild_table(before, after),
            _ => Vec::new(),
        }
    }

    fn add_column(&self, before: &Table, column: &Column, after: &Table) -> Vec<String> {
        if column.default == Some(DefaultValue::CurrentTimestamp) {
            return self.rebuild_table(before, after);
        }
        vec![format!(
            "ALTER TABLE {} ADD COLUMN {}",
            self.quote_identifier(&after.name),
            self.column_definition(column)
        )]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::{AlterTableBuilder, DeclareColumns, TableBuilder};

    fn users() -> Table {
        let mut users = TableBuilder::empty("users");
        users.bigint("id").primary_key().auto_increment().handle();
        users.varchar("email", 255).indexed().unwrap().handle();
        users.integer("age").nullable().handle();
        users.build().unwrap()
    }

    #[test]
    fn test_sqlite_types() {
        let dialect = SqliteDialect::new();
        assert_eq!(dialect.map_type(ColumnType::BigInt), "INTEGER");
        assert_eq!(dialect.map_type(ColumnType::Bool), "INTEGER");
        assert_eq!(dialect.map_type(ColumnType::Varchar { length: 10 }), "TEXT");
        assert_eq!(dialect.map_type(ColumnType::Binary), "BLOB");
    }

    #[test]
    fn test_create_table() {
        let dialect = SqliteDialect::new();
        let statements = dialect.create_table(&users());
        assert_eq!(
            statements,
            [
                "CREATE TABLE \"users\" (\n    \"id\" INTEGER PRIMARY KEY AUTOINCREMENT,\n    \
                 \"email\" TEXT NOT NULL,\n    \"age\" INTEGER\n)",
                "CREATE INDEX \"idx_users_email\" ON \"users\" (\"email\")",
            ]
        );
    }

    #[test]
    fn test_change_nullable_rebuilds() {
        let dialect = SqliteDialect::new();
        let table = users();
        let mut alter = AlterTableBuilder::new(&table);
        let age = alter.column("age").unwrap();
        alter.set_nullable(&age, false).unwrap();

        let statements = dialect.alter_table(&table, alter.operations()).unwrap();
        assert_eq!(
            statements,
            [
                "CREATE TABLE \"_keel_rebuild_users\" (\n    \
                 \"id\" INTEGER PRIMARY KEY AUTOINCREMENT,\n    \
                 \"email\" TEXT NOT NULL,\n    \"age\" INTEGER NOT NULL\n)",
                "INSERT INTO \"_keel_rebuild_users\" (\"id\", \"email\", \"age\") \
                 SELECT \"id\", \"email\", \"age\" FROM \"users\"",
                "DROP TABLE \"users\"",
                "ALTER TABLE \"_keel_rebuild_users\" RENAME TO \"users\"",
                "CREATE INDEX \"idx_users_email\" ON \"users\" (\"email\")",
            ]
        );
    }

    #[test]
    fn test_add_timestamp_column_rebuilds() {
        let dialect = SqliteDialect::new();
        let table = users();
        let mut alter = AlterTableBuilder::new(&table);
        alter
            .timestamp("seen_at")
            .default(DefaultValue::CurrentTimestamp)
            .unwrap()
            .handle();
        let statements = dialect.alter_table(&table, alter.operations()).unwrap();
        assert_eq!(statements.len(), 5);
        assert!(statements[1].ends_with("SELECT \"id\", \"email\", \"age\" FROM \"users\""));
    }

    #[test]
    fn test_plain_add_and_rename_index() {
        let dialect = SqliteDialect::new();
        let table = users();
        let mut alter = AlterTableBuilder::new(&table);
        alter.text("bio").nullable().handle();
        alter.rename_index("idx_users_email", "users_email").unwrap();
        assert_eq!(
            dialect.alter_table(&table, alter.operations()).unwrap(),
            [
                "ALTER TABLE \"users\" ADD COLUMN \"bio\" TEXT",
                "DROP INDEX \"idx_users_email\"",
                "CREATE INDEX \"users_email\" ON \"users\" (\"email\")",
            ]
        );
    }
}
