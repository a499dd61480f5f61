//! MySQL DDL.

use super::MigrationDialect;
use crate::dialect::{Dialect, MySqlDialect};
use crate::migrations::operation::AlterOperation;
use crate::schema::{Column, ColumnType, Index, Table};

impl MySqlDialect {
    /// Column definition for `MODIFY COLUMN`, which must not repeat PRIMARY KEY.
    fn modify_definition(&self, column: &Column) -> String {
        let mut sql = format!(
            "{} {}",
            self.quote_identifier(&column.name),
            self.map_type(column.ty)
        );
        sql.push_str(if column.nullable { " NULL" } else { " NOT NULL" });
        if column.auto_increment {
            sql.push_str(" AUTO_INCREMENT");
        }
        if let Some(default) = &column.default {
            sql.push_str(" DEFAULT ");
            sql.push_str(&self.render_default(default));
        }
        sql
    }
}

impl MigrationDialect for MySqlDialect {
    fn map_type(&self, ty: ColumnType) -> String {
        match ty {
            ColumnType::Integer => "INT".to_string(),
            ColumnType::BigInt => "BIGINT".to_string(),
            ColumnType::Decimal { precision, scale } => format!("DECIMAL({precision}, {scale})"),
            ColumnType::Float => "DOUBLE".to_string(),
            ColumnType::Bool => "BOOLEAN".to_string(),
            ColumnType::Varchar { length } => format!("VARCHAR({length})"),
            ColumnType::Text => "TEXT".to_string(),
            ColumnType::DateTime => "DATETIME".to_string(),
            ColumnType::Timestamp => "TIMESTAMP".to_string(),
            ColumnType::Binary => "LONGBLOB".to_string(),
            ColumnType::Json => "JSON".to_string(),
        }
    }

    fn explicit_null(&self) -> bool {
        // TIMESTAMP columns are implicitly NOT NULL unless NULL is spelled out
        true
    }

    fn auto_increment_definition(&self, column: &Column) -> String {
        format!(
            "{} {} NOT NULL AUTO_INCREMENT PRIMARY KEY",
            self.quote_identifier(&column.name),
            self.map_type(column.ty)
        )
    }

    fn drop_index(&self, table: &str, name: &str) -> String {
        format!(
            "DROP INDEX {} ON {}",
            self.quote_identifier(name),
            self.quote_identifier(table)
        )
    }

    fn rename_index(&self, table: &str, from: &str, index: &Index) -> Vec<String> {
        vec![format!(
            "ALTER TABLE {} RENAME INDEX {} TO {}",
            self.quote_identifier(table),
            self.quote_identifier(from),
            self.quote_identifier(&index.name)
        )]
    }

    fn alter_column(
        &self,
        _before: &Table,
        operation: &AlterOperation,
        after: &Table,
    ) -> Vec<String> {
        let table = self.quote_identifier(&after.name);
        let sql = match operation {
            AlterOperation::ChangeType { column, .. }
            | AlterOperation::ChangeNullable { column, .. } => {
                let Some(column) = after.column(column) else {
                    return Vec::new();
                };
                format!(
                    "ALTER TABLE {table} MODIFY COLUMN {}",
                    self.modify_definition(column)
                )
            }
            AlterOperation::ChangeDefault {
                column,
                default: Some(default),
            } => format!(
                "ALTER TABLE {table} ALTER COLUMN {} SET DEFAULT {}",
                self.quote_identifier(column),
                self.render_default(default)
            ),
            AlterOperation::ChangeDefault {
                column,
                default: None,
            } => format!(
                "ALTER TABLE {table} ALTER COLUMN {} DROP DEFAULT",
                self.quote_identifier(column)
            ),
            _ => return Vec::new(),
        };
        vec![sql]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::{AlterTableBuilder, DeclareColumns, TableBuilder};

    #[test]
    fn test_mysql_types() {
        let dialect = MySqlDialect::new();
        assert_eq!(dialect.map_type(ColumnType::Integer), "INT");
        assert_eq!(dialect.map_type(ColumnType::Float), "DOUBLE");
        assert_eq!(dialect.map_type(ColumnType::Binary), "LONGBLOB");
        assert_eq!(dialect.map_type(ColumnType::DateTime), "DATETIME");
    }

    #[test]
    fn test_create_table() {
        let dialect = MySqlDialect::new();
        let statements = dialect.create_table(&TableBuilder::new("users").build().unwrap());
        assert_eq!(
            statements[0],
            "CREATE TABLE `users` (\n    `id` BIGINT NOT NULL AUTO_INCREMENT PRIMARY KEY,\n    \
             `public_id` VARCHAR(36) NOT NULL,\n    \
             `created_at` TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,\n    \
             `updated_at` TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,\n    \
             `deleted_at` TIMESTAMP NULL\n)"
        );
        assert_eq!(
            statements[1],
            "CREATE UNIQUE INDEX `idx_users_public_id` ON `users` (`public_id`)"
        );
    }

    #[test]
    fn test_modify_column() {
        let dialect = MySqlDialect::new();
        let mut users = TableBuilder::empty("users");
        users.varchar("email", 255).handle();
        let table = users.build().unwrap();

        let mut alter = AlterTableBuilder::new(&table);
        let email = alter.column("email").unwrap();
        alter.set_nullable(&email, true).unwrap();
        alter.change_type(&email, ColumnType::Varchar { length: 320 }).unwrap();
        alter.set_default(&email, "").unwrap();
        assert_eq!(
            dialect.alter_table(&table, alter.operations()).unwrap(),
            [
                "ALTER TABLE `users` MODIFY COLUMN `email` VARCHAR(255) NULL",
                "ALTER TABLE `users` MODIFY COLUMN `email` VARCHAR(320) NULL",
                "ALTER TABLE `users` ALTER COLUMN `email` SET DEFAULT ''",
            ]
        );
    }

    #[test]
    fn test_index_statements() {
        let dialect = MySqlDialect::new();
        let mut users = TableBuilder::empty("users");
        users.varchar("email", 255).indexed().unwrap().handle();
        let table = users.build().unwrap();

        let mut alter = AlterTableBuilder::new(&table);
        alter.rename_index("idx_users_email", "users_email").unwrap();
        alter.drop_index("users_email").unwrap();
        assert_eq!(
            dialect.alter_table(&table, alter.operations()).unwrap(),
            [
                "ALTER TABLE `users` RENAME INDEX `idx_users_email` TO `users_email`",
                "DROP INDEX `users_email` ON `users`",
            ]
        );
    }
}
