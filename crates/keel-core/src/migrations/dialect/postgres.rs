//! PostgreSQL DDL.

use super::MigrationDialect;
use crate::dialect::{Dialect, PostgresDialect};
use crate::migrations::operation::AlterOperation;
use crate::schema::{Column, ColumnType, Index, Table};

impl MigrationDialect for PostgresDialect {
    fn map_type(&self, ty: ColumnType) -> String {
        match ty {
            ColumnType::Integer => "INTEGER".to_string(),
            ColumnType::BigInt => "BIGINT".to_string(),
            ColumnType::Decimal { precision, scale } => format!("NUMERIC({precision}, {scale})"),
            ColumnType::Float => "DOUBLE PRECISION".to_string(),
            ColumnType::Bool => "BOOLEAN".to_string(),
            ColumnType::Varchar { length } => format!("VARCHAR({length})"),
            ColumnType::Text => "TEXT".to_string(),
            ColumnType::DateTime => "TIMESTAMP".to_string(),
            ColumnType::Timestamp => "TIMESTAMPTZ".to_string(),
            ColumnType::Binary => "BYTEA".to_string(),
            ColumnType::Json => "JSONB".to_string(),
        }
    }

    fn auto_increment_definition(&self, column: &Column) -> String {
        // PostgreSQL spells auto-increment as a serial pseudo-type
        let serial = match column.ty {
            ColumnType::BigInt => "BIGSERIAL",
            _ => "SERIAL",
        };
        format!("{} {serial} PRIMARY KEY", self.quote_identifier(&column.name))
    }

    fn rename_index(&self, _table: &str, from: &str, index: &Index) -> Vec<String> {
        vec![format!(
            "ALTER INDEX {} RENAME TO {}",
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
            AlterOperation::ChangeType { column, ty } => {
                let column = self.quote_identifier(column);
                let ty = self.map_type(*ty);
                format!("ALTER TABLE {table} ALTER COLUMN {column} TYPE {ty} USING {column}::{ty}")
            }
            AlterOperation::ChangeNullable { column, nullable } => format!(
                "ALTER TABLE {table} ALTER COLUMN {} {} NOT NULL",
                self.quote_identifier(column),
                if *nullable { "DROP" } else { "SET" }
            ),
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
