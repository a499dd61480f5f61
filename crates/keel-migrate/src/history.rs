//! Applied-migration bookkeeping.
//!
//! Each database records the migrations applied to it in a reserved table.
//! The table is created through the same DDL generator as user tables, and
//! every query against it goes through the query compiler, so the
//! bookkeeping is identical across dialects.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use keel_core::dialect::DialectKind;
use keel_core::query::{CompiledQuery, Expr, Insert, Select, col};
use keel_core::schema::{Column, ColumnType, Table};
use sqlx::any::AnyArguments;
use sqlx::query::Query;
use sqlx::{Any, AnyConnection, AnyPool, Row};
use tracing::debug;

use crate::error::{MigrateError, Result};

/// The reserved bookkeeping table.
pub const MIGRATIONS_TABLE: &str = "_keel_migrations";

const NAME_TYPE: ColumnType = ColumnType::Varchar { length: 255 };
const APPLIED_AT_TYPE: ColumnType = ColumnType::Varchar { length: 64 };

/// Definition of the bookkeeping table.
#[must_use]
pub fn migrations_table() -> Table {
    let mut table = Table::new(MIGRATIONS_TABLE);
    let mut name = Column::new("name", NAME_TYPE);
    name.primary_key = true;
    table.columns.push(name);
    table.columns.push(Column::new("applied_at", APPLIED_AT_TYPE));
    table
}

/// A migration recorded as applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedMigration {
    /// Migration name.
    pub name: String,
    /// When it was applied.
    pub applied_at: DateTime<Utc>,
}

/// Compiled bookkeeping statements for one dialect.
#[derive(Debug, Clone)]
struct Statements {
    create: String,
    insert: CompiledQuery,
    select_all: CompiledQuery,
    select_one: CompiledQuery,
}

impl Statements {
    fn compile(dialect: DialectKind) -> Result<Self> {
        let insert = Insert::into_table(MIGRATIONS_TABLE)
            .bind("name", NAME_TYPE)
            .bind("applied_at", APPLIED_AT_TYPE)
            .build()?;
        let select_all = Select::from(MIGRATIONS_TABLE)
            .columns(&["name", "applied_at"])
            .order_by(col("name"))
            .build()?;
        let select_one = Select::from(MIGRATIONS_TABLE)
            .column(col("name"))
            .where_clause(col("name").eq(Expr::param("name", NAME_TYPE)))
            .param("name", NAME_TYPE)
            .build()?;
        Ok(Self {
            create: dialect
                .dialect()
                .create_table_statement(&migrations_table(), true),
            insert: insert.compile(dialect)?,
            select_all: select_all.compile(dialect)?,
            select_one: select_one.compile(dialect)?,
        })
    }
}

/// Binds string values to a compiled query in driver order.
fn bound<'q>(
    compiled: &'q CompiledQuery,
    values: &[(&str, &str)],
) -> Result<Query<'q, Any, AnyArguments<'q>>> {
    let mut query = sqlx::query(&compiled.sql);
    for name in &compiled.bind_order {
        let value = values
            .iter()
            .find(|(param, _)| *param == name.as_str())
            .map(|(_, value)| (*value).to_string())
            .ok_or_else(|| {
                MigrateError::InvalidState(format!("No value bound for parameter ':{name}'"))
            })?;
        query = query.bind(value);
    }
    Ok(query)
}

/// Manages the migration history table.
#[derive(Debug, Clone)]
pub struct MigrationHistory {
    pool: AnyPool,
    statements: Statements,
}

impl MigrationHistory {
    /// Creates a history manager for a database of the given dialect.
    pub fn new(pool: AnyPool, dialect: DialectKind) -> Result<Self> {
        Ok(Self {
            pool,
            statements: Statements::compile(dialect)?,
        })
    }

    /// Creates the bookkeeping table if it doesn't exist.
    pub async fn ensure_table(&self) -> Result<()> {
        debug!(sql = %self.statements.create, "Ensuring migration history table");
        sqlx::query(&self.statements.create)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Records a migration as applied, on the caller's connection.
    ///
    /// Called inside the transaction that ran the migration's DDL so the
    /// record commits or rolls back with it.
    pub async fn record_applied(&self, conn: &mut AnyConnection, name: &str) -> Result<()> {
        let applied_at = Utc::now().to_rfc3339();
        bound(
            &self.statements.insert,
            &[("name", name), ("applied_at", &applied_at)],
        )?
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Checks if a migration has been applied.
    pub async fn is_applied(&self, name: &str) -> Result<bool> {
        let row = bound(&self.statements.select_one, &[("name", name)])?
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    /// Returns every applied migration, ordered by name.
    pub async fn get_applied(&self) -> Result<Vec<AppliedMigration>> {
        let rows = bound(&self.statements.select_all, &[])?
            .fetch_all(&self.pool)
            .await?;

        let mut applied = Vec::with_capacity(rows.len());
        for row in rows {
            let name: String = row.try_get("name")?;
            let applied_at: String = row.try_get("applied_at")?;
            let applied_at = DateTime::parse_from_rfc3339(&applied_at)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| {
                    MigrateError::InvalidState(format!(
                        "Migration '{name}' has an unreadable applied_at '{applied_at}': {e}"
                    ))
                })?;
            applied.push(AppliedMigration { name, applied_at });
        }
        Ok(applied)
    }

    /// Returns the names of every applied migration.
    pub async fn applied_names(&self) -> Result<BTreeSet<String>> {
        Ok(self
            .get_applied()
            .await?
            .into_iter()
            .map(|m| m.name)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::any::AnyPoolOptions;

    async fn setup() -> MigrationHistory {
        sqlx::any::install_default_drivers();
        let pool = AnyPoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let history = MigrationHistory::new(pool, DialectKind::Sqlite).unwrap();
        history.ensure_table().await.unwrap();
        history
    }

    #[test]
    fn test_bookkeeping_sql_per_dialect() {
        let pg = Statements::compile(DialectKind::Postgres).unwrap();
        assert_eq!(
            pg.create,
            "CREATE TABLE IF NOT EXISTS \"_keel_migrations\" (\n    \"name\" VARCHAR(255) NOT NULL PRIMARY KEY,\n    \"applied_at\" VARCHAR(64) NOT NULL\n)"
        );
        assert_eq!(
            pg.insert.sql,
            r#"INSERT INTO "_keel_migrations" ("name", "applied_at") VALUES ($1, $2)"#
        );

        let mysql = Statements::compile(DialectKind::MySql).unwrap();
        assert_eq!(
            mysql.select_one.sql,
            "SELECT `name` FROM `_keel_migrations` WHERE `name` = ?"
        );
        assert_eq!(mysql.select_one.bind_order, ["name"]);
    }

    #[tokio::test]
    async fn test_ensure_table_is_idempotent() {
        let history = setup().await;
        history.ensure_table().await.unwrap();
        assert!(history.get_applied().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_record_and_check() {
        let history = setup().await;
        assert!(!history.is_applied("20240101000000_init").await.unwrap());

        let mut conn = history.pool.acquire().await.unwrap();
        history
            .record_applied(&mut *conn, "20240101000000_init")
            .await
            .unwrap();
        drop(conn);

        assert!(history.is_applied("20240101000000_init").await.unwrap());
        assert!(!history.is_applied("20240102000000_other").await.unwrap());
    }

    #[tokio::test]
    async fn test_get_applied_ordered() {
        let history = setup().await;
        let mut conn = history.pool.acquire().await.unwrap();
        for name in ["20240102000000_second", "20240101000000_first"] {
            history.record_applied(&mut *conn, name).await.unwrap();
        }
        drop(conn);

        let applied = history.get_applied().await.unwrap();
        let names: Vec<&str> = applied.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["20240101000000_first", "20240102000000_second"]);
        assert!(applied[0].applied_at <= Utc::now());
    }

    #[tokio::test]
    async fn test_duplicate_record_rejected() {
        let history = setup().await;
        let mut conn = history.pool.acquire().await.unwrap();
        history
            .record_applied(&mut *conn, "20240101000000_init")
            .await
            .unwrap();
        let err = history
            .record_applied(&mut *conn, "20240101000000_init")
            .await
            .unwrap_err();
        assert!(matches!(err, MigrateError::Database(_)));
    }
}
