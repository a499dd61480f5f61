//! Applying a schema history to a live database.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use keel_core::dialect::DialectKind;
use keel_core::migrations::{MigrationDdl, SchemaHistory};
use sqlx::AnyPool;
use sqlx::any::AnyPoolOptions;
use tracing::{debug, info, warn};

use crate::config::Target;
use crate::error::{MigrateError, Result};
use crate::history::MigrationHistory;

/// Outcome of one [`MigrationExecutor::apply`] run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Migrations applied by this run, in order.
    pub applied: Vec<String>,
    /// Migrations that were already applied.
    pub skipped: Vec<String>,
    /// Applied migrations the ledger no longer contains.
    pub orphans: Vec<String>,
}

/// Applied state of one ledger migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    /// Migration name.
    pub name: String,
    /// When it was applied, if it was.
    pub applied_at: Option<DateTime<Utc>>,
}

impl MigrationStatus {
    /// Whether the migration has been applied.
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        self.applied_at.is_some()
    }
}

/// Applies migrations to one database.
#[derive(Debug, Clone)]
pub struct MigrationExecutor {
    pool: AnyPool,
    dialect: DialectKind,
    history: MigrationHistory,
    dry_run: bool,
}

impl MigrationExecutor {
    /// Creates an executor over an existing pool.
    pub fn new(pool: AnyPool, dialect: DialectKind) -> Result<Self> {
        let history = MigrationHistory::new(pool.clone(), dialect)?;
        Ok(Self {
            pool,
            dialect,
            history,
            dry_run: false,
        })
    }

    /// Connects to a target.
    pub async fn connect(target: &Target) -> Result<Self> {
        sqlx::any::install_default_drivers();
        let pool = AnyPoolOptions::new().connect(&target.url).await?;
        info!(database = %target.name, dialect = %target.dialect, "Connected");
        Self::new(pool, target.dialect)
    }

    /// Sets dry-run mode: DDL is logged, never executed or recorded. The
    /// bookkeeping table is still created.
    #[must_use]
    pub const fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// The dialect DDL is rendered in.
    #[must_use]
    pub const fn dialect(&self) -> DialectKind {
        self.dialect
    }

    /// The history manager.
    #[must_use]
    pub const fn history(&self) -> &MigrationHistory {
        &self.history
    }

    /// Creates the bookkeeping table.
    pub async fn init(&self) -> Result<()> {
        self.history.ensure_table().await
    }

    /// Renders the DDL for every migration in `schema`.
    pub fn render(&self, schema: &SchemaHistory) -> Result<Vec<MigrationDdl>> {
        Ok(schema.ddl(self.dialect.dialect())?)
    }

    /// Applies every unapplied migration in ledger order.
    ///
    /// Each migration runs in its own transaction together with its history
    /// record. A failure rolls back that migration and stops the run;
    /// migrations applied before it stay applied.
    pub async fn apply(&self, schema: &SchemaHistory) -> Result<ApplyReport> {
        self.init().await?;
        let applied = self.history.applied_names().await?;
        let mut report = ApplyReport::default();

        for MigrationDdl { name, statements } in self.render(schema)? {
            let name = name.to_string();
            if applied.contains(&name) {
                debug!(migration = %name, "Migration already applied, skipping");
                report.skipped.push(name);
                continue;
            }

            info!(migration = %name, statements = statements.len(), "Applying migration");
            if self.dry_run {
                for sql in &statements {
                    info!(sql = %sql, "Would execute SQL");
                }
                report.applied.push(name);
                continue;
            }

            let mut tx = self.pool.begin().await?;
            for sql in &statements {
                debug!(sql = %sql, "Executing SQL");
                sqlx::query(sql)
                    .execute(&mut *tx)
                    .await
                    .map_err(|source| MigrateError::Apply {
                        migration: name.clone(),
                        source,
                    })?;
            }
            self.history.record_applied(&mut *tx, &name).await?;
            tx.commit().await?;
            info!(migration = %name, "Migration applied successfully");
            report.applied.push(name);
        }

        report.orphans = orphans(schema, &applied);
        for orphan in &report.orphans {
            warn!(migration = %orphan, "Applied migration is missing from the ledger");
        }
        Ok(report)
    }

    /// Returns the applied state of every ledger migration.
    pub async fn status(&self, schema: &SchemaHistory) -> Result<Vec<MigrationStatus>> {
        self.init().await?;
        let applied = self.history.get_applied().await?;
        Ok(schema
            .migrations
            .iter()
            .map(|m| {
                let name = m.name.to_string();
                let applied_at = applied
                    .iter()
                    .find(|a| a.name == name)
                    .map(|a| a.applied_at);
                MigrationStatus { name, applied_at }
            })
            .collect())
    }

    /// Returns the applied migrations the ledger does not contain.
    pub async fn orphans(&self, schema: &SchemaHistory) -> Result<Vec<String>> {
        self.init().await?;
        Ok(orphans(schema, &self.history.applied_names().await?))
    }
}

fn orphans(schema: &SchemaHistory, applied: &BTreeSet<String>) -> Vec<String> {
    let known: BTreeSet<String> = schema.migrations.iter().map(|m| m.name.to_string()).collect();
    applied.difference(&known).cloned().collect()
}
