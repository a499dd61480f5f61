//! The serialized schema artifact.

use serde::{Deserialize, Serialize};

use super::dialect::MigrationDialect;
use super::migration::Migration;
use super::name::MigrationName;
use crate::error::{Error, Result};
use crate::schema::SchemaSnapshot;

/// Full migration history plus the snapshot it folds into.
///
/// This is what a ledger build produces and what downstream generators
/// consume. The snapshot is a cache; [`verify`](Self::verify) recomputes it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaHistory {
    /// Migrations in replay order.
    pub migrations: Vec<Migration>,
    /// Cumulative schema after the last migration.
    pub snapshot: SchemaSnapshot,
}

/// DDL for one migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationDdl {
    /// Migration name.
    pub name: MigrationName,
    /// Statements in execution order.
    pub statements: Vec<String>,
}

impl SchemaHistory {
    /// Folds `migrations` in order over an empty schema.
    pub fn replay(migrations: &[Migration]) -> Result<SchemaSnapshot> {
        let mut snapshot = SchemaSnapshot::new();
        for migration in migrations {
            migration.apply(&mut snapshot)?;
        }
        Ok(snapshot)
    }

    /// Builds a history from migrations in any order.
    pub fn from_migrations(mut migrations: Vec<Migration>) -> Result<Self> {
        migrations.sort_by(|a, b| a.name.cmp(&b.name));
        for pair in migrations.windows(2) {
            if pair[0].name == pair[1].name {
                return Err(Error::DuplicateMigration(pair[0].name.to_string()));
            }
        }
        let snapshot = Self::replay(&migrations)?;
        Ok(Self {
            migrations,
            snapshot,
        })
    }

    /// Checks that the cached snapshot matches a fresh replay.
    pub fn verify(&self) -> Result<()> {
        if Self::replay(&self.migrations)? == self.snapshot {
            Ok(())
        } else {
            Err(Error::StaleSnapshot)
        }
    }

    /// Serializes to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses JSON produced by [`to_json`](Self::to_json).
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Renders the DDL of every migration for `dialect`, in order.
    pub fn ddl(&self, dialect: &dyn MigrationDialect) -> Result<Vec<MigrationDdl>> {
        let mut snapshot = SchemaSnapshot::new();
        let mut out = Vec::with_capacity(self.migrations.len());
        for migration in &self.migrations {
            let statements = dialect
                .migration_statements(&snapshot, migration)
                .map_err(|e| e.in_migration(migration.name.to_string()))?;
            migration.apply(&mut snapshot)?;
            out.push(MigrationDdl {
                name: migration.name.clone(),
                statements,
            });
        }
        Ok(out)
    }
}
