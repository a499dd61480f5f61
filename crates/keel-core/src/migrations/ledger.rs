//! The ordered migration collection.

use std::collections::HashSet;

use tracing::debug;

use super::history::SchemaHistory;
use super::migration::{Migration, MigrationUnit, RegisteredUnit};
use super::name::MigrationName;
use super::plan::Plan;
use crate::error::{Error, Result};
use crate::schema::SchemaSnapshot;

#[derive(Debug, Clone)]
enum Source {
    Unit(RegisteredUnit),
    Document(Migration),
}

impl Source {
    fn name(&self) -> String {
        match self {
            Self::Unit(unit) => unit.name.to_string(),
            Self::Document(migration) => migration.name.to_string(),
        }
    }
}

/// Collects migrations and folds them into a [`SchemaHistory`].
///
/// Registration order does not matter: [`build`](Self::build) sorts by
/// timestamp (ties broken by name) and runs every unit exactly once.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    sources: Vec<Source>,
}

impl Ledger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a code-authored unit.
    pub fn register<M: MigrationUnit>(&mut self) -> &mut Self {
        self.sources.push(Source::Unit(RegisteredUnit::new::<M>()));
        self
    }

    /// Registers an authoring function under `name`.
    pub fn register_fn(&mut self, name: &'static str, up: fn(&mut Plan) -> Result<()>) -> &mut Self {
        self.sources.push(Source::Unit(RegisteredUnit { name, up }));
        self
    }

    /// Adds an already materialized migration, e.g. one loaded from disk.
    pub fn push_migration(&mut self, migration: Migration) -> &mut Self {
        self.sources.push(Source::Document(migration));
        self
    }

    /// Number of registered migrations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Runs every migration in order and returns the full history.
    ///
    /// The first failing migration aborts the build; the error names it.
    pub fn build(&self) -> Result<SchemaHistory> {
        let mut ordered = Vec::with_capacity(self.sources.len());
        let mut seen = HashSet::new();
        for source in &self.sources {
            let raw = source.name();
            let name = MigrationName::parse(&raw)?;
            if !seen.insert(name.clone()) {
                return Err(Error::DuplicateMigration(raw));
            }
            ordered.push((name, source));
        }
        ordered.sort_by(|a, b| a.0.cmp(&b.0));

        let mut snapshot = SchemaSnapshot::new();
        let mut migrations = Vec::with_capacity(ordered.len());
        for (name, source) in ordered {
            let migration = match source {
                Source::Unit(unit) => {
                    let mut plan = Plan::new(snapshot);
                    (unit.up)(&mut plan).map_err(|e| e.in_migration(name.to_string()))?;
                    let (next, changes) = plan.into_parts();
                    snapshot = next;
                    Migration::new(name, changes)
                }
                Source::Document(migration) => {
                    migration.apply(&mut snapshot)?;
                    migration.clone()
                }
            };
            debug!(
                migration = %migration.name,
                changes = migration.changes.len(),
                "Replayed migration"
            );
            migrations.push(migration);
        }

        Ok(SchemaHistory {
            migrations,
            snapshot,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::DeclareColumns;

    fn create_owners(plan: &mut Plan) -> Result<()> {
        plan.create_table("owners", |t| {
            t.varchar("name", 100).handle();
            Ok(())
        })
    }

    fn create_pets(plan: &mut Plan) -> Result<()> {
        plan.table("owners")?;
        plan.create_table("pets", |t| {
            t.bigint("owner_id").references("owners").indexed()?.handle();
            Ok(())
        })
    }

    #[test]
    fn test_sorted_by_timestamp_not_registration() {
        let history = Ledger::new()
            .register_fn("20240102000000_create_pets", create_pets)
            .register_fn("20240101000000_create_owners", create_owners)
            .build()
            .unwrap();
        let names: Vec<String> = history
            .migrations
            .iter()
            .map(|m| m.name.to_string())
            .collect();
        assert_eq!(
            names,
            ["20240101000000_create_owners", "20240102000000_create_pets"]
        );
        assert_eq!(history.snapshot.len(), 2);
    }

    #[test]
    fn test_failure_names_the_migration() {
        let err = Ledger::new()
            .register_fn("20240101000000_create_pets", create_pets)
            .build()
            .unwrap_err();
        match err {
            Error::Migration { name, source } => {
                assert_eq!(name, "20240101000000_create_pets");
                assert!(matches!(*source, Error::UnknownTable(t) if t == "owners"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let err = Ledger::new()
            .register_fn("20240101000000_create_owners", create_owners)
            .register_fn("20240101000000_create_owners", create_owners)
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateMigration(_)));
    }

    #[test]
    fn test_bad_name_rejected() {
        let err = Ledger::new()
            .register_fn("create_owners", create_owners)
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidMigrationName(_)));
    }

    #[test]
    fn test_replay_is_deterministic() {
        let mut ledger = Ledger::new();
        ledger
            .register_fn("20240101000000_create_owners", create_owners)
            .register_fn("20240102000000_create_pets", create_pets);
        assert_eq!(ledger.build().unwrap(), ledger.build().unwrap());
    }

    #[test]
    fn test_documents_mix_with_units() {
        let owners = Ledger::new()
            .register_fn("20240101000000_create_owners", create_owners)
            .build()
            .unwrap();
        let document = owners.migrations[0].clone();

        let history = Ledger::new()
            .register_fn("20240102000000_create_pets", create_pets)
            .push_migration(document)
            .build()
            .unwrap();
        assert!(history.snapshot.contains("pets"));
    }
}
