//! Migrations and the authoring-unit trait.

use serde::{Deserialize, Serialize};

use super::name::MigrationName;
use super::operation::Change;
use super::plan::Plan;
use crate::error::Result;
use crate::schema::SchemaSnapshot;

/// One named, timestamped unit of schema change.
///
/// Immutable once produced; the changes are replayed in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Migration {
    /// Migration name.
    pub name: MigrationName,
    /// Changes in declaration order.
    pub changes: Vec<Change>,
}

impl Migration {
    /// Creates a migration from its parts.
    #[must_use]
    pub const fn new(name: MigrationName, changes: Vec<Change>) -> Self {
        Self { name, changes }
    }

    /// Applies every change to `snapshot`.
    ///
    /// Errors are wrapped with the migration name.
    pub fn apply(&self, snapshot: &mut SchemaSnapshot) -> Result<()> {
        for change in &self.changes {
            change
                .apply(snapshot)
                .map_err(|e| e.in_migration(self.name.to_string()))?;
        }
        Ok(())
    }
}

/// A code-authored migration.
///
/// # Example
///
/// ```rust
/// use keel_core::migrations::{DeclareColumns, Ledger, MigrationUnit, Plan};
///
/// struct CreateUsers;
///
/// impl MigrationUnit for CreateUsers {
///     const NAME: &'static str = "20240101000000_create_users";
///
///     fn up(plan: &mut Plan) -> keel_core::Result<()> {
///         plan.create_table("users", |t| {
///             t.varchar("email", 255).unique()?.handle();
///             Ok(())
///         })
///     }
/// }
///
/// let history = Ledger::new().register::<CreateUsers>().build()?;
/// assert!(history.snapshot.contains("users"));
/// # Ok::<(), keel_core::Error>(())
/// ```
pub trait MigrationUnit {
    /// `<YYYYMMDDHHMMSS>_<slug>`.
    const NAME: &'static str;

    /// Records this migration's changes on the plan.
    ///
    /// Look up existing tables with [`Plan::table`]; a missing table fails
    /// the whole build.
    fn up(plan: &mut Plan) -> Result<()>;
}

/// A unit in runtime-accessible form.
#[derive(Debug, Clone, Copy)]
pub struct RegisteredUnit {
    /// Migration name, not yet validated.
    pub name: &'static str,
    /// The authoring function.
    pub up: fn(&mut Plan) -> Result<()>,
}

impl RegisteredUnit {
    /// Captures a [`MigrationUnit`] implementor.
    #[must_use]
    pub const fn new<M: MigrationUnit>() -> Self {
        Self {
            name: M::NAME,
            up: M::up,
        }
    }
}
