//! Applies keel migration ledgers to live databases.
//!
//! `keel-core` turns a ledger of migrations into a schema artifact and
//! per-dialect DDL without touching a database. This crate does the I/O:
//!
//! - **Loader** - reads migration documents from a directory and reads or
//!   writes the schema artifact
//! - **History** - records applied migrations in a reserved table
//! - **Executor** - applies unapplied migrations, one transaction each
//! - **Config** - the development and test databases to migrate
//!
//! # Example
//!
//! ```rust,no_run
//! use keel_migrate::prelude::*;
//!
//! # async fn run() -> keel_migrate::error::Result<()> {
//! let schema = load_ledger("migrations".as_ref())?.build()?;
//! let config = MigrateConfig::from_urls(Some("sqlite:app.db"), None, None)?;
//! for target in &config.targets {
//!     let report = MigrationExecutor::connect(target).await?.apply(&schema).await?;
//!     println!("{}: {} applied", target.name, report.applied.len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # CLI Usage
//!
//! ```bash
//! # Replay migrations/ into schema.json
//! keel-migrate build
//!
//! # Print the DDL for one dialect
//! keel-migrate --dialect mysql sql
//!
//! # Apply to DATABASE_URL, then TEST_DATABASE_URL if set
//! keel-migrate migrate
//! ```

pub mod config;
pub mod error;
pub mod executor;
pub mod history;
pub mod loader;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::config::{MigrateConfig, Target};
    pub use crate::error::{MigrateError, Result};
    pub use crate::executor::{ApplyReport, MigrationExecutor, MigrationStatus};
    pub use crate::history::{AppliedMigration, MIGRATIONS_TABLE, MigrationHistory};
    pub use crate::loader::{
        load_ledger, load_migrations, load_schema, read_artifact, write_artifact,
    };
}
