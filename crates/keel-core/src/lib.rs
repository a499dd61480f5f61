//! # keel-core
//!
//! A portable schema, migration and query engine for PostgreSQL, MySQL and
//! SQLite.
//!
//! This crate provides:
//! - A schema model and fluent builders that keep columns and their indexes
//!   in step
//! - A migration ledger that replays timestamped migrations into a schema
//!   snapshot and renders per-dialect DDL
//! - Relation inference from logical references, with JSON-nesting SELECTs
//! - A serializable query AST compiled to parameterized SQL per dialect
//!
//! The engine is synchronous and does no I/O. Applying migrations to a live
//! database lives in `keel-migrate`.
//!
//! ## Schema and DDL
//!
//! ```rust
//! use keel_core::prelude::*;
//!
//! fn create_users(plan: &mut Plan) -> keel_core::Result<()> {
//!     plan.create_table("users", |t| {
//!         t.varchar("email", 255).unique()?.handle();
//!         t.text("bio").nullable().handle();
//!         Ok(())
//!     })
//! }
//!
//! let history = Ledger::new()
//!     .register_fn("20240101000000_create_users", create_users)
//!     .build()?;
//! let ddl = history.ddl(DialectKind::Postgres.dialect())?;
//! assert!(ddl[0].statements[0].starts_with(r#"CREATE TABLE "users""#));
//! # Ok::<(), keel_core::Error>(())
//! ```
//!
//! ## Queries
//!
//! ```rust
//! use keel_core::prelude::*;
//! use keel_core::query::col;
//!
//! let query = Select::from("users")
//!     .where_clause(col("id").eq(Expr::param("id", ColumnType::BigInt)))
//!     .param("id", ColumnType::BigInt)
//!     .build()?;
//! assert_eq!(
//!     query.compile(DialectKind::Sqlite)?.sql,
//!     r#"SELECT * FROM "users" WHERE "id" = ?1"#
//! );
//! # Ok::<(), keel_core::Error>(())
//! ```

pub mod dialect;
pub mod error;
pub mod migrations;
pub mod query;
pub mod relations;
pub mod schema;

pub use error::{Error, Result};

/// Commonly used items.
pub mod prelude {
    pub use crate::dialect::{Dialect, DialectKind};
    pub use crate::error::{Error, Result};
    pub use crate::migrations::{
        AlterTableBuilder, DeclareColumns, Ledger, Migration, MigrationDialect, MigrationUnit,
        Plan, SchemaHistory, TableBuilder,
    };
    pub use crate::query::{CompiledQuery, Expr, Query, Select};
    pub use crate::relations::{Relation, RelationKind};
    pub use crate::schema::{ColumnType, DefaultValue, SchemaSnapshot};
}
