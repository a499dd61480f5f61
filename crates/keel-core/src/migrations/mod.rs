//! Schema builders, migrations and the ledger.
//!
//! Migrations are authored against a [`Plan`], either in code through
//! [`MigrationUnit`] implementors or as serialized [`Migration`] documents.
//! A [`Ledger`] sorts them by timestamp and replays them into a
//! [`SchemaHistory`], whose DDL any [`MigrationDialect`] can render.
//!
//! # Example
//!
//! ```rust
//! use keel_core::dialect::DialectKind;
//! use keel_core::migrations::{DeclareColumns, Ledger, Plan};
//!
//! fn create_categories(plan: &mut Plan) -> keel_core::Result<()> {
//!     plan.create_table("categories", |t| {
//!         t.varchar("name", 100).unique()?.handle();
//!         Ok(())
//!     })
//! }
//!
//! fn create_pets(plan: &mut Plan) -> keel_core::Result<()> {
//!     plan.table("categories")?;
//!     plan.create_table("pets", |t| {
//!         t.varchar("name", 100).handle();
//!         t.bigint("category_id").references("categories").indexed()?.handle();
//!         Ok(())
//!     })
//! }
//!
//! let history = Ledger::new()
//!     .register_fn("20240101000000_create_categories", create_categories)
//!     .register_fn("20240102000000_create_pets", create_pets)
//!     .build()?;
//!
//! let ddl = history.ddl(DialectKind::Sqlite.dialect())?;
//! assert_eq!(ddl.len(), 2);
//! # Ok::<(), keel_core::Error>(())
//! ```

mod alter_builder;
mod column_builder;
pub mod dialect;
mod history;
mod ledger;
mod migration;
mod name;
mod operation;
mod plan;
mod table_builder;

pub use alter_builder::AlterTableBuilder;
pub use column_builder::{ColumnBuilder, ColumnRef, DeclareColumns, TableId};
pub use dialect::MigrationDialect;
pub use history::{MigrationDdl, SchemaHistory};
pub use ledger::Ledger;
pub use migration::{Migration, MigrationUnit, RegisteredUnit};
pub use name::MigrationName;
pub use operation::{AlterOperation, Change};
pub use plan::Plan;
pub use table_builder::TableBuilder;
