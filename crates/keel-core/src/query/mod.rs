//! Portable query AST and its compiler.
//!
//! A [`Query`] is built once, serialized, and compiled later for any
//! [`DialectKind`](crate::dialect::DialectKind). Compiling the same query for
//! different dialects changes only surface syntax: identifier quoting,
//! placeholders, boolean literals, concatenation and pagination quirks.
//!
//! ```rust
//! use keel_core::dialect::DialectKind;
//! use keel_core::query::{Expr, Select, col};
//! use keel_core::schema::ColumnType;
//!
//! let query = Select::from("users")
//!     .columns(&["id", "email"])
//!     .where_clause(col("email").eq(Expr::param("email", ColumnType::Varchar { length: 255 })))
//!     .param("email", ColumnType::Varchar { length: 255 })
//!     .build()
//!     .unwrap();
//!
//! let pg = query.compile(DialectKind::Postgres).unwrap();
//! assert_eq!(pg.sql, r#"SELECT "id", "email" FROM "users" WHERE "email" = $1"#);
//!
//! let mysql = query.compile(DialectKind::MySql).unwrap();
//! assert_eq!(mysql.sql, "SELECT `id`, `email` FROM `users` WHERE `email` = ?");
//! ```

mod ast;
mod builder;
mod compiler;

pub use ast::{
    AggregateFunction, Assignment, BinaryOp, DeleteStatement, Expr, InsertStatement, Join,
    JoinType, Literal, OrderBy, OrderDirection, ParamDecl, Query, SelectColumn, SelectStatement,
    Statement, TableRef, UpdateStatement,
};
pub use builder::{Delete, Insert, Select, Update, col, qualified};
pub use compiler::{CompiledQuery, compile, compile_with};
