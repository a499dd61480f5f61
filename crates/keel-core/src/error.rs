//! Error types for schema building, ledger replay and SQL compilation.

use crate::schema::ColumnType;

/// Errors raised by the engine.
///
/// Authoring errors name the table/column involved; when they happen inside a
/// migration unit they are wrapped in [`Error::Migration`] so the ledger build
/// reports which migration failed.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A table that does not exist in the current schema view.
    #[error("Table '{0}' does not exist")]
    UnknownTable(String),

    /// A table with this name already exists.
    #[error("Table '{0}' already exists")]
    DuplicateTable(String),

    /// A column that does not exist on the table.
    #[error("Column '{column}' does not exist in table '{table}'")]
    UnknownColumn {
        /// Table name.
        table: String,
        /// Column name.
        column: String,
    },

    /// A column with this name already exists on the table.
    #[error("Column '{column}' already exists in table '{table}'")]
    DuplicateColumn {
        /// Table name.
        table: String,
        /// Column name.
        column: String,
    },

    /// An index that does not exist on the table.
    #[error("Index '{index}' does not exist on table '{table}'")]
    UnknownIndex {
        /// Table name.
        table: String,
        /// Index name.
        index: String,
    },

    /// An index with this name already exists on the table.
    #[error("Index '{index}' already exists on table '{table}'")]
    DuplicateIndex {
        /// Table name.
        table: String,
        /// Index name.
        index: String,
    },

    /// A column that cannot be dropped while an index still covers it.
    #[error("Column '{column}' in table '{table}' is still covered by index '{index}'")]
    ColumnInUse {
        /// Table name.
        table: String,
        /// Column name.
        column: String,
        /// Covering index.
        index: String,
    },

    /// A column handle from one table was used on another.
    #[error("Column '{column}' belongs to another table than '{table}'")]
    ForeignColumnHandle {
        /// Table the handle was used on.
        table: String,
        /// Column named by the handle.
        column: String,
    },

    /// A composite index was requested with fewer than two columns.
    #[error("Composite index on '{table}' needs at least two columns, got {count}")]
    IndexTooNarrow {
        /// Table name.
        table: String,
        /// Number of columns supplied.
        count: usize,
    },

    /// A junction table without exactly two reference columns.
    #[error("Junction table '{table}' must have exactly two reference columns, found {found}")]
    InvalidJunction {
        /// Table name.
        table: String,
        /// Number of reference columns found.
        found: usize,
    },

    /// A primary key column marked nullable.
    #[error("Primary key column '{column}' in table '{table}' cannot be nullable")]
    NullablePrimaryKey {
        /// Table name.
        table: String,
        /// Column name.
        column: String,
    },

    /// A table declaring more than one primary key column.
    #[error("Table '{table}' has more than one primary key column ('{first}', '{second}')")]
    MultiplePrimaryKeys {
        /// Table name.
        table: String,
        /// First primary key column.
        first: String,
        /// Second primary key column.
        second: String,
    },

    /// An auto-increment column that is not an integer primary key.
    #[error("Column '{column}' in table '{table}' cannot auto-increment: {reason}")]
    InvalidAutoIncrement {
        /// Table name.
        table: String,
        /// Column name.
        column: String,
        /// What is wrong.
        reason: String,
    },

    /// A junction table column that gives the table an identity of its own.
    #[error("Junction table '{table}' cannot have column '{column}': {reason}")]
    InvalidJunctionColumn {
        /// Table name.
        table: String,
        /// Column name.
        column: String,
        /// What is wrong.
        reason: String,
    },

    /// A NaN or infinite float default.
    #[error("Column '{column}' has a non-finite float default")]
    NonFiniteDefault {
        /// Column name.
        column: String,
    },

    /// A NOT NULL column added to an existing table without a default.
    #[error("Column '{column}' added to '{table}' is NOT NULL but has no default")]
    NotNullWithoutDefault {
        /// Table name.
        table: String,
        /// Column name.
        column: String,
    },

    /// A default value on a column type that some dialect cannot default.
    #[error("Column '{column}' of type {ty} cannot have a default value ({dialect} forbids it)")]
    DefaultNotSupported {
        /// Column name.
        column: String,
        /// Column type.
        ty: ColumnType,
        /// The dialect that rejects it.
        dialect: &'static str,
    },

    /// An index over a column type that some dialect cannot index directly.
    #[error("Column '{column}' of type {ty} cannot be indexed ({dialect} forbids it)")]
    IndexNotSupported {
        /// Column name.
        column: String,
        /// Column type.
        ty: ColumnType,
        /// The dialect that rejects it.
        dialect: &'static str,
    },

    /// An unknown dialect name.
    #[error("Unknown SQL dialect '{0}' (expected postgres, mysql or sqlite)")]
    UnknownDialect(String),

    /// A migration name that is not `<14-digit timestamp>_<slug>`.
    #[error("Invalid migration name '{0}': expected <YYYYMMDDHHMMSS>_<slug>")]
    InvalidMigrationName(String),

    /// Two migrations registered under the same name.
    #[error("Migration '{0}' is registered more than once")]
    DuplicateMigration(String),

    /// An authoring error inside a migration.
    #[error("Migration '{name}' failed: {source}")]
    Migration {
        /// Migration name.
        name: String,
        /// Underlying error.
        #[source]
        source: Box<Error>,
    },

    /// A cached snapshot that does not match the replayed ledger.
    #[error("Schema snapshot is stale: replaying the migration history yields a different schema")]
    StaleSnapshot,

    /// A relation whose tables lack the columns the SQL needs.
    #[error("Cannot render relation {relation}: {reason}")]
    InvalidRelation {
        /// Relation description.
        relation: String,
        /// What is missing.
        reason: String,
    },

    /// A parameter used in a query but never declared.
    #[error("Parameter ':{0}' is used but not declared")]
    UndeclaredParam(String),

    /// A parameter declared twice.
    #[error("Parameter ':{0}' is declared more than once")]
    DuplicateParam(String),

    /// A parameter declared but never used.
    #[error("Parameter ':{0}' is declared but never used")]
    UnusedParam(String),

    /// A parameter used with a type other than its declared type.
    #[error("Parameter ':{name}' is declared as {declared} but used as {used}")]
    ParamTypeMismatch {
        /// Parameter name.
        name: String,
        /// Declared type.
        declared: ColumnType,
        /// Type at the use site.
        used: ColumnType,
    },

    /// A structurally invalid query.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Wraps this error with the name of the migration that raised it.
    #[must_use]
    pub fn in_migration(self, name: impl Into<String>) -> Self {
        match self {
            already @ Self::Migration { .. } => already,
            other => Self::Migration {
                name: name.into(),
                source: Box::new(other),
            },
        }
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
