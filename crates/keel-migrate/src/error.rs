//! Error types for applying migrations.

use std::path::PathBuf;

/// Errors that can occur while loading or applying migrations.
#[derive(Debug, thiserror::Error)]
pub enum MigrateError {
    /// Schema, ledger or SQL generation error.
    #[error(transparent)]
    Core(#[from] keel_core::Error),

    /// A DDL statement failed. The migration was not recorded.
    #[error("Migration '{migration}' failed: {source}")]
    Apply {
        /// The failing migration.
        migration: String,
        /// Driver error.
        #[source]
        source: sqlx::Error,
    },

    /// Database error outside a migration's DDL.
    #[error("Database: {0}")]
    Database(#[from] sqlx::Error),

    /// IO error (reading migration files, writing the artifact).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A migration document that cannot be read.
    #[error("Migration document '{path}' is invalid: {message}")]
    ParseError {
        /// Offending file.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// The migrations directory does not exist.
    #[error("No migrations directory at '{0}'")]
    MigrationsDirNotFound(PathBuf),

    /// Missing or contradictory configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid migration state.
    #[error("Inconsistent migration history: {0}")]
    InvalidState(String),

    /// JSON encoding or decoding failed.
    #[error("JSON: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, MigrateError>;
