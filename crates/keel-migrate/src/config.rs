//! Resolved database targets.

use keel_core::dialect::DialectKind;

use crate::error::{MigrateError, Result};

/// One database to migrate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Label used in logs and reports.
    pub name: String,
    /// Connection URL.
    pub url: String,
    /// SQL dialect of the database.
    pub dialect: DialectKind,
}

impl Target {
    /// Creates a target, inferring the dialect from the URL unless given.
    pub fn new(name: &str, url: &str, dialect: Option<DialectKind>) -> Result<Self> {
        let dialect = match dialect {
            Some(dialect) => dialect,
            None => DialectKind::from_url(url)?,
        };
        Ok(Self {
            name: name.to_string(),
            url: url.to_string(),
            dialect,
        })
    }
}

/// Databases a ledger is applied to, in order.
///
/// Each target is migrated independently; the development database comes
/// first, the test database (if any) second.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrateConfig {
    /// Targets in application order.
    pub targets: Vec<Target>,
}

impl MigrateConfig {
    /// Builds the configuration from the development and optional test URLs.
    ///
    /// `dialect` overrides URL inference for every target.
    pub fn from_urls(
        database_url: Option<&str>,
        test_database_url: Option<&str>,
        dialect: Option<DialectKind>,
    ) -> Result<Self> {
        let database_url = database_url
            .filter(|url| !url.is_empty())
            .ok_or_else(|| MigrateError::InvalidConfig("DATABASE_URL is not set".into()))?;

        let mut targets = vec![Target::new("development", database_url, dialect)?];
        if let Some(url) = test_database_url.filter(|url| !url.is_empty()) {
            if url == database_url {
                return Err(MigrateError::InvalidConfig(
                    "TEST_DATABASE_URL must differ from DATABASE_URL".into(),
                ));
            }
            targets.push(Target::new("test", url, dialect)?);
        }
        Ok(Self { targets })
    }

    /// The development target.
    #[must_use]
    pub fn primary(&self) -> Option<&Target> {
        self.targets.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialect_inferred_per_target() {
        let config = MigrateConfig::from_urls(
            Some("postgres://localhost/app"),
            Some("sqlite::memory:"),
            None,
        )
        .unwrap();
        assert_eq!(config.targets.len(), 2);
        assert_eq!(config.targets[0].name, "development");
        assert_eq!(config.targets[0].dialect, DialectKind::Postgres);
        assert_eq!(config.targets[1].dialect, DialectKind::Sqlite);
    }

    #[test]
    fn test_override_wins() {
        let config =
            MigrateConfig::from_urls(Some("mariadb://db/app"), None, Some(DialectKind::MySql))
                .unwrap();
        assert_eq!(config.primary().unwrap().dialect, DialectKind::MySql);
    }

    #[test]
    fn test_missing_or_unknown_url() {
        assert!(matches!(
            MigrateConfig::from_urls(None, None, None),
            Err(MigrateError::InvalidConfig(_))
        ));
        assert!(matches!(
            MigrateConfig::from_urls(Some("mssql://db"), None, None),
            Err(MigrateError::Core(keel_core::Error::UnknownDialect(_)))
        ));
        assert!(matches!(
            MigrateConfig::from_urls(Some("sqlite:a.db"), Some("sqlite:a.db"), None),
            Err(MigrateError::InvalidConfig(_))
        ));
    }
}
