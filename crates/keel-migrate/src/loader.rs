//! Migration documents on disk and the schema artifact.
//!
//! A migrations directory holds one `<YYYYMMDDHHMMSS>_<slug>.json` document
//! per migration. Files without a `.json` extension are ignored; a `.json`
//! file whose stem is not a valid migration name is an error, as is a
//! document whose `name` disagrees with its file name.

use std::fs;
use std::path::{Path, PathBuf};

use keel_core::migrations::{Ledger, Migration, MigrationName, SchemaHistory};
use tracing::{debug, info};

use crate::error::{MigrateError, Result};

/// Lists the migration documents in `dir`, ordered by migration name.
pub fn discover(dir: &Path) -> Result<Vec<(MigrationName, PathBuf)>> {
    if !dir.is_dir() {
        return Err(MigrateError::MigrationsDirNotFound(dir.to_path_buf()));
    }

    let mut found = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() || path.extension().is_none_or(|ext| ext != "json") {
            continue;
        }
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        let name = MigrationName::parse(stem).map_err(|e| MigrateError::ParseError {
            path: path.clone(),
            message: e.to_string(),
        })?;
        found.push((name, path));
    }
    found.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(found)
}

/// Reads one migration document.
pub fn read_migration(path: &Path) -> Result<Migration> {
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| MigrateError::ParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Loads every migration document in `dir`, ordered by name.
pub fn load_migrations(dir: &Path) -> Result<Vec<Migration>> {
    let mut migrations = Vec::new();
    for (name, path) in discover(dir)? {
        let migration = read_migration(&path)?;
        if migration.name != name {
            return Err(MigrateError::ParseError {
                path,
                message: format!("document declares migration '{}'", migration.name),
            });
        }
        debug!(migration = %name, changes = migration.changes.len(), "Loaded migration");
        migrations.push(migration);
    }
    Ok(migrations)
}

/// Loads `dir` into a ledger.
pub fn load_ledger(dir: &Path) -> Result<Ledger> {
    let mut ledger = Ledger::new();
    for migration in load_migrations(dir)? {
        ledger.push_migration(migration);
    }
    Ok(ledger)
}

/// Writes a migration document into `dir`, named after the migration.
pub fn write_migration(dir: &Path, migration: &Migration) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("{}.json", migration.name));
    fs::write(&path, serde_json::to_string_pretty(migration)?)?;
    Ok(path)
}

/// Reads a schema artifact and checks it against its own history.
pub fn read_artifact(path: &Path) -> Result<SchemaHistory> {
    let content = fs::read_to_string(path)?;
    let history = SchemaHistory::from_json(&content)?;
    history.verify()?;
    Ok(history)
}

/// Loads the schema for `dir`, preferring the artifact at `artifact`.
///
/// Without an artifact the directory is replayed. When both exist the
/// artifact must hold exactly the migrations on disk, otherwise it is stale
/// and fails with [`MigrateError::InvalidState`].
pub fn load_schema(dir: &Path, artifact: &Path) -> Result<SchemaHistory> {
    if !artifact.exists() {
        return Ok(load_ledger(dir)?.build()?);
    }
    let history = read_artifact(artifact)?;
    if !dir.is_dir() {
        debug!(path = %artifact.display(), "No migrations directory, using artifact as is");
        return Ok(history);
    }
    if load_migrations(dir)? != history.migrations {
        return Err(MigrateError::InvalidState(format!(
            "schema artifact {} does not match {}, run `keel-migrate build`",
            artifact.display(),
            dir.display()
        )));
    }
    Ok(history)
}

/// Writes a schema artifact.
pub fn write_artifact(path: &Path, history: &SchemaHistory) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, history.to_json()?)?;
    info!(
        path = %path.display(),
        migrations = history.migrations.len(),
        tables = history.snapshot.len(),
        "Wrote schema artifact"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            discover(&missing),
            Err(MigrateError::MigrationsDirNotFound(p)) if p == missing
        ));
    }

    #[test]
    fn test_non_json_ignored_and_bad_names_rejected() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("README.md"), "notes").unwrap();
        assert!(discover(dir.path()).unwrap().is_empty());

        fs::write(dir.path().join("create_users.json"), "{}").unwrap();
        assert!(matches!(
            discover(dir.path()),
            Err(MigrateError::ParseError { .. })
        ));
    }

    #[test]
    fn test_unparseable_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("20240101000000_init.json");
        fs::write(&path, "not json").unwrap();
        let err = load_migrations(dir.path()).unwrap_err();
        assert!(matches!(err, MigrateError::ParseError { path: p, .. } if p == path));
    }
}
