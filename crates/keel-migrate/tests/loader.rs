mod common;

use std::fs;

use keel_migrate::error::MigrateError;
use keel_migrate::loader::{
    discover, load_ledger, load_migrations, load_schema, read_artifact, write_artifact,
    write_migration,
};

use common::shelter;

#[test]
fn test_directory_round_trip_rebuilds_same_schema() {
    let dir = tempfile::tempdir().unwrap();
    let schema = shelter(4);
    for migration in schema.migrations.iter().rev() {
        write_migration(dir.path(), migration).unwrap();
    }
    fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

    let names: Vec<String> = discover(dir.path())
        .unwrap()
        .into_iter()
        .map(|(name, _)| name.to_string())
        .collect();
    assert_eq!(names[0], "20240101000000_create_categories");
    assert_eq!(names.len(), 4);

    let rebuilt = load_ledger(dir.path()).unwrap().build().unwrap();
    assert_eq!(rebuilt.snapshot, schema.snapshot);
}

#[test]
fn test_name_mismatch_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let schema = shelter(1);
    let written = write_migration(dir.path(), &schema.migrations[0]).unwrap();
    let renamed = dir.path().join("20990101000000_create_categories.json");
    fs::rename(&written, &renamed).unwrap();

    let err = load_migrations(dir.path()).unwrap_err();
    assert!(matches!(err, MigrateError::ParseError { path, .. } if path == renamed));
}

#[test]
fn test_artifact_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("build").join("schema.json");
    let schema = shelter(4);

    write_artifact(&path, &schema).unwrap();
    assert_eq!(read_artifact(&path).unwrap(), schema);
}

#[test]
fn test_stale_artifact_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("schema.json");
    let mut schema = shelter(4);
    schema.snapshot = shelter(2).snapshot;
    fs::write(&path, schema.to_json().unwrap()).unwrap();

    assert!(matches!(
        read_artifact(&path),
        Err(MigrateError::Core(keel_core::Error::StaleSnapshot))
    ));
}

#[test]
fn test_artifact_behind_directory_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let migrations = dir.path().join("migrations");
    let artifact = dir.path().join("schema.json");
    let schema = shelter(4);
    for migration in &schema.migrations {
        write_migration(&migrations, migration).unwrap();
    }
    write_artifact(&artifact, &shelter(3)).unwrap();

    assert!(matches!(
        load_schema(&migrations, &artifact),
        Err(MigrateError::InvalidState(_))
    ));

    write_artifact(&artifact, &schema).unwrap();
    assert_eq!(load_schema(&migrations, &artifact).unwrap(), schema);
}

#[test]
fn test_schema_without_artifact_or_directory() {
    let dir = tempfile::tempdir().unwrap();
    let migrations = dir.path().join("migrations");
    let artifact = dir.path().join("schema.json");
    let schema = shelter(2);
    for migration in &schema.migrations {
        write_migration(&migrations, migration).unwrap();
    }
    assert_eq!(load_schema(&migrations, &artifact).unwrap(), schema);

    write_artifact(&artifact, &schema).unwrap();
    fs::remove_dir_all(&migrations).unwrap();
    assert_eq!(load_schema(&migrations, &artifact).unwrap(), schema);
}
