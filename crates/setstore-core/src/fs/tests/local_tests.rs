use std::path::{Path, PathBuf};
use tempfile::tempdir;

use crate::error::{Error, Result};
use crate::fs::error::StorageSystemError;
use crate::fs::local::LocalStorageProvider;
use crate::fs::provider::StorageProvider;

fn p(s: &str) -> PathBuf {
    PathBuf::from(s)
}

#[test]
fn test_write_and_read_string() -> Result<()> {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let provider = LocalStorageProvider::new(temp_dir.path().to_path_buf());

    let path = p("settings.json");
    provider.write_string(&path, "{\"a\": 1}")?;

    assert_eq!(provider.read_to_string(&path)?, "{\"a\": 1}");
    assert!(provider.exists(&path));

    Ok(())
}

#[test]
fn test_write_replaces_previous_content() -> Result<()> {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let provider = LocalStorageProvider::new(temp_dir.path().to_path_buf());

    let path = p("settings.ini");
    provider.write_string(&path, "a=1\nb=2\n")?;
    provider.write_string(&path, "a=3\n")?;

    assert_eq!(provider.read_to_string(&path)?, "a=3\n");

    Ok(())
}

#[test]
fn test_write_creates_parent_directories() -> Result<()> {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let provider = LocalStorageProvider::new(temp_dir.path().to_path_buf());

    let path = p("nested/deeper/settings.json");
    provider.write_string(&path, "{}")?;

    assert!(provider.exists(Path::new("nested/deeper")));
    assert!(temp_dir.path().join("nested/deeper").is_dir());
    assert!(temp_dir.path().join("nested/deeper/settings.json").is_file());

    Ok(())
}

#[test]
fn test_absolute_paths_ignore_base() -> Result<()> {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let provider = LocalStorageProvider::new(p("/nonexistent-base"));

    let absolute = temp_dir.path().join("absolute.json");
    provider.write_string(&absolute, "[]")?;

    assert_eq!(std::fs::read_to_string(&absolute).expect("read back"), "[]");

    Ok(())
}

#[test]
fn test_read_missing_file_reports_not_found() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let provider = LocalStorageProvider::new(temp_dir.path().to_path_buf());

    let result = provider.read_to_string(&p("missing.json"));

    assert!(matches!(
        result,
        Err(Error::StorageSystem(StorageSystemError::FileNotFound(_)))
    ));
}

#[test]
fn test_write_reports_unwritable_parent() -> Result<()> {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let provider = LocalStorageProvider::new(temp_dir.path().to_path_buf());

    // A file where the parent directory should be
    provider.write_string(&p("blocker"), "x")?;
    let result = provider.write_string(&p("blocker/settings.json"), "{}");

    assert!(matches!(
        result,
        Err(Error::StorageSystem(StorageSystemError::Io { ref operation, .. }))
            if operation == "create_dir_all"
    ));

    Ok(())
}

#[test]
fn test_create_dir_all() -> Result<()> {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let provider = LocalStorageProvider::new(temp_dir.path().to_path_buf());

    provider.create_dir_all(&p("a/b/c"))?;

    assert!(provider.exists(&p("a/b/c")));
    assert!(temp_dir.path().join("a/b/c").is_dir());
    assert_eq!(provider.name(), "local");

    Ok(())
}
