use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn setstore() -> Result<Command, Box<dyn std::error::Error>> {
    Ok(Command::cargo_bin("setstore")?)
}

#[test]
fn test_store_then_get_from_ini_file() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let file = dir.path().join("settings.ini");

    setstore()?
        .arg("--file")
        .arg(&file)
        .args(["store", "theme", "dark"])
        .assert()
        .success();

    assert_eq!(fs::read_to_string(&file)?, "theme=dark\n");

    setstore()?
        .arg("--file")
        .arg(&file)
        .args(["get", "theme"])
        .assert()
        .success()
        .stdout("dark\n");

    Ok(())
}

#[test]
fn test_module_option_selects_section() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let file = dir.path().join("settings.ini");

    setstore()?
        .arg("--file")
        .arg(&file)
        .args(["--module", "ui", "store", "size", "12"])
        .assert()
        .success();

    assert_eq!(fs::read_to_string(&file)?, "[ui]\nsize=12\n");

    setstore()?
        .arg("--file")
        .arg(&file)
        .args(["has", "size"])
        .assert()
        .success()
        .stdout("false\n");

    setstore()?
        .arg("--file")
        .arg(&file)
        .args(["list", "--all-modules"])
        .assert()
        .success()
        .stdout("ui.size=12\n");

    Ok(())
}

#[test]
fn test_get_prints_default_for_missing_key() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let file = dir.path().join("settings.json");

    setstore()?
        .arg("--file")
        .arg(&file)
        .args(["get", "missing", "--default", "fallback"])
        .assert()
        .success()
        .stdout("fallback\n");

    Ok(())
}

#[test]
fn test_json_values_and_export() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let file = dir.path().join("settings.json");

    setstore()?
        .arg("--file")
        .arg(&file)
        .args(["store", "ports", "[80,443]", "--json"])
        .assert()
        .success();

    setstore()?
        .arg("--file")
        .arg(&file)
        .args(["export", "--format", "ini"])
        .assert()
        .success()
        .stdout("ports=\\[80,443\\]\n");

    setstore()?
        .arg("--file")
        .arg(&file)
        .args(["store", "broken", "{", "--json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Deserialization from 'json' failed"));

    Ok(())
}

#[test]
fn test_default_value_type_encoding() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let file = dir.path().join("settings.ini");
    fs::write(&file, "enabled=yes\n")?;

    setstore()?
        .arg("--file")
        .arg(&file)
        .args(["--encoding", "default-value-type", "get", "enabled", "--default", "false"])
        .assert()
        .success()
        .stdout("true\n");

    Ok(())
}

#[test]
fn test_delete_and_clear() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let file = dir.path().join("settings.ini");
    fs::write(&file, "a=1\nb=2\n\n[ui]\nc=3\n")?;

    setstore()?
        .arg("--file")
        .arg(&file)
        .args(["delete", "a"])
        .assert()
        .success();
    assert_eq!(fs::read_to_string(&file)?, "b=2\n\n[ui]\nc=3\n");

    setstore()?
        .arg("--file")
        .arg(&file)
        .args(["clear"])
        .assert()
        .success();
    assert_eq!(fs::read_to_string(&file)?, "[ui]\nc=3\n");

    setstore()?
        .arg("--file")
        .arg(&file)
        .args(["clear", "--all-modules"])
        .assert()
        .success();
    assert_eq!(fs::read_to_string(&file)?, "");

    Ok(())
}

#[test]
fn test_config_file_supplies_options() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let file = dir.path().join("data.ini");
    let config = dir.path().join("storage.json");
    fs::write(
        &config,
        format!(
            r#"{{"file_path": {}, "default_module": "app"}}"#,
            serde_json::to_string(&file)?
        ),
    )?;

    setstore()?
        .arg("--config")
        .arg(&config)
        .args(["store", "k", "v"])
        .assert()
        .success();

    assert_eq!(fs::read_to_string(&file)?, "[app]\nk=v\n");
    Ok(())
}

#[test]
fn test_without_file_falls_back_to_memory() -> Result<(), Box<dyn std::error::Error>> {
    setstore()?
        .args(["get", "anything"])
        .env("RUST_LOG", "warn")
        .assert()
        .success()
        .stdout("")
        .stderr(predicate::str::contains("falling back to memory"));

    Ok(())
}

#[test]
fn test_unknown_file_format_is_rejected_by_fallback() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;

    setstore()?
        .arg("--file")
        .arg(dir.path().join("settings.unknown"))
        .args(["store", "k", "v"])
        .assert()
        .success()
        .stderr(predicate::str::contains("falling back to memory"));

    Ok(())
}
