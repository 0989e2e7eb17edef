use anyhow::{Context, Result};
use insta_cmd::assert_cmd_snapshot;
use serde_json::Value;

use crate::CliTest;

/// Validates config file structure and default values.
fn assert_config_content(content: &str) -> Result<()> {
    let parsed: Value = serde_json::from_str(content).context("Config should be valid JSON")?;

    assert_eq!(parsed["srcDir"], "src");
    assert_eq!(parsed["testDir"], "test");
    assert_eq!(parsed["moduleExtension"], "cppm");
    assert_eq!(parsed["testFilePattern"], "test_{module}.cpp");
    assert_eq!(parsed["namespace"], "std");
    assert!(parsed["compiler"]["path"].is_string());
    assert!(
        content.contains("\n  \""),
        "Config should use 2-space indentation"
    );

    Ok(())
}

#[test]
fn test_init_creates_config() -> Result<()> {
    let test = CliTest::new()?;

    assert_cmd_snapshot!(test.command().arg("init"));

    assert!(test.root().join(".modcovrc.json").exists());

    let content = test.read_file(".modcovrc.json")?;
    assert_config_content(&content)?;

    Ok(())
}

#[test]
fn test_init_fails_if_config_exists() -> Result<()> {
    let test = CliTest::new()?;
    test.write_file(".modcovrc.json", "{}")?;

    assert_cmd_snapshot!(test.command().arg("init"));
    assert_eq!(test.read_file(".modcovrc.json")?, "{}");

    Ok(())
}

#[test]
fn test_init_config_is_usable() -> Result<()> {
    let test = CliTest::format_project()?;

    let init = test.command().arg("init").output()?;
    assert!(init.status.success());

    assert_cmd_snapshot!(test.validate_command().args(["--dump-dir", "dumps"]));

    Ok(())
}
