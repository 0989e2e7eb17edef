use anyhow::Result;
use insta_cmd::assert_cmd_snapshot;
use serde_json::Value;

use crate::CliTest;

#[test]
fn test_coverage_discovers_pairs() -> Result<()> {
    let test = CliTest::format_project()?;
    test.write_file("src/vector.cppm", "export namespace std {\n    using std::vector;\n}\n")?;

    assert_cmd_snapshot!(test.coverage_command());

    Ok(())
}

#[test]
fn test_coverage_tree_strategy_explicit_pair() -> Result<()> {
    let test = CliTest::format_project()?;

    assert_cmd_snapshot!(test.coverage_command().args([
        "src/format.cppm",
        "test/test_format.cpp",
        "--strategy",
        "tree",
        "--dump-dir",
        "dumps",
    ]));

    Ok(())
}

#[test]
fn test_coverage_dump_exports_carry_kinds() -> Result<()> {
    let test = CliTest::format_project()?;

    assert_cmd_snapshot!(test.coverage_command().args([
        "src/format.cppm",
        "test/test_format.cpp",
        "--exports",
        "dump",
        "--dump-dir",
        "dumps",
    ]));

    Ok(())
}

#[test]
fn test_coverage_test_dir_override() -> Result<()> {
    let test = CliTest::format_project()?;
    test.write_file("checks/test_format.cpp", "int main() { return 0; }\n")?;

    assert_cmd_snapshot!(test.coverage_command().args(["--test-dir", "checks"]));

    Ok(())
}

#[test]
fn test_coverage_missing_explicit_test_fails_module() -> Result<()> {
    let test = CliTest::format_project()?;

    assert_cmd_snapshot!(
        test.coverage_command()
            .args(["src/format.cppm", "test/test_missing.cpp"])
    );

    Ok(())
}

#[test]
fn test_coverage_module_without_test_argument_is_rejected() -> Result<()> {
    let test = CliTest::format_project()?;

    let output = test.coverage_command().arg("src/format.cppm").output()?;

    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8(output.stderr)?.contains("<TEST>"));
    Ok(())
}

#[test]
fn test_coverage_json() -> Result<()> {
    let test = CliTest::format_project()?;

    let output = test.coverage_command().args(["--format", "json"]).output()?;

    assert_eq!(output.status.code(), Some(0));
    let report: Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(report["command"], "coverage");
    assert_eq!(report["strategy"], "fast");
    assert_eq!(report["exports"], "heuristic");
    assert_eq!(report["summary"]["used"], 1);
    assert_eq!(report["summary"]["total"], 2);
    assert_eq!(report["modules"][0]["status"], "measured");
    Ok(())
}
