use anyhow::Result;
use insta_cmd::assert_cmd_snapshot;
use serde_json::Value;

use crate::{CliTest, FORMAT_DUMP, FORMAT_MODULE};

#[test]
fn test_validate_exact_match() -> Result<()> {
    let test = CliTest::format_project()?;

    assert_cmd_snapshot!(test.validate_command().args(["--dump-dir", "dumps"]));

    Ok(())
}

#[test]
fn test_validate_block_comment_mismatch() -> Result<()> {
    let test = CliTest::format_project()?;
    let module = FORMAT_MODULE.replace(
        "    using std::format_error;\n",
        "    using std::format_error;\n    /*\n    using std::vformat;\n    */\n",
    );
    test.write_file("src/format.cppm", &module)?;

    assert_cmd_snapshot!(test.validate_command().args(["--dump-dir", "dumps"]));

    Ok(())
}

#[test]
fn test_validate_list_only() -> Result<()> {
    let test = CliTest::format_project()?;

    assert_cmd_snapshot!(
        test.validate_command()
            .args(["--dump-dir", "dumps", "--list-only"])
    );

    Ok(())
}

#[test]
fn test_validate_excludes_std_module() -> Result<()> {
    let test = CliTest::format_project()?;
    test.write_file("src/std.cppm", "export module std;\n")?;

    assert_cmd_snapshot!(test.validate_command().args(["--dump-dir", "dumps"]));

    Ok(())
}

#[test]
fn test_validate_explicit_module() -> Result<()> {
    let test = CliTest::format_project()?;
    test.write_file("src/vector.cppm", "using std::vector;\n")?;

    assert_cmd_snapshot!(
        test.validate_command()
            .args(["src/format.cppm", "--dump-dir", "dumps"])
    );

    Ok(())
}

#[test]
fn test_validate_missing_compiler_is_fatal() -> Result<()> {
    let test = CliTest::format_project()?;

    assert_cmd_snapshot!(
        test.validate_command()
            .args(["--compiler", "modcov-test-missing-compiler"])
    );

    Ok(())
}

#[test]
fn test_validate_diagnostic_dump_fails_module() -> Result<()> {
    let test = CliTest::format_project()?;
    test.write_file(
        "dumps/format.cppm.ast",
        "error: module 'std_module.base' not found\n1 error generated.\n",
    )?;

    assert_cmd_snapshot!(test.validate_command().args(["--dump-dir", "dumps"]));

    Ok(())
}

#[test]
fn test_validate_missing_source_dir_is_fatal() -> Result<()> {
    let test = CliTest::new()?;

    assert_cmd_snapshot!(test.validate_command());

    Ok(())
}

#[test]
fn test_validate_empty_source_dir_is_fatal() -> Result<()> {
    let test = CliTest::new()?;
    test.write_file("src/README.md", "modules go here\n")?;

    assert_cmd_snapshot!(test.validate_command());

    Ok(())
}

#[test]
fn test_validate_src_dir_override() -> Result<()> {
    let test = CliTest::new()?;
    test.write_file("modules/format.cppm", FORMAT_MODULE)?;
    test.write_file("dumps/format.cppm.ast", FORMAT_DUMP)?;

    assert_cmd_snapshot!(
        test.validate_command()
            .args(["--src-dir", "modules", "--dump-dir", "dumps"])
    );

    Ok(())
}

#[test]
fn test_validate_json() -> Result<()> {
    let test = CliTest::format_project()?;

    let output = test
        .validate_command()
        .args(["--dump-dir", "dumps", "--format", "json"])
        .output()?;

    assert_eq!(output.status.code(), Some(0));
    let report: Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(report["command"], "validate");
    assert_eq!(report["summary"]["failed"], 0);
    let module = &report["modules"][0];
    assert_eq!(module["status"], "passed");
    assert_eq!(module["symbols"][0]["name"], "format");
    assert_eq!(module["symbols"][0]["kind"], "function-template");
    assert_eq!(module["symbols"][0]["line"], 6);
    assert_eq!(module["reconciliation"]["match_ratio"], 1.0);
    Ok(())
}

#[test]
fn test_validate_respects_config() -> Result<()> {
    let test = CliTest::format_project()?;
    test.write_file(".modcovrc.json", r#"{ "ignores": ["format*"] }"#)?;
    test.write_file("src/vector.cppm", "")?;
    test.write_file(
        "dumps/vector.cppm.ast",
        "TranslationUnitDecl 0x1 <<invalid sloc>> <invalid sloc>\n",
    )?;

    assert_cmd_snapshot!(test.validate_command().args(["--dump-dir", "dumps"]));

    Ok(())
}
