use std::{
    fs,
    path::{Path, PathBuf},
    process::Command,
};

use anyhow::{Context, Ok, Result};
use insta_cmd::get_cargo_bin;
use tempfile::TempDir;

mod coverage;
mod init;
mod validate;

const BIN_NAME: &str = "modcov";

pub const FORMAT_MODULE: &str = "\
module;
#include <format>
export module format;

export namespace std {
    using std::format;
    using std::format_error;
}
";

pub const FORMAT_DUMP: &str = "\
TranslationUnitDecl 0x1 <<invalid sloc>> <invalid sloc>
|-TypedefDecl 0x2 <<invalid sloc>> <invalid sloc> implicit __int128_t '__int128'
| `-BuiltinType 0x3 '__int128'
`-ExportDecl 0x10 <src/format.cppm:5:1, line:8:1> line:5:1 in format
  `-NamespaceDecl 0x11 <col:8, line:8:1> line:5:18 in format std
    |-UsingDecl 0x12 <line:6:5, col:16> col:16 in format std::format
    |-UsingShadowDecl 0x13 <col:16> col:16 in format implicit FunctionTemplate 0x20 'format'
    |-UsingDecl 0x14 <line:7:5, col:16> col:16 in format std::format_error
    `-UsingShadowDecl 0x15 <col:16> col:16 in format implicit CXXRecord 0x21 'format_error'
";

pub const FORMAT_TEST: &str = "\
import format;

int main() {
    auto s = std::format(\"{}\", 42);
    return s.empty() ? 1 : 0;
}
";

pub const FORMAT_TEST_DUMP: &str = "\
TranslationUnitDecl 0x1 <<invalid sloc>> <invalid sloc>
|-ImportDecl 0x2 <test/test_format.cpp:1:1, col:14> col:1 format
`-FunctionDecl 0x3 <line:3:1, line:6:1> line:3:5 main 'int ()'
  `-CompoundStmt 0x4 <col:12, line:6:1>
    |-DeclStmt 0x5 <line:4:5, col:36>
    | `-VarDecl 0x6 <col:5, col:35> col:10 used s 'std::string':'std::basic_string<char>' cinit
    |   `-CallExpr 0x7 <col:14, col:35> 'std::string':'std::basic_string<char>'
    |     |-ImplicitCastExpr 0x8 <col:14, col:19> 'std::string (*)(std::format_string<int>, int &&)' <FunctionToPointerDecay>
    |     | `-DeclRefExpr 0x9 <col:14, col:19> 'std::string (std::format_string<int>, int &&)' lvalue Function 0xa 'format' 'std::string (std::format_string<int>, int &&)'
    |     `-IntegerLiteral 0xb <col:32> 'int' 42
    `-ReturnStmt 0xc <line:5:5, col:29>
      `-IntegerLiteral 0xd <col:29> 'int' 0
";

pub struct CliTest {
    _temp_dir: TempDir,
    project_dir: PathBuf,
}

impl CliTest {
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let project_dir = temp_dir.path().canonicalize()?;
        // Stop the config search at the project root.
        fs::create_dir(project_dir.join(".git"))?;
        Ok(Self {
            _temp_dir: temp_dir,
            project_dir,
        })
    }

    /// A project with the `format` module, its dump and its test.
    pub fn format_project() -> Result<Self> {
        let test = Self::new()?;
        test.write_file("src/format.cppm", FORMAT_MODULE)?;
        test.write_file("dumps/format.cppm.ast", FORMAT_DUMP)?;
        test.write_file("test/test_format.cpp", FORMAT_TEST)?;
        test.write_file("dumps/test_format.cpp.ast", FORMAT_TEST_DUMP)?;
        Ok(test)
    }

    pub fn write_file(&self, path: &str, content: &str) -> Result<()> {
        let file_path = self.project_dir.join(path);

        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory:{}", parent.display()))?;
        }

        fs::write(&file_path, content)
            .with_context(|| format!("Failed to write file: {}", file_path.display()))?;

        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.project_dir
    }

    pub fn command(&self) -> Command {
        let mut cmd = Command::new(get_cargo_bin(BIN_NAME));
        cmd.current_dir(&self.project_dir);
        cmd.env_clear();
        cmd.env("NO_COLOR", "1"); // Disable colors for consistent test output
        cmd
    }

    pub fn validate_command(&self) -> Command {
        let mut cmd = self.command();
        cmd.arg("validate");
        cmd
    }

    pub fn coverage_command(&self) -> Command {
        let mut cmd = self.command();
        cmd.arg("coverage");
        cmd
    }

    pub fn read_file(&self, path: &str) -> Result<String> {
        let file_path = self.project_dir.join(path);
        fs::read_to_string(&file_path)
            .with_context(|| format!("Failed to read file: {}", file_path.display()))
    }
}
