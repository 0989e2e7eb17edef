//! CLI argument definitions using clap.
//!
//! ## Commands
//!
//! - `validate`: cross-validate dump-based and heuristic export extraction
//! - `coverage`: measure how many exports the test files use
//! - `init`: write a default configuration file

use std::{
    io::{self, IsTerminal},
    path::PathBuf,
};

use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};

use super::report::OutputStyle;
use crate::core::{ExportsSource, usage::UsageStrategy};

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Arguments {
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Arguments {
    /// Check if a command was provided, otherwise print help and return None.
    pub fn with_command_or_help(self) -> Option<Self> {
        if self.command.is_none() {
            Self::command().print_help().ok();
            None
        } else {
            Some(self)
        }
    }

    fn common(&self) -> Option<&CommonArgs> {
        match &self.command {
            Some(Command::Validate(cmd)) => Some(&cmd.common),
            Some(Command::Coverage(cmd)) => Some(&cmd.common),
            Some(Command::Init) | None => None,
        }
    }

    /// Get the verbose flag from the command's common args.
    pub fn verbose(&self) -> bool {
        self.common().is_some_and(|c| c.verbose)
    }

    /// How the command's output should be rendered.
    pub fn output_style(&self) -> OutputStyle {
        match self.common() {
            Some(common) => OutputStyle {
                color: !common.no_color && io::stdout().is_terminal(),
                format: common.format,
                verbose: common.verbose,
            },
            None => OutputStyle {
                color: io::stdout().is_terminal(),
                ..OutputStyle::default()
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Common arguments shared by all analysis commands.
#[derive(Debug, Clone, Args)]
pub struct CommonArgs {
    /// Project root; the config file is searched upward from here
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Module source directory (overrides config file)
    #[arg(long)]
    pub src_dir: Option<PathBuf>,

    /// Test directory (overrides config file)
    #[arg(long)]
    pub test_dir: Option<PathBuf>,

    /// Read `<file name>.ast` dumps from this directory instead of running the compiler
    #[arg(long)]
    pub dump_dir: Option<PathBuf>,

    /// Compiler executable (overrides config file)
    #[arg(long, env = "MODCOV_COMPILER")]
    pub compiler: Option<String>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Args)]
pub struct ValidateCommand {
    /// Module files to validate (default: every module in the source directory)
    pub modules: Vec<PathBuf>,

    /// Only list the exports found in the declaration dump
    #[arg(long)]
    pub list_only: bool,

    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Debug, Args)]
pub struct CoverageCommand {
    /// Module file (default: every module paired with its test file)
    #[arg(requires = "test")]
    pub module: Option<PathBuf>,

    /// Test file exercising the module
    pub test: Option<PathBuf>,

    /// How usages are located
    #[arg(long, value_enum, default_value_t = UsageStrategy::Fast)]
    pub strategy: UsageStrategy,

    /// Where the export list comes from
    #[arg(long, value_enum, default_value_t = ExportsSource::Heuristic)]
    pub exports: ExportsSource,

    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Cross-validate exports found in the declaration dump against the module source
    Validate(ValidateCommand),
    /// Report which exports are used by the module's tests
    Coverage(CoverageCommand),
    /// Initialize a new .modcovrc.json configuration file
    Init,
}
