use std::path::PathBuf;

use super::super::exit_status::ExitStatus;
use crate::core::{CoverageTotals, ExportsSource, ModuleCoverage, ModuleValidation};
use crate::core::usage::UsageStrategy;
use crate::issues::Issue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Validate,
    Coverage,
    Init,
}

#[derive(Debug)]
pub enum CommandSummary {
    Validate(ValidateSummary),
    Coverage(CoverageSummary),
    Init(InitSummary),
}

impl CommandSummary {
    pub fn kind(&self) -> CommandKind {
        match self {
            CommandSummary::Validate(_) => CommandKind::Validate,
            CommandSummary::Coverage(_) => CommandKind::Coverage,
            CommandSummary::Init(_) => CommandKind::Init,
        }
    }

    /// Every issue across the summary's modules.
    pub fn issues(&self) -> Vec<&Issue> {
        match self {
            CommandSummary::Validate(summary) => summary
                .modules
                .iter()
                .flat_map(|m| m.issues.iter())
                .collect(),
            CommandSummary::Coverage(summary) => summary
                .modules
                .iter()
                .flat_map(|m| m.issues.iter())
                .collect(),
            CommandSummary::Init(_) => Vec::new(),
        }
    }
}

#[derive(Debug)]
pub struct ValidateSummary {
    pub modules: Vec<ModuleValidation>,
    pub list_only: bool,
}

impl ValidateSummary {
    pub fn failed_count(&self) -> usize {
        self.modules.iter().filter(|m| m.is_failure()).count()
    }
}

#[derive(Debug)]
pub struct CoverageSummary {
    pub modules: Vec<ModuleCoverage>,
    pub totals: CoverageTotals,
    pub strategy: UsageStrategy,
    pub exports: ExportsSource,
}

#[derive(Debug)]
pub struct InitSummary {
    pub path: PathBuf,
    /// Set when the file could not be created.
    pub error: Option<String>,
}

/// Result of running modcov commands
#[derive(Debug)]
pub struct CommandResult {
    pub kind: CommandKind,
    pub summary: CommandSummary,
    pub error_count: usize,
    pub warning_count: usize,
    /// If true, exit code 1 should be returned when error_count > 0.
    /// If false, always exit 0 (coverage is informational).
    pub exit_on_errors: bool,
}

impl CommandResult {
    pub fn exit_status(&self) -> ExitStatus {
        if self.exit_on_errors && self.error_count > 0 {
            ExitStatus::Failure
        } else {
            ExitStatus::Success
        }
    }
}
