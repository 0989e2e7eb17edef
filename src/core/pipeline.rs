//! Per-module pipelines.
//!
//! Validation: module source -> dump -> export scan, and module source ->
//! heuristic extraction, then reconciliation. Coverage: export catalog (either
//! source) -> usage locator over the paired test file.
//!
//! Each module runs independently on the rayon pool. Per-module problems are
//! recorded as issues on the module's result; only the caller decides what is fatal.

use std::{
    collections::BTreeSet,
    fmt, fs,
    path::{Path, PathBuf},
};

use anyhow::Result;
use clap::ValueEnum;
use rayon::prelude::*;
use serde::Serialize;

use crate::{
    core::{
        context::AnalysisContext,
        dump::parse_dump,
        exports::{ExportedSymbol, scan_exports},
        file_scanner::{ModuleInput, module_name},
        heuristic::HeuristicExtractor,
        reconcile::Reconciliation,
        source::DumpSource,
        usage::{CoverageReport, LocateUsages, TestInput, UsageStrategy},
    },
    issues::{
        CorrelationGapIssue, EmptyExtractionIssue, ExternalToolFailureIssue, Extractor,
        FileNotFoundIssue, InconclusiveDumpIssue, Issue, MismatchIssue, NoTestFileIssue, Severity,
    },
};

// ============================================================
// Validation
// ============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValidationStatus {
    /// Both extractors agree.
    Passed,
    /// Catalog listed without reconciliation.
    Listed,
    Mismatch,
    /// No verdict: a file or the dump was unavailable.
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModuleValidation {
    pub module: String,
    pub path: PathBuf,
    pub status: ValidationStatus,
    /// Authoritative catalog, sorted by name.
    pub symbols: Vec<ExportedSymbol>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heuristic: Option<BTreeSet<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reconciliation: Option<Reconciliation>,
    pub issues: Vec<Issue>,
    #[serde(skip)]
    pub notes: Vec<String>,
}

impl ModuleValidation {
    fn new(path: &Path) -> Self {
        Self {
            module: module_name(path),
            path: path.to_path_buf(),
            status: ValidationStatus::Failed,
            symbols: Vec::new(),
            heuristic: None,
            reconciliation: None,
            issues: Vec::new(),
            notes: Vec::new(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(
            self.status,
            ValidationStatus::Mismatch | ValidationStatus::Failed
        )
    }
}

/// Validate every module in parallel. Results keep the input order.
pub fn validate_modules(
    ctx: &AnalysisContext,
    modules: &[PathBuf],
    list_only: bool,
) -> Result<Vec<ModuleValidation>> {
    let extractor = ctx.heuristic_extractor()?;
    Ok(modules
        .par_iter()
        .map(|path| validate_module(ctx, &extractor, path, list_only))
        .collect())
}

pub fn validate_module(
    ctx: &AnalysisContext,
    extractor: &HeuristicExtractor,
    path: &Path,
    list_only: bool,
) -> ModuleValidation {
    let mut result = ModuleValidation::new(path);
    let path_str = path.display().to_string();

    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            result.issues.push(Issue::FileNotFound(FileNotFoundIssue {
                path: path_str,
                reason: e.to_string(),
            }));
            return result;
        }
    };

    result.notes.push(ctx.dump_source.describe(path));
    let dump = match ctx.dump_source.dump(path) {
        Ok(dump) => dump,
        Err(failure) => {
            result
                .issues
                .push(Issue::ExternalToolFailure(ExternalToolFailureIssue {
                    path: path_str,
                    failure,
                }));
            return result;
        }
    };

    let scan = scan_exports(&dump, &ctx.scan_options(&result.module));
    result.notes.push(format!(
        "{} dump lines, {} nodes, {} export block(s)",
        dump.lines().count(),
        scan.node_lines,
        scan.export_blocks
    ));
    if scan.is_inconclusive() {
        result.issues.push(inconclusive_dump(path_str, &dump));
        return result;
    }

    for gap in scan.gaps() {
        result
            .issues
            .push(Issue::CorrelationGap(CorrelationGapIssue {
                path: path_str.clone(),
                symbol: gap.name.clone(),
            }));
    }
    if scan.is_empty() {
        result
            .issues
            .push(Issue::EmptyExtraction(EmptyExtractionIssue {
                path: path_str.clone(),
                extractor: Extractor::Dump,
            }));
    }

    let authoritative = scan.names();
    result.symbols = scan.symbols;

    if list_only {
        result.status = ValidationStatus::Listed;
        return result;
    }

    let heuristic = extractor.extract(&source);
    if heuristic.is_empty() {
        result
            .issues
            .push(Issue::EmptyExtraction(EmptyExtractionIssue {
                path: path_str.clone(),
                extractor: Extractor::Heuristic,
            }));
    }

    let reconciliation = Reconciliation::compare(&authoritative, &heuristic);
    if reconciliation.is_exact() {
        result.status = ValidationStatus::Passed;
    } else {
        result.status = ValidationStatus::Mismatch;
        result.issues.push(Issue::Mismatch(MismatchIssue {
            path: path_str,
            only_dump: reconciliation.only_authoritative.iter().cloned().collect(),
            only_heuristic: reconciliation.only_heuristic.iter().cloned().collect(),
        }));
    }

    result.heuristic = Some(heuristic);
    result.reconciliation = Some(reconciliation);
    result
}

fn inconclusive_dump(path: String, dump: &str) -> Issue {
    Issue::InconclusiveDump(InconclusiveDumpIssue {
        path,
        line_count: dump.lines().count(),
        first_line: dump
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(str::to_string),
    })
}

// ============================================================
// Coverage
// ============================================================

/// Where the export catalog for coverage comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportsSource {
    /// `using <namespace>::name;` lines of the module source
    #[default]
    Heuristic,
    /// The module's declaration dump
    Dump,
}

impl fmt::Display for ExportsSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportsSource::Heuristic => write!(f, "heuristic"),
            ExportsSource::Dump => write!(f, "dump"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CoverageOptions {
    pub strategy: UsageStrategy,
    pub exports: ExportsSource,
    /// Missing test files skip the module (discovered pairs) instead of failing it.
    pub skip_missing_tests: bool,
}

impl CoverageOptions {
    /// Whether any declaration dump is read.
    pub fn needs_dumps(&self) -> bool {
        self.strategy == UsageStrategy::Tree || self.exports == ExportsSource::Dump
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CoverageStatus {
    Measured,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModuleCoverage {
    pub module: String,
    pub path: PathBuf,
    pub test_path: PathBuf,
    pub status: CoverageStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<CoverageReport>,
    pub issues: Vec<Issue>,
    #[serde(skip)]
    pub notes: Vec<String>,
}

impl ModuleCoverage {
    fn new(input: &ModuleInput) -> Self {
        Self {
            module: input.name.clone(),
            path: input.module_path.clone(),
            test_path: input.test_path.clone(),
            status: CoverageStatus::Failed,
            report: None,
            issues: Vec::new(),
            notes: Vec::new(),
        }
    }

    fn fail(mut self, issue: Issue) -> Self {
        debug_assert_eq!(issue.severity(), Severity::Error);
        self.issues.push(issue);
        self.status = CoverageStatus::Failed;
        self
    }
}

/// Totals over every measured module.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CoverageTotals {
    pub measured: usize,
    pub skipped: usize,
    pub failed: usize,
    pub used: usize,
    pub total: usize,
    /// Absent when no measured module has exports.
    pub ratio: Option<f64>,
}

impl CoverageTotals {
    pub fn from_modules(modules: &[ModuleCoverage]) -> Self {
        let mut totals = Self::default();
        for module in modules {
            match module.status {
                CoverageStatus::Measured => totals.measured += 1,
                CoverageStatus::Skipped => totals.skipped += 1,
                CoverageStatus::Failed => totals.failed += 1,
            }
            if let Some(report) = &module.report {
                totals.used += report.used;
                totals.total += report.total;
            }
        }
        totals.ratio = (totals.total > 0).then(|| totals.used as f64 / totals.total as f64);
        totals
    }

    pub fn percent(&self) -> Option<f64> {
        self.ratio.map(|r| r * 100.0)
    }
}

/// Measure coverage of every pair in parallel. Results keep the input order.
pub fn analyze_modules(
    ctx: &AnalysisContext,
    inputs: &[ModuleInput],
    options: CoverageOptions,
) -> Result<Vec<ModuleCoverage>> {
    let extractor = ctx.heuristic_extractor()?;
    inputs
        .par_iter()
        .map(|input| analyze_coverage(ctx, &extractor, input, options))
        .collect()
}

pub fn analyze_coverage(
    ctx: &AnalysisContext,
    extractor: &HeuristicExtractor,
    input: &ModuleInput,
    options: CoverageOptions,
) -> Result<ModuleCoverage> {
    let mut result = ModuleCoverage::new(input);
    let module_str = input.module_path.display().to_string();
    let test_str = input.test_path.display().to_string();

    if !input.test_path.is_file() && options.skip_missing_tests {
        result.status = CoverageStatus::Skipped;
        result.issues.push(Issue::NoTestFile(NoTestFileIssue {
            path: module_str,
            expected: test_str,
        }));
        return Ok(result);
    }

    let source = match fs::read_to_string(&input.module_path) {
        Ok(source) => source,
        Err(e) => {
            return Ok(result.fail(Issue::FileNotFound(FileNotFoundIssue {
                path: module_str,
                reason: e.to_string(),
            })));
        }
    };

    let (names, catalog) = match options.exports {
        ExportsSource::Heuristic => (extractor.extract(&source), Vec::new()),
        ExportsSource::Dump => {
            result.notes.push(ctx.dump_source.describe(&input.module_path));
            match ctx.dump_source.dump(&input.module_path) {
                Ok(dump) => {
                    let scan = scan_exports(&dump, &ctx.scan_options(&input.name));
                    if scan.is_inconclusive() {
                        return Ok(result.fail(inconclusive_dump(module_str, &dump)));
                    }
                    (scan.names(), scan.symbols)
                }
                Err(failure) => {
                    return Ok(result.fail(Issue::ExternalToolFailure(
                        ExternalToolFailureIssue {
                            path: module_str,
                            failure,
                        },
                    )));
                }
            }
        }
    };

    if names.is_empty() {
        result
            .issues
            .push(Issue::EmptyExtraction(EmptyExtractionIssue {
                path: module_str.clone(),
                extractor: match options.exports {
                    ExportsSource::Heuristic => Extractor::Heuristic,
                    ExportsSource::Dump => Extractor::Dump,
                },
            }));
    }

    let test_source = match fs::read_to_string(&input.test_path) {
        Ok(source) => source,
        Err(e) => {
            return Ok(result.fail(Issue::FileNotFound(FileNotFoundIssue {
                path: test_str,
                reason: e.to_string(),
            })));
        }
    };

    let locator = ctx.locator(options.strategy);
    let test_dump = if locator.needs_dump() {
        result.notes.push(ctx.dump_source.describe(&input.test_path));
        match ctx.dump_source.dump(&input.test_path) {
            Ok(dump) if !parse_dump(&dump).any(|line| line.is_node()) => {
                return Ok(result.fail(inconclusive_dump(test_str, &dump)));
            }
            Ok(dump) => Some(dump),
            Err(failure) => {
                return Ok(result.fail(Issue::ExternalToolFailure(
                    ExternalToolFailureIssue {
                        path: test_str,
                        failure,
                    },
                )));
            }
        }
    } else {
        None
    };

    let usages = locator.locate(
        &names,
        &TestInput {
            path: &input.test_path,
            source: &test_source,
            dump: test_dump.as_deref(),
        },
    )?;

    let report = CoverageReport::new(usages, &catalog);
    result.notes.push(format!(
        "{} of {} exports used ({} strategy, {} exports)",
        report.used, report.total, options.strategy, options.exports
    ));
    result.report = Some(report);
    result.status = CoverageStatus::Measured;
    Ok(result)
}
