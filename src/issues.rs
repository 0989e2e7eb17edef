//! Issue types for per-module analysis results.
//!
//! Every problem found while processing one module becomes an issue attached to
//! that module's result record. Nothing here aborts the run: a failing compiler
//! or a missing file only fails its own module.

use enum_dispatch::enum_dispatch;
use serde::{Serialize, Serializer};

use crate::core::source::ToolFailure;

// ============================================================
// Severity and Rule
// ============================================================

/// Severity level of an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// Rule identifier for each issue type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Rule {
    FileNotFound,
    ToolFailure,
    InconclusiveDump,
    Mismatch,
    EmptyExtraction,
    CorrelationGap,
    NoTestFile,
}

impl std::fmt::Display for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rule::FileNotFound => write!(f, "file-not-found"),
            Rule::ToolFailure => write!(f, "tool-failure"),
            Rule::InconclusiveDump => write!(f, "inconclusive-dump"),
            Rule::Mismatch => write!(f, "mismatch"),
            Rule::EmptyExtraction => write!(f, "empty-extraction"),
            Rule::CorrelationGap => write!(f, "correlation-gap"),
            Rule::NoTestFile => write!(f, "no-test-file"),
        }
    }
}

/// Which extractor came back empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extractor {
    Dump,
    Heuristic,
}

impl std::fmt::Display for Extractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Extractor::Dump => write!(f, "declaration dump"),
            Extractor::Heuristic => write!(f, "module source"),
        }
    }
}

// ============================================================
// Issue Types
// ============================================================

/// A module or test file could not be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNotFoundIssue {
    pub path: String,
    pub reason: String,
}

impl FileNotFoundIssue {
    pub fn severity() -> Severity {
        Severity::Error
    }

    pub fn rule() -> Rule {
        Rule::FileNotFound
    }
}

/// The dump of `path` could not be produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalToolFailureIssue {
    pub path: String,
    pub failure: ToolFailure,
}

impl ExternalToolFailureIssue {
    pub fn severity() -> Severity {
        Severity::Error
    }

    pub fn rule() -> Rule {
        Rule::ToolFailure
    }
}

/// The dump text had no declaration nodes, so nothing can be concluded about exports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InconclusiveDumpIssue {
    pub path: String,
    pub line_count: usize,
    /// First non-empty line of the text, usually a compiler diagnostic.
    pub first_line: Option<String>,
}

impl InconclusiveDumpIssue {
    pub fn severity() -> Severity {
        Severity::Error
    }

    pub fn rule() -> Rule {
        Rule::InconclusiveDump
    }
}

/// The two export sets differ. Carries the full symmetric difference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MismatchIssue {
    pub path: String,
    pub only_dump: Vec<String>,
    pub only_heuristic: Vec<String>,
}

impl MismatchIssue {
    pub fn severity() -> Severity {
        Severity::Error
    }

    pub fn rule() -> Rule {
        Rule::Mismatch
    }
}

/// An extractor found no exports at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmptyExtractionIssue {
    pub path: String,
    pub extractor: Extractor,
}

impl EmptyExtractionIssue {
    pub fn severity() -> Severity {
        Severity::Warning
    }

    pub fn rule() -> Rule {
        Rule::EmptyExtraction
    }
}

/// A symbol was exported but its import line fell outside the correlation window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelationGapIssue {
    pub path: String,
    pub symbol: String,
}

impl CorrelationGapIssue {
    pub fn severity() -> Severity {
        Severity::Warning
    }

    pub fn rule() -> Rule {
        Rule::CorrelationGap
    }
}

/// A discovered module has no matching test file; coverage is skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoTestFileIssue {
    pub path: String,
    pub expected: String,
}

impl NoTestFileIssue {
    pub fn severity() -> Severity {
        Severity::Warning
    }

    pub fn rule() -> Rule {
        Rule::NoTestFile
    }
}

// ============================================================
// Issue Enum
// ============================================================

#[enum_dispatch(Report)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Issue {
    FileNotFound(FileNotFoundIssue),
    ExternalToolFailure(ExternalToolFailureIssue),
    InconclusiveDump(InconclusiveDumpIssue),
    Mismatch(MismatchIssue),
    EmptyExtraction(EmptyExtractionIssue),
    CorrelationGap(CorrelationGapIssue),
    NoTestFile(NoTestFileIssue),
}

impl Issue {
    pub fn severity(&self) -> Severity {
        match self {
            Issue::FileNotFound(_) => FileNotFoundIssue::severity(),
            Issue::ExternalToolFailure(_) => ExternalToolFailureIssue::severity(),
            Issue::InconclusiveDump(_) => InconclusiveDumpIssue::severity(),
            Issue::Mismatch(_) => MismatchIssue::severity(),
            Issue::EmptyExtraction(_) => EmptyExtractionIssue::severity(),
            Issue::CorrelationGap(_) => CorrelationGapIssue::severity(),
            Issue::NoTestFile(_) => NoTestFileIssue::severity(),
        }
    }

    pub fn rule(&self) -> Rule {
        match self {
            Issue::FileNotFound(_) => FileNotFoundIssue::rule(),
            Issue::ExternalToolFailure(_) => ExternalToolFailureIssue::rule(),
            Issue::InconclusiveDump(_) => InconclusiveDumpIssue::rule(),
            Issue::Mismatch(_) => MismatchIssue::rule(),
            Issue::EmptyExtraction(_) => EmptyExtractionIssue::rule(),
            Issue::CorrelationGap(_) => CorrelationGapIssue::rule(),
            Issue::NoTestFile(_) => NoTestFileIssue::rule(),
        }
    }
}

// ============================================================
// Report Trait
// ============================================================

#[enum_dispatch]
pub trait Report {
    /// File the issue is about.
    fn path(&self) -> &str;

    /// Primary message to display.
    fn message(&self) -> String;

    /// Lines for the "= note:" section.
    fn details(&self) -> Vec<String> {
        Vec::new()
    }

    /// Optional hint for fixing the issue.
    fn hint(&self) -> Option<&str> {
        None
    }
}

impl Report for FileNotFoundIssue {
    fn path(&self) -> &str {
        &self.path
    }

    fn message(&self) -> String {
        format!("cannot read file: {}", self.reason)
    }
}

impl Report for ExternalToolFailureIssue {
    fn path(&self) -> &str {
        &self.path
    }

    fn message(&self) -> String {
        format!("no declaration dump: {}", self.failure)
    }

    fn hint(&self) -> Option<&str> {
        match self.failure {
            ToolFailure::NotFound { .. } => Some("set compiler.path or pass --compiler"),
            ToolFailure::MissingDump { .. } => Some("generate the dump or drop --dump-dir"),
            _ => None,
        }
    }
}

impl Report for InconclusiveDumpIssue {
    fn path(&self) -> &str {
        &self.path
    }

    fn message(&self) -> String {
        format!(
            "dump has no declaration nodes ({} lines)",
            self.line_count
        )
    }

    fn details(&self) -> Vec<String> {
        self.first_line
            .iter()
            .map(|line| format!("dump starts with: {}", line))
            .collect()
    }

    fn hint(&self) -> Option<&str> {
        Some("the compiler must print -ast-dump output on stdout")
    }
}

impl Report for MismatchIssue {
    fn path(&self) -> &str {
        &self.path
    }

    fn message(&self) -> String {
        "export sets differ".to_string()
    }

    fn details(&self) -> Vec<String> {
        let mut details = Vec::new();
        if !self.only_dump.is_empty() {
            details.push(format!("only in dump: {}", self.only_dump.join(", ")));
        }
        if !self.only_heuristic.is_empty() {
            details.push(format!(
                "only in heuristic: {}",
                self.only_heuristic.join(", ")
            ));
        }
        details
    }
}

impl Report for EmptyExtractionIssue {
    fn path(&self) -> &str {
        &self.path
    }

    fn message(&self) -> String {
        format!("no exports found in {}", self.extractor)
    }
}

impl Report for CorrelationGapIssue {
    fn path(&self) -> &str {
        &self.path
    }

    fn message(&self) -> String {
        format!(
            "no import line found for '{}' within the correlation window",
            self.symbol
        )
    }

    fn hint(&self) -> Option<&str> {
        Some("raise correlationWindow in .modcovrc.json")
    }
}

impl Report for NoTestFileIssue {
    fn path(&self) -> &str {
        &self.path
    }

    fn message(&self) -> String {
        format!("no test file, expected {}", self.expected)
    }
}

impl Ord for Issue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.path()
            .cmp(other.path())
            .then_with(|| self.rule().cmp(&other.rule()))
            .then_with(|| self.message().cmp(&other.message()))
    }
}

impl PartialOrd for Issue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Flat JSON shape of an issue.
#[derive(Serialize)]
struct IssueRecord<'a> {
    severity: Severity,
    rule: Rule,
    path: &'a str,
    message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    details: Vec<String>,
}

impl Serialize for Issue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        IssueRecord {
            severity: self.severity(),
            rule: self.rule(),
            path: self.path(),
            message: self.message(),
            details: self.details(),
        }
        .serialize(serializer)
    }
}

// ============================================================
// Tests
// ============================================================
