//! Report formatting and printing.
//!
//! Text output is cargo-style for issues and column-aligned for symbol
//! tables. Whether anything is colored is decided by [`OutputStyle`], which the
//! caller builds from `--no-color` and the terminal check; nothing here reads
//! process-wide state. `--format json` serializes the same records instead.

use std::io::{self, Write};

use anyhow::Result;
use colored::{ColoredString, Colorize};
use serde_json::json;
use unicode_width::UnicodeWidthStr;

use super::{
    args::OutputFormat,
    commands::{
        CommandResult, CommandSummary, CoverageSummary, InitSummary, ValidateSummary,
    },
};
use crate::{
    core::{
        CoverageStatus, ModuleCoverage, ModuleValidation, ValidationStatus,
        exports::ExportedSymbol, usage::CoveredSymbol,
    },
    issues::{Issue, Report, Severity},
    utils::{format_percent, pluralize},
};

/// Success mark for consistent output formatting.
pub const SUCCESS_MARK: &str = "\u{2713}"; // ✓

/// Failure mark for consistent output formatting.
pub const FAILURE_MARK: &str = "\u{2718}"; // ✘

const SKIPPED_MARK: &str = "-";

/// Maximum number of usage sites to display per symbol.
const MAX_USAGES_DISPLAY: usize = 3;

/// How output is rendered.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputStyle {
    pub color: bool,
    pub format: OutputFormat,
    pub verbose: bool,
}

impl OutputStyle {
    fn paint(&self, text: &str, f: impl FnOnce(&str) -> ColoredString) -> String {
        if self.color {
            f(text).to_string()
        } else {
            text.to_string()
        }
    }
}

/// Print a command result to stdout, diagnostics to stderr.
pub fn print(result: &CommandResult, style: &OutputStyle) -> Result<()> {
    print_to(
        result,
        style,
        &mut io::stdout().lock(),
        &mut io::stderr().lock(),
    )
}

/// Print a command result to custom writers.
pub fn print_to<W: Write, E: Write>(
    result: &CommandResult,
    style: &OutputStyle,
    out: &mut W,
    err: &mut E,
) -> Result<()> {
    if style.verbose {
        print_notes(&result.summary, style, err)?;
    }

    match (&result.summary, style.format) {
        (CommandSummary::Init(summary), _) => print_init(summary, style, out, err)?,
        (summary, OutputFormat::Json) => {
            writeln!(out, "{}", serde_json::to_string_pretty(&json_report(summary))?)?
        }
        (CommandSummary::Validate(summary), OutputFormat::Text) => {
            print_validate(summary, style, out)?;
            print_problems(result, style, out)?;
        }
        (CommandSummary::Coverage(summary), OutputFormat::Text) => {
            print_coverage(summary, style, out)?;
            print_problems(result, style, out)?;
        }
    }
    Ok(())
}

// ============================================================
// Validate
// ============================================================

fn print_validate<W: Write>(
    summary: &ValidateSummary,
    style: &OutputStyle,
    out: &mut W,
) -> io::Result<()> {
    for module in &summary.modules {
        print_validation_header(module, style, out)?;
        if summary.list_only || style.verbose {
            print_symbol_table(&module.symbols, out)?;
        }
        print_issues(&module.issues, style, out)?;
    }

    let total = summary.modules.len();
    let failed = summary.failed_count();
    if summary.list_only {
        let exports: usize = summary.modules.iter().map(|m| m.symbols.len()).sum();
        writeln!(
            out,
            "\nListed {} in {}",
            pluralize(exports, "export"),
            pluralize(total, "module")
        )?;
    }
    if failed > 0 {
        writeln!(
            out,
            "\n{} {}",
            style.paint(FAILURE_MARK, |s| s.red()),
            style.paint(
                &format!("{} of {} failed validation", failed, pluralize(total, "module")),
                |s| s.red()
            )
        )?;
    } else if !summary.list_only {
        writeln!(
            out,
            "\n{} {}",
            style.paint(SUCCESS_MARK, |s| s.green()),
            style.paint(
                &format!("Validated {} - all exports match", pluralize(total, "module")),
                |s| s.green()
            )
        )?;
    }
    Ok(())
}

fn print_validation_header<W: Write>(
    module: &ModuleValidation,
    style: &OutputStyle,
    out: &mut W,
) -> io::Result<()> {
    let title = format!("{} ({})", module.module, module.path.display());
    let exports = pluralize(module.symbols.len(), "export");
    match module.status {
        ValidationStatus::Passed | ValidationStatus::Mismatch => {
            let percent = module
                .reconciliation
                .as_ref()
                .map(|r| format_percent(r.match_percent()))
                .unwrap_or_default();
            let mark = if module.status == ValidationStatus::Passed {
                style.paint(SUCCESS_MARK, |s| s.green())
            } else {
                style.paint(FAILURE_MARK, |s| s.red())
            };
            writeln!(
                out,
                "{} {}: {}, {} match",
                mark,
                style.paint(&title, |s| s.bold()),
                exports,
                percent
            )
        }
        ValidationStatus::Listed => {
            writeln!(out, "{}: {}", style.paint(&title, |s| s.bold()), exports)
        }
        ValidationStatus::Failed => writeln!(
            out,
            "{} {}: failed",
            style.paint(FAILURE_MARK, |s| s.red()),
            style.paint(&title, |s| s.bold())
        ),
    }
}

fn print_symbol_table<W: Write>(symbols: &[ExportedSymbol], out: &mut W) -> io::Result<()> {
    let name_width = column_width(symbols.iter().map(|s| s.name.as_str()));
    let kinds: Vec<String> = symbols.iter().map(|s| s.kind.to_string()).collect();
    let kind_width = column_width(kinds.iter().map(String::as_str));

    for (symbol, kind) in symbols.iter().zip(&kinds) {
        let line = symbol
            .line
            .map(|l| l.to_string())
            .unwrap_or_else(|| "?".to_string());
        writeln!(
            out,
            "    {}  {}  {}",
            pad(&symbol.name, name_width),
            pad(kind, kind_width),
            line
        )?;
    }
    Ok(())
}

// ============================================================
// Coverage
// ============================================================

fn print_coverage<W: Write>(
    summary: &CoverageSummary,
    style: &OutputStyle,
    out: &mut W,
) -> io::Result<()> {
    for module in &summary.modules {
        print_coverage_module(module, style, out)?;
        print_issues(&module.issues, style, out)?;
    }

    let totals = &summary.totals;
    let mut line = match totals.percent() {
        Some(percent) => format!(
            "Overall: {}/{} exports used ({}) across {}",
            totals.used,
            totals.total,
            format_percent(percent),
            pluralize(totals.measured, "module")
        ),
        None => format!(
            "Overall: no exports across {}",
            pluralize(totals.measured, "module")
        ),
    };
    if totals.skipped > 0 {
        line.push_str(&format!(", {} skipped", totals.skipped));
    }
    if totals.failed > 0 {
        line.push_str(&format!(", {} failed", totals.failed));
    }
    writeln!(out, "\n{}", style.paint(&line, |s| s.bold()))
}

fn print_coverage_module<W: Write>(
    module: &ModuleCoverage,
    style: &OutputStyle,
    out: &mut W,
) -> io::Result<()> {
    let title = format!(
        "{} ({} -> {})",
        module.module,
        module.path.display(),
        module.test_path.display()
    );

    match (module.status, &module.report) {
        (CoverageStatus::Measured, Some(report)) => {
            match report.percent() {
                Some(percent) => writeln!(
                    out,
                    "{}: {}/{} exports used ({})",
                    style.paint(&title, |s| s.bold()),
                    report.used,
                    report.total,
                    format_percent(percent)
                )?,
                None => writeln!(out, "{}: no exports", style.paint(&title, |s| s.bold()))?,
            }
            print_covered_symbols(&report.symbols, style, out)
        }
        (CoverageStatus::Skipped, _) => writeln!(
            out,
            "{} {}: skipped",
            style.paint(SKIPPED_MARK, |s| s.dimmed()),
            style.paint(&module.module, |s| s.bold())
        ),
        _ => writeln!(
            out,
            "{} {}: failed",
            style.paint(FAILURE_MARK, |s| s.red()),
            style.paint(&title, |s| s.bold())
        ),
    }
}

fn print_covered_symbols<W: Write>(
    symbols: &[CoveredSymbol],
    style: &OutputStyle,
    out: &mut W,
) -> io::Result<()> {
    let name_width = column_width(symbols.iter().map(|s| s.name.as_str()));
    let kinds: Vec<String> = symbols
        .iter()
        .map(|s| s.kind.map(|k| k.to_string()).unwrap_or_default())
        .collect();
    let kind_width = column_width(kinds.iter().map(String::as_str));

    for (symbol, kind) in symbols.iter().zip(&kinds) {
        let mark = if symbol.is_used() {
            style.paint(SUCCESS_MARK, |s| s.green())
        } else {
            style.paint(FAILURE_MARK, |s| s.red())
        };
        let kind_column = if kind_width > 0 {
            format!("{}  ", pad(kind, kind_width))
        } else {
            String::new()
        };
        writeln!(
            out,
            "  {} {}  {}{}",
            mark,
            pad(&symbol.name, name_width),
            kind_column,
            pluralize(symbol.count, "use")
        )?;

        let total = symbol.records.len();
        let shown = total.min(MAX_USAGES_DISPLAY);
        for (i, record) in symbol.records.iter().take(shown).enumerate() {
            let remaining = total - shown;
            let suffix = if i == shown - 1 && remaining > 0 {
                format!(" (and {} more)", remaining)
            } else {
                String::new()
            };
            writeln!(
                out,
                "      {} line {}: {}{}",
                style.paint(&record.kind.to_string(), |s| s.cyan()),
                record.line,
                record.context,
                suffix
            )?;
        }
    }
    Ok(())
}

// ============================================================
// Issues and diagnostics
// ============================================================

fn print_issues<W: Write>(issues: &[Issue], style: &OutputStyle, out: &mut W) -> io::Result<()> {
    let mut sorted: Vec<&Issue> = issues.iter().collect();
    sorted.sort();
    for issue in sorted {
        print_issue(issue, style, out)?;
    }
    Ok(())
}

fn print_issue<W: Write>(issue: &Issue, style: &OutputStyle, out: &mut W) -> io::Result<()> {
    let severity = match issue.severity() {
        Severity::Error => style.paint("error", |s| s.bold().red()),
        Severity::Warning => style.paint("warning", |s| s.bold().yellow()),
    };
    writeln!(
        out,
        "{}: {}  {}",
        severity,
        issue.message(),
        style.paint(&issue.rule().to_string(), |s| s.dimmed().cyan())
    )?;
    writeln!(out, "  {} {}", style.paint("-->", |s| s.blue()), issue.path())?;
    for detail in issue.details() {
        writeln!(
            out,
            "  {} {} {}",
            style.paint("=", |s| s.blue()),
            style.paint("note:", |s| s.bold()),
            detail
        )?;
    }
    if let Some(hint) = issue.hint() {
        writeln!(
            out,
            "  {} {} {}",
            style.paint("=", |s| s.blue()),
            style.paint("hint:", |s| s.bold().cyan()),
            hint
        )?;
    }
    Ok(())
}

fn print_problems<W: Write>(
    result: &CommandResult,
    style: &OutputStyle,
    out: &mut W,
) -> io::Result<()> {
    let total_problems = result.error_count + result.warning_count;
    if total_problems > 0 {
        writeln!(
            out,
            "{} {} problems ({} {}, {} {})",
            style.paint(FAILURE_MARK, |s| s.red()),
            total_problems,
            result.error_count,
            style.paint(
                if result.error_count == 1 { "error" } else { "errors" },
                |s| s.red()
            ),
            result.warning_count,
            style.paint(
                if result.warning_count == 1 {
                    "warning"
                } else {
                    "warnings"
                },
                |s| s.yellow()
            )
        )?;
    }
    Ok(())
}

fn print_notes<E: Write>(summary: &CommandSummary, style: &OutputStyle, err: &mut E) -> io::Result<()> {
    let notes: Vec<(&str, &[String])> = match summary {
        CommandSummary::Validate(s) => s
            .modules
            .iter()
            .map(|m| (m.module.as_str(), m.notes.as_slice()))
            .collect(),
        CommandSummary::Coverage(s) => s
            .modules
            .iter()
            .map(|m| (m.module.as_str(), m.notes.as_slice()))
            .collect(),
        CommandSummary::Init(_) => Vec::new(),
    };
    for (module, lines) in notes {
        for line in lines {
            writeln!(err, "{} [{}] {}", style.paint("note:", |s| s.bold()), module, line)?;
        }
    }
    Ok(())
}

fn print_init<W: Write, E: Write>(
    summary: &InitSummary,
    style: &OutputStyle,
    out: &mut W,
    err: &mut E,
) -> io::Result<()> {
    match &summary.error {
        Some(error) => writeln!(err, "Error: {}", error),
        None => writeln!(
            out,
            "{} {}",
            style.paint(SUCCESS_MARK, |s| s.green()),
            style.paint(&format!("Created {}", summary.path.display()), |s| s.green())
        ),
    }
}

// ============================================================
// JSON
// ============================================================

fn json_report(summary: &CommandSummary) -> serde_json::Value {
    match summary {
        CommandSummary::Validate(s) => json!({
            "command": "validate",
            "listOnly": s.list_only,
            "modules": s.modules,
            "summary": {
                "modules": s.modules.len(),
                "failed": s.failed_count(),
            },
        }),
        CommandSummary::Coverage(s) => json!({
            "command": "coverage",
            "strategy": s.strategy,
            "exports": s.exports,
            "modules": s.modules,
            "summary": s.totals,
        }),
        CommandSummary::Init(s) => json!({
            "command": "init",
            "path": s.path,
            "error": s.error,
        }),
    }
}

// ============================================================
// Layout helpers
// ============================================================

fn column_width<'a>(cells: impl Iterator<Item = &'a str>) -> usize {
    cells.map(UnicodeWidthStr::width).max().unwrap_or(0)
}

/// Left-align `text` to `width` display columns.
fn pad(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(UnicodeWidthStr::width(text));
    format!("{}{}", text, " ".repeat(fill))
}

// ============================================================
// Tests
// ============================================================
