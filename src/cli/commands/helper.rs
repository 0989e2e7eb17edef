use super::{CommandResult, CommandSummary};
use crate::issues::Severity;

pub fn finish(summary: CommandSummary, exit_on_errors: bool) -> CommandResult {
    let issues = summary.issues();

    let mut error_count = issues
        .iter()
        .filter(|i| i.severity() == Severity::Error)
        .count();
    let warning_count = issues
        .iter()
        .filter(|i| i.severity() == Severity::Warning)
        .count();

    if let CommandSummary::Init(ref summary) = summary
        && summary.error.is_some()
    {
        error_count += 1;
    }

    CommandResult {
        kind: summary.kind(),
        summary,
        error_count,
        warning_count,
        exit_on_errors,
    }
}
