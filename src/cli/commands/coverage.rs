use anyhow::Result;

use super::super::args::CoverageCommand;
use super::{CommandResult, CommandSummary, CoverageSummary, helper::finish};
use crate::core::{
    AnalysisContext, CoverageOptions, CoverageTotals, file_scanner::ModuleInput,
    file_scanner::module_name, pipeline::analyze_modules,
};

pub fn coverage(cmd: CoverageCommand) -> Result<CommandResult> {
    let ctx = AnalysisContext::new(&cmd.common)?;

    // An explicit pair must exist; discovered modules without tests are skipped.
    let (inputs, skip_missing_tests) = match (cmd.module, cmd.test) {
        (Some(module_path), Some(test_path)) => (
            vec![ModuleInput {
                name: module_name(&module_path),
                module_path,
                test_path,
            }],
            false,
        ),
        _ => {
            let modules = ctx.discover_modules()?;
            (modules.iter().map(|m| ctx.pair(m)).collect(), true)
        }
    };

    let options = CoverageOptions {
        strategy: cmd.strategy,
        exports: cmd.exports,
        skip_missing_tests,
    };
    if options.needs_dumps() {
        ctx.preflight()?;
    }
    let modules = analyze_modules(&ctx, &inputs, options)?;
    let totals = CoverageTotals::from_modules(&modules);

    Ok(finish(
        CommandSummary::Coverage(CoverageSummary {
            modules,
            totals,
            strategy: cmd.strategy,
            exports: cmd.exports,
        }),
        false,
    ))
}
