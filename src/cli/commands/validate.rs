use anyhow::Result;

use super::super::args::ValidateCommand;
use super::{CommandResult, CommandSummary, ValidateSummary, helper::finish};
use crate::core::{AnalysisContext, pipeline::validate_modules};

pub fn validate(cmd: ValidateCommand) -> Result<CommandResult> {
    let ctx = AnalysisContext::new(&cmd.common)?;

    let modules = if cmd.modules.is_empty() {
        ctx.discover_modules()?
    } else {
        cmd.modules
    };
    ctx.preflight()?;

    let results = validate_modules(&ctx, &modules, cmd.list_only)?;

    Ok(finish(
        CommandSummary::Validate(ValidateSummary {
            modules: results,
            list_only: cmd.list_only,
        }),
        true,
    ))
}
