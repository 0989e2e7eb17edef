use anyhow::{Result, bail};

use super::{
    args::{Arguments, Command},
    commands::{CommandResult, coverage::coverage, init::init, validate::validate},
};

/// Dispatches to the appropriate command handler based on the parsed arguments.
///
/// # Returns
/// - `Ok(CommandResult)` with error/warning counts and exit behavior
/// - `Err` if the command cannot run at all (bad config, no modules, ...)
pub fn run(Arguments { command }: Arguments) -> Result<CommandResult> {
    match command {
        Some(Command::Validate(cmd)) => validate(cmd),
        Some(Command::Coverage(cmd)) => coverage(cmd),
        Some(Command::Init) => init(),
        None => bail!("No command provided. Use --help to see available commands."),
    }
}
