//! Where declaration dumps come from.
//!
//! - `compiler`: run the compiler with its dump flags, bounded by a timeout
//! - `dump_dir`: read pre-generated `<file name>.ast` dumps from a directory
//!
//! Every failure is a [`ToolFailure`]; the pipeline turns it into a per-module
//! issue, so one broken module never aborts the run.

pub mod compiler;
pub mod dump_dir;

use std::{fmt, path::Path, path::PathBuf};

use enum_dispatch::enum_dispatch;

pub use compiler::CompilerDump;
pub use dump_dir::DumpDir;

#[enum_dispatch]
pub trait DumpSource {
    /// Produce the declaration dump text of `file`.
    fn dump(&self, file: &Path) -> Result<String, ToolFailure>;

    /// Human-readable description of what `dump` does for `file`.
    fn describe(&self, file: &Path) -> String;

    /// Check once, before any module is processed, that dumps can be produced at all.
    fn preflight(&self) -> Result<(), ToolFailure> {
        Ok(())
    }
}

#[enum_dispatch(DumpSource)]
#[derive(Debug, Clone)]
pub enum DumpProvider {
    Compiler(CompilerDump),
    Directory(DumpDir),
}

/// Why a dump could not be produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolFailure {
    NotFound {
        program: String,
    },
    Spawn {
        program: String,
        reason: String,
    },
    Timeout {
        program: String,
        secs: u64,
    },
    ExitStatus {
        program: String,
        code: Option<i32>,
        stderr: String,
    },
    EmptyOutput {
        tool: String,
    },
    Io {
        path: PathBuf,
        reason: String,
    },
    MissingDump {
        path: PathBuf,
    },
}

impl fmt::Display for ToolFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolFailure::NotFound { program } => write!(f, "'{}' not found", program),
            ToolFailure::Spawn { program, reason } => {
                write!(f, "failed to run '{}': {}", program, reason)
            }
            ToolFailure::Timeout { program, secs } => {
                write!(f, "'{}' timed out after {}s", program, secs)
            }
            ToolFailure::ExitStatus {
                program,
                code,
                stderr,
            } => {
                match code {
                    Some(code) => write!(f, "'{}' exited with code {}", program, code)?,
                    None => write!(f, "'{}' was terminated by a signal", program)?,
                }
                if !stderr.is_empty() {
                    write!(f, ": {}", stderr)?;
                }
                Ok(())
            }
            ToolFailure::EmptyOutput { tool } => write!(f, "'{}' produced no dump output", tool),
            ToolFailure::Io { path, reason } => {
                write!(f, "failed to read {}: {}", path.display(), reason)
            }
            ToolFailure::MissingDump { path } => write!(f, "dump file {} not found", path.display()),
        }
    }
}

impl std::error::Error for ToolFailure {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_exit_status() {
        let failure = ToolFailure::ExitStatus {
            program: "clang++".to_string(),
            code: Some(1),
            stderr: "format.cppm:3:1: error: unknown type name".to_string(),
        };
        assert_eq!(
            failure.to_string(),
            "'clang++' exited with code 1: format.cppm:3:1: error: unknown type name"
        );
    }

    #[test]
    fn test_display_signal_without_stderr() {
        let failure = ToolFailure::ExitStatus {
            program: "clang++".to_string(),
            code: None,
            stderr: String::new(),
        };
        assert_eq!(failure.to_string(), "'clang++' was terminated by a signal");
    }

    #[test]
    fn test_display_timeout() {
        let failure = ToolFailure::Timeout {
            program: "clang++".to_string(),
            secs: 30,
        };
        assert_eq!(failure.to_string(), "'clang++' timed out after 30s");
    }
}
