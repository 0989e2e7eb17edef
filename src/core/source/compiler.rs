use std::{
    io::{self, Read},
    path::Path,
    process::{Child, Command, ExitStatus, Stdio},
    thread,
    time::{Duration, Instant},
};

use super::{DumpSource, ToolFailure};

/// Flags appended after the configured arguments.
pub const DUMP_FLAGS: &[&str] = &["-Xclang", "-ast-dump", "-fsyntax-only"];

const VERSION_FLAG: &str = "--version";

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Runs `<program> <args...> -Xclang -ast-dump -fsyntax-only <file>`.
#[derive(Debug, Clone)]
pub struct CompilerDump {
    pub program: String,
    pub args: Vec<String>,
    pub timeout: Duration,
    /// Exit codes accepted as success. The dump is still required to be non-empty.
    pub allowed_exit_codes: Vec<i32>,
}

impl CompilerDump {
    pub fn arguments(&self, file: &Path) -> Vec<String> {
        self.args
            .iter()
            .cloned()
            .chain(DUMP_FLAGS.iter().map(|s| s.to_string()))
            .chain(std::iter::once(file.to_string_lossy().into_owned()))
            .collect()
    }

    /// Run the program with `args`, bounded by the timeout.
    /// Returns the exit code and the captured stdout and stderr.
    fn run(&self, args: &[String]) -> Result<(Option<i32>, String, String), ToolFailure> {
        let mut child = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => ToolFailure::NotFound {
                    program: self.program.clone(),
                },
                _ => ToolFailure::Spawn {
                    program: self.program.clone(),
                    reason: e.to_string(),
                },
            })?;

        // Drain both pipes concurrently; a full pipe would block the child.
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let status = self.wait(&mut child)?;
        Ok((status.code(), collect(stdout), collect(stderr)))
    }

    fn wait(&self, child: &mut Child) -> Result<ExitStatus, ToolFailure> {
        let deadline = Instant::now() + self.timeout;
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Ok(status),
                Ok(None) if Instant::now() >= deadline => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(ToolFailure::Timeout {
                        program: self.program.clone(),
                        secs: self.timeout.as_secs(),
                    });
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(e) => {
                    let _ = child.kill();
                    return Err(ToolFailure::Spawn {
                        program: self.program.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }
    }
}

impl DumpSource for CompilerDump {
    fn dump(&self, file: &Path) -> Result<String, ToolFailure> {
        let (code, stdout, stderr) = self.run(&self.arguments(file))?;

        if !code.is_some_and(|c| self.allowed_exit_codes.contains(&c)) {
            return Err(ToolFailure::ExitStatus {
                program: self.program.clone(),
                code,
                stderr: summarize_stderr(&stderr),
            });
        }

        if stdout.trim().is_empty() {
            return Err(ToolFailure::EmptyOutput {
                tool: self.program.clone(),
            });
        }

        Ok(stdout)
    }

    /// `<program> --version` must exit 0.
    fn preflight(&self) -> Result<(), ToolFailure> {
        let (code, _, stderr) = self.run(&[VERSION_FLAG.to_string()])?;
        if code == Some(0) {
            Ok(())
        } else {
            Err(ToolFailure::ExitStatus {
                program: self.program.clone(),
                code,
                stderr: summarize_stderr(&stderr),
            })
        }
    }

    fn describe(&self, file: &Path) -> String {
        std::iter::once(self.program.clone())
            .chain(self.arguments(file))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        buf
    })
}

fn collect(handle: Option<thread::JoinHandle<Vec<u8>>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}

/// First diagnostic line mentioning an error, else the first non-empty line.
fn summarize_stderr(stderr: &str) -> String {
    let mut lines = stderr.lines().map(str::trim).filter(|l| !l.is_empty());
    stderr
        .lines()
        .map(str::trim)
        .find(|l| l.contains("error"))
        .or_else(|| lines.next())
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn compiler(program: &str, args: &[&str]) -> CompilerDump {
        CompilerDump {
            program: program.to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
            timeout: Duration::from_secs(5),
            allowed_exit_codes: vec![0],
        }
    }

    #[test]
    fn test_arguments_append_dump_flags_and_file() {
        let cc = compiler("clang++", &["-std=c++20"]);
        assert_eq!(
            cc.arguments(Path::new("src/format.cppm")),
            vec![
                "-std=c++20",
                "-Xclang",
                "-ast-dump",
                "-fsyntax-only",
                "src/format.cppm"
            ]
        );
        assert_eq!(
            cc.describe(Path::new("src/format.cppm")),
            "clang++ -std=c++20 -Xclang -ast-dump -fsyntax-only src/format.cppm"
        );
    }

    #[test]
    fn test_missing_program() {
        let cc = compiler("modcov-test-no-such-compiler", &[]);
        let err = cc.dump(Path::new("format.cppm")).unwrap_err();
        assert_eq!(
            err,
            ToolFailure::NotFound {
                program: "modcov-test-no-such-compiler".to_string()
            }
        );
    }

    #[test]
    fn test_preflight_missing_program() {
        let cc = compiler("modcov-test-no-such-compiler", &[]);
        assert_eq!(
            cc.preflight(),
            Err(ToolFailure::NotFound {
                program: "modcov-test-no-such-compiler".to_string()
            })
        );
    }

    #[test]
    fn test_summarize_stderr_prefers_errors() {
        let stderr = "In file included from x.cppm:1:\nx.cppm:3:1: error: boom\n1 error generated.";
        assert_eq!(summarize_stderr(stderr), "x.cppm:3:1: error: boom");
        assert_eq!(summarize_stderr("\n  note: only\n"), "note: only");
        assert_eq!(summarize_stderr(""), "");
    }

    // `sh -c <script>` ignores the trailing dump flags and file (they become $0, $1, ...).
    #[cfg(unix)]
    mod shell {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_stdout_is_returned() {
            let cc = compiler("sh", &["-c", "echo 'TranslationUnitDecl 0x1'"]);
            let dump = cc.dump(Path::new("format.cppm")).unwrap();
            assert_eq!(dump.trim(), "TranslationUnitDecl 0x1");
        }

        #[test]
        fn test_disallowed_exit_code() {
            let cc = compiler("sh", &["-c", "echo out; echo 'fatal error: nope' >&2; exit 3"]);
            let err = cc.dump(Path::new("format.cppm")).unwrap_err();
            assert_eq!(
                err,
                ToolFailure::ExitStatus {
                    program: "sh".to_string(),
                    code: Some(3),
                    stderr: "fatal error: nope".to_string(),
                }
            );
        }

        #[test]
        fn test_allowed_nonzero_exit_code() {
            let mut cc = compiler("sh", &["-c", "echo out; exit 1"]);
            cc.allowed_exit_codes = vec![0, 1];
            assert_eq!(cc.dump(Path::new("format.cppm")).unwrap().trim(), "out");
        }

        #[test]
        fn test_empty_output() {
            let cc = compiler("sh", &["-c", "exit 0"]);
            let err = cc.dump(Path::new("format.cppm")).unwrap_err();
            assert_eq!(
                err,
                ToolFailure::EmptyOutput {
                    tool: "sh".to_string()
                }
            );
        }

        #[test]
        fn test_preflight_checks_exit_code() {
            assert_eq!(compiler("true", &[]).preflight(), Ok(()));
            assert!(matches!(
                compiler("false", &[]).preflight(),
                Err(ToolFailure::ExitStatus { code: Some(1), .. })
            ));
        }

        #[test]
        fn test_timeout_kills_child() {
            let mut cc = compiler("sh", &["-c", "sleep 5"]);
            cc.timeout = Duration::from_millis(200);
            let started = Instant::now();
            let err = cc.dump(Path::new("format.cppm")).unwrap_err();
            assert!(matches!(err, ToolFailure::Timeout { .. }));
            assert!(started.elapsed() < Duration::from_secs(4));
        }
    }
}
