use crate::command::Command;
use crate::error::Result;
use crate::tool::Tool;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DIAGNOSTIC_TAIL: usize = 2048;

/// Outcome of a tool process that exited on its own.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunReport {
    pub exit_code: Option<i32>,
    pub stdout:    String,
    pub stderr:    String,
    pub elapsed:   Duration,
}

impl RunReport {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Short human-readable summary for logs and failure records.
    pub fn diagnostic(&self) -> String {
        let code = match self.exit_code {
            Some(code) => format!("exit code {code}"),
            None => "terminated by signal".to_string(),
        };
        let detail = if self.stderr.trim().is_empty() {
            tail(self.stdout.trim(), DIAGNOSTIC_TAIL)
        } else {
            tail(self.stderr.trim(), DIAGNOSTIC_TAIL)
        };
        if detail.is_empty() {
            code
        } else {
            format!("{code}: {detail}")
        }
    }
}

fn tail(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut start = s.len() - max;
    while !s.is_char_boundary(start) {
        start += 1;
    }
    &s[start..]
}

/// Seam between extraction strategies and real processes.
pub trait ToolRunner: Send + Sync {
    /// Where `tool` lives, or `None` if it is not installed.
    fn locate(&self, tool: Tool) -> Option<PathBuf>;

    /// Run `program` to completion, killing it once `timeout` elapses.
    fn run(&self, program: &Path, args: &[OsString], timeout: Duration) -> Result<RunReport>;
}

/// Runs tools found on this machine.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemRunner;

impl ToolRunner for SystemRunner {
    fn locate(&self, tool: Tool) -> Option<PathBuf> {
        tool.locate()
    }

    fn run(&self, program: &Path, args: &[OsString], timeout: Duration) -> Result<RunReport> {
        tracing::debug!(program = %program.display(), ?args, "spawning tool");
        let output = Command::from_path(program)
            .args(args)
            .run_with_timeout(timeout)?;
        Ok(RunReport {
            exit_code: output.status.code(),
            stdout:    output.stdout,
            stderr:    output.stderr,
            elapsed:   output.elapsed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn success_requires_zero_exit() {
        let ok = RunReport {
            exit_code: Some(0),
            ..Default::default()
        };
        let failed = RunReport {
            exit_code: Some(2),
            ..Default::default()
        };
        let killed = RunReport::default();
        assert!(ok.success());
        assert!(!failed.success());
        assert!(!killed.success());
    }

    #[test]
    fn diagnostic_prefers_stderr() {
        let report = RunReport {
            exit_code: Some(2),
            stdout: "progress".into(),
            stderr: "ERROR: Can not open the file as archive\n".into(),
            ..Default::default()
        };
        assert_eq!(report.diagnostic(), "exit code 2: ERROR: Can not open the file as archive");
    }

    #[test]
    fn diagnostic_is_bounded() {
        let report = RunReport {
            exit_code: Some(1),
            stderr: "é".repeat(5000),
            ..Default::default()
        };
        assert!(report.diagnostic().len() <= DIAGNOSTIC_TAIL + "exit code 1: ".len() + 1);
    }

    #[test]
    fn system_runner_reports_missing_program() {
        let result = SystemRunner.run(
            Path::new("portaxe-no-such-tool-xyz"),
            &[],
            Duration::from_secs(5),
        );
        assert!(matches!(result, Err(Error::CommandNotFound { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn system_runner_runs_program() {
        let sh = which::which("sh").unwrap();
        let report = SystemRunner
            .run(
                &sh,
                &["-c".into(), "exit 0".into()],
                Duration::from_secs(10),
            )
            .unwrap();
        assert!(report.success());
    }
}
