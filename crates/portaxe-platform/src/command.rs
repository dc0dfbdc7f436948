use crate::error::{Error, Result};
use std::ffi::OsStr;
use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command as StdCommand, ExitStatus, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug)]
pub struct Command {
    inner:   StdCommand,
    program: String,
}

/// Result of a command that ran to completion within its time bound.
#[derive(Debug)]
pub struct CommandOutput {
    pub status:  ExitStatus,
    pub stdout:  String,
    pub stderr:  String,
    pub elapsed: Duration,
}

impl Command {
    /// Run the executable at an already-resolved location.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            program: path.display().to_string(),
            inner:   StdCommand::new(path),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.inner.args(args);
        self
    }

    /// Spawn, capture output, and kill the child if it outlives `timeout`.
    ///
    /// Output pipes are drained on background threads so a chatty child can never
    /// block on a full pipe while we poll for its exit.
    pub fn run_with_timeout(mut self, timeout: Duration) -> Result<CommandOutput> {
        self.inner
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let start = Instant::now();
        let mut child = self.inner.spawn().map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::CommandNotFound {
                cmd: self.program.clone(),
            },
            _ => Error::CommandFailed {
                cmd:    self.program.clone(),
                source: e,
            },
        })?;

        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = wait_with_timeout(&mut child, timeout, start).map_err(|e| match e {
            WaitError::Timeout => Error::Timeout {
                cmd:          self.program.clone(),
                timeout_secs: timeout.as_secs(),
            },
            WaitError::Io(source) => Error::CommandFailed {
                cmd: self.program.clone(),
                source,
            },
        });

        let stdout = join(stdout);
        let stderr = join(stderr);
        let status = status?;

        Ok(CommandOutput {
            status,
            stdout,
            stderr,
            elapsed: start.elapsed(),
        })
    }
}

enum WaitError {
    Timeout,
    Io(std::io::Error),
}

fn wait_with_timeout(
    child: &mut Child,
    timeout: Duration,
    start: Instant,
) -> std::result::Result<ExitStatus, WaitError> {
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) => {
                if start.elapsed() > timeout {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(WaitError::Timeout);
                }
                std::thread::sleep(POLL_INTERVAL);
            }
            Err(e) => return Err(WaitError::Io(e)),
        }
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<String>> {
    pipe.map(|mut pipe| {
        std::thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            String::from_utf8_lossy(&buf).into_owned()
        })
    })
}

fn join(handle: Option<JoinHandle<String>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}
