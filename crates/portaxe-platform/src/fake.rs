//! A [`ToolRunner`] that never spawns anything.
//!
//! Each registered tool gets a script that receives the argument list and returns
//! the report (or error) the real tool would have produced. Scripts typically write
//! files into the destination found with [`destination`].

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::runner::{RunReport, ToolRunner};
use crate::tool::Tool;

type Script = Box<dyn Fn(&[OsString]) -> Result<RunReport> + Send + Sync>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invocation {
    pub tool: Tool,
    pub args: Vec<OsString>,
}

#[derive(Default)]
pub struct ScriptedRunner {
    scripts: BTreeMap<Tool, Script>,
    calls:   Mutex<Vec<Invocation>>,
}

impl ScriptedRunner {
    /// A machine with no extraction tools installed.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tool<F>(mut self, tool: Tool, script: F) -> Self
    where
        F: Fn(&[OsString]) -> Result<RunReport> + Send + Sync + 'static,
    {
        self.scripts.insert(tool, Box::new(script));
        self
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn fake_path(tool: Tool) -> PathBuf {
        PathBuf::from("/fake/bin").join(tool.name())
    }
}

impl ToolRunner for ScriptedRunner {
    fn locate(&self, tool: Tool) -> Option<PathBuf> {
        self.scripts.contains_key(&tool).then(|| Self::fake_path(tool))
    }

    fn run(&self, program: &Path, args: &[OsString], _timeout: Duration) -> Result<RunReport> {
        let Some((tool, script)) = self
            .scripts
            .iter()
            .find(|(tool, _)| Self::fake_path(**tool) == program)
        else {
            return Err(Error::CommandNotFound {
                cmd: program.display().to_string(),
            });
        };
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(Invocation {
                tool: *tool,
                args: args.to_vec(),
            });
        }
        script(args)
    }
}

/// Report for a process that exited with `code`.
pub fn exited(code: i32) -> RunReport {
    RunReport {
        exit_code: Some(code),
        ..Default::default()
    }
}

/// Destination directory encoded in a tool's argument template.
pub fn destination(tool: Tool, args: &[OsString]) -> Option<PathBuf> {
    let args: Vec<String> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();
    match tool {
        Tool::SevenZip => args
            .iter()
            .find_map(|a| a.strip_prefix("-o").map(PathBuf::from)),
        Tool::InnoExtract => args
            .iter()
            .position(|a| a == "-d")
            .and_then(|i| args.get(i + 1))
            .map(PathBuf::from),
        Tool::MsiExec => args
            .iter()
            .find_map(|a| a.strip_prefix("TARGETDIR=").map(PathBuf::from)),
    }
}
