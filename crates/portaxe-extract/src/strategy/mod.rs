//! Extraction strategies.
//!
//! A strategy turns `(input, output_dir)` into an [`ExtractionOutcome`] and holds
//! no state between calls. Strategies backed by an external program check for it
//! first and report [`OutcomeStatus::ToolUnavailable`] without running anything
//! when it is missing or disabled.

mod archive;
mod copy;
mod inno;
mod msi;

pub use archive::GenericArchive;
pub use copy::DirectCopy;
pub use inno::InnoExtract;
pub use msi::NativeInstallerApi;

use std::collections::BTreeSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use portaxe_platform::{Error as PlatformError, Tool, ToolRunner};

use crate::outcome::ExtractionOutcome;

pub trait ExtractionStrategy: Send + Sync {
    /// Stable identifier, used in attempt logs and attempt directory names.
    fn id(&self) -> &'static str;

    fn required_tool(&self) -> Option<Tool>;

    fn invoke(&self, input: &Path, output_dir: &Path, ctx: &ExtractionContext<'_>) -> ExtractionOutcome;
}

/// Which external tools configuration allows at all.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ToolPolicy {
    pub use_7zip:        bool,
    pub use_innoextract: bool,
    pub use_msi_extract: bool,
}

impl Default for ToolPolicy {
    fn default() -> Self {
        Self {
            use_7zip:        true,
            use_innoextract: true,
            use_msi_extract: true,
        }
    }
}

impl ToolPolicy {
    pub fn enabled(&self, tool: Tool) -> bool {
        match tool {
            Tool::SevenZip => self.use_7zip,
            Tool::InnoExtract => self.use_innoextract,
            Tool::MsiExec => self.use_msi_extract,
        }
    }

    pub fn disable(mut self, tool: Tool) -> Self {
        match tool {
            Tool::SevenZip => self.use_7zip = false,
            Tool::InnoExtract => self.use_innoextract = false,
            Tool::MsiExec => self.use_msi_extract = false,
        }
        self
    }
}

/// Everything a strategy may touch besides its input and output directory.
#[derive(Clone, Copy)]
pub struct ExtractionContext<'a> {
    pub runner:  &'a dyn ToolRunner,
    pub policy:  &'a ToolPolicy,
    pub timeout: Duration,
}

/// Top-level names an archive tool produces when it splits a plain PE into sections.
const PE_SECTION_PREFIXES: &[&str] = &[".text", ".data", ".rdata", ".bss", ".idata", ".edata", ".rsrc"];

impl ExtractionContext<'_> {
    /// Resolve `tool`, or the `ToolUnavailable` outcome explaining why not.
    pub fn tool_path(&self, tool: Tool, output_dir: &Path) -> Result<PathBuf, ExtractionOutcome> {
        if !self.policy.enabled(tool) {
            return Err(ExtractionOutcome::tool_unavailable(
                output_dir,
                format!("{tool} disabled by configuration"),
            ));
        }
        self.runner
            .locate(tool)
            .ok_or_else(|| ExtractionOutcome::tool_unavailable(output_dir, format!("{tool} not found")))
    }

    /// Run a located tool and judge what it left in `output_dir`.
    pub fn run_tool(&self, tool: Tool, program: &Path, args: Vec<OsString>, output_dir: &Path) -> ExtractionOutcome {
        match self.runner.run(program, &args, self.timeout) {
            Ok(report) if report.success() => collect_output(output_dir),
            Ok(report) => ExtractionOutcome::tool_failed(output_dir, format!("{tool}: {}", report.diagnostic())),
            Err(PlatformError::CommandNotFound { cmd }) => {
                ExtractionOutcome::tool_unavailable(output_dir, format!("{tool} could not be started: {cmd}"))
            }
            Err(PlatformError::Timeout { timeout_secs, .. }) => {
                ExtractionOutcome::tool_failed(output_dir, format!("{tool} timed out after {timeout_secs}s"))
            }
            Err(e) => ExtractionOutcome::tool_failed(output_dir, format!("{tool}: {e}")),
        }
    }
}

/// Turn whatever is under `output_dir` into an outcome.
pub(crate) fn collect_output(output_dir: &Path) -> ExtractionOutcome {
    let files = match portaxe_fs::list_files(output_dir) {
        Ok(files) => files,
        Err(e) => return ExtractionOutcome::tool_failed(output_dir, format!("cannot list output: {e}")),
    };
    if files.is_empty() {
        return ExtractionOutcome::no_files(output_dir, "tool reported success but produced no files");
    }
    if looks_like_dissected_pe(&files) {
        return ExtractionOutcome::no_files(
            output_dir,
            "output looks like raw PE sections, not installer payload",
        );
    }
    ExtractionOutcome::success(output_dir, files.into_iter().collect::<BTreeSet<_>>())
}

fn looks_like_dissected_pe(files: &[PathBuf]) -> bool {
    let top_level: BTreeSet<String> = files
        .iter()
        .filter_map(|f| f.components().next())
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    top_level
        .iter()
        .filter(|name| PE_SECTION_PREFIXES.iter().any(|p| name.starts_with(p)))
        .count()
        > 3
}
