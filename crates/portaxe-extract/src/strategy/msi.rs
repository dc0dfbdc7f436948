use std::ffi::OsString;
use std::path::Path;

use portaxe_platform::Tool;

use super::{ExtractionContext, ExtractionStrategy, collect_output};
use crate::outcome::ExtractionOutcome;

/// Administrative install through Windows Installer:
/// `msiexec /a <input> /qn TARGETDIR=<dest>`.
#[derive(Clone, Copy, Debug, Default)]
pub struct NativeInstallerApi;

impl ExtractionStrategy for NativeInstallerApi {
    fn id(&self) -> &'static str {
        "msiexec-admin"
    }

    fn required_tool(&self) -> Option<Tool> {
        Some(Tool::MsiExec)
    }

    fn invoke(&self, input: &Path, output_dir: &Path, ctx: &ExtractionContext<'_>) -> ExtractionOutcome {
        let program = match ctx.tool_path(Tool::MsiExec, output_dir) {
            Ok(program) => program,
            Err(outcome) => return outcome,
        };
        let mut target = OsString::from("TARGETDIR=");
        target.push(output_dir);
        let args = vec!["/a".into(), input.into(), "/qn".into(), target];

        let outcome = ctx.run_tool(Tool::MsiExec, &program, args, output_dir);
        if !outcome.is_success() {
            return outcome;
        }

        // An administrative install leaves a copy of the package next to its payload.
        if let Some(name) = input.file_name() {
            let copy = output_dir.join(name);
            if copy.is_file() && std::fs::remove_file(&copy).is_ok() {
                return collect_output(output_dir);
            }
        }
        outcome
    }
}
