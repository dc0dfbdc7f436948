use std::ffi::OsString;
use std::path::Path;

use portaxe_archive::ArchiveFormat;
use portaxe_platform::Tool;

use super::{ExtractionContext, ExtractionStrategy, collect_output};
use crate::outcome::ExtractionOutcome;

/// Unpacks anything an archive tool can open.
///
/// ZIP inputs are unpacked in-process; everything else goes through 7-Zip with
/// `x <input> -o<dest> -y -bb1`. The same parameters are used for every
/// installer kind.
#[derive(Clone, Copy, Debug, Default)]
pub struct GenericArchive;

impl ExtractionStrategy for GenericArchive {
    fn id(&self) -> &'static str {
        "generic-archive"
    }

    fn required_tool(&self) -> Option<Tool> {
        Some(Tool::SevenZip)
    }

    fn invoke(&self, input: &Path, output_dir: &Path, ctx: &ExtractionContext<'_>) -> ExtractionOutcome {
        if !ctx.policy.enabled(Tool::SevenZip) {
            return ExtractionOutcome::tool_unavailable(output_dir, "7-zip disabled by configuration");
        }

        if let Ok(Some(ArchiveFormat::Zip)) = portaxe_archive::detect_from_path(input) {
            return extract_zip_natively(input, output_dir);
        }

        let program = match ctx.tool_path(Tool::SevenZip, output_dir) {
            Ok(program) => program,
            Err(outcome) => return outcome,
        };
        let mut dest = OsString::from("-o");
        dest.push(output_dir);
        let args = vec!["x".into(), input.into(), dest, "-y".into(), "-bb1".into()];
        ctx.run_tool(Tool::SevenZip, &program, args, output_dir)
    }
}

fn extract_zip_natively(input: &Path, output_dir: &Path) -> ExtractionOutcome {
    match portaxe_archive::extract_zip(input, output_dir) {
        Ok(report) if report.files.is_empty() => {
            ExtractionOutcome::no_files(output_dir, "ZIP archive contains no files")
        }
        Ok(report) => {
            tracing::debug!(files = report.files.len(), bytes = report.bytes, "native zip extraction");
            collect_output(output_dir)
        }
        Err(e) => ExtractionOutcome::tool_failed(output_dir, format!("native zip extraction: {e}")),
    }
}
