use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use portaxe_platform::Tool;

use super::{ExtractionContext, ExtractionStrategy};
use crate::outcome::ExtractionOutcome;

/// Treats the input itself as the application payload.
#[derive(Clone, Copy, Debug, Default)]
pub struct DirectCopy;

impl ExtractionStrategy for DirectCopy {
    fn id(&self) -> &'static str {
        "direct-copy"
    }

    fn required_tool(&self) -> Option<Tool> {
        None
    }

    fn invoke(&self, input: &Path, output_dir: &Path, _ctx: &ExtractionContext<'_>) -> ExtractionOutcome {
        let Some(name) = input.file_name() else {
            return ExtractionOutcome::tool_failed(output_dir, "input has no file name");
        };
        match portaxe_fs::copy_file(input, output_dir.join(name)) {
            Ok(_) => ExtractionOutcome::success(output_dir, BTreeSet::from([PathBuf::from(name)])),
            Err(e) => ExtractionOutcome::tool_failed(output_dir, format!("copy failed: {e}")),
        }
    }
}
