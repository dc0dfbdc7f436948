use std::path::Path;

use portaxe_platform::Tool;

use super::{ExtractionContext, ExtractionStrategy};
use crate::outcome::ExtractionOutcome;

/// Unpacks Inno Setup installers with `innoextract <input> -d <dest> -s`.
#[derive(Clone, Copy, Debug, Default)]
pub struct InnoExtract;

impl ExtractionStrategy for InnoExtract {
    fn id(&self) -> &'static str {
        "innoextract"
    }

    fn required_tool(&self) -> Option<Tool> {
        Some(Tool::InnoExtract)
    }

    fn invoke(&self, input: &Path, output_dir: &Path, ctx: &ExtractionContext<'_>) -> ExtractionOutcome {
        let program = match ctx.tool_path(Tool::InnoExtract, output_dir) {
            Ok(program) => program,
            Err(outcome) => return outcome,
        };
        let args = vec![input.into(), "-d".into(), output_dir.into(), "-s".into()];
        ctx.run_tool(Tool::InnoExtract, &program, args, output_dir)
    }
}
