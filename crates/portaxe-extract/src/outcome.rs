use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutcomeStatus {
    Success,
    ToolUnavailable,
    ToolFailed,
    NoFilesProduced,
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Success => "success",
            Self::ToolUnavailable => "tool unavailable",
            Self::ToolFailed => "tool failed",
            Self::NoFilesProduced => "no files produced",
        })
    }
}

/// Result of one strategy attempt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ExtractionOutcome {
    pub status:         OutcomeStatus,
    /// Paths relative to `output_dir`. Empty unless `status` is `Success`.
    pub produced_files: BTreeSet<PathBuf>,
    pub output_dir:     PathBuf,
    pub diagnostic:     String,
}

impl ExtractionOutcome {
    pub fn success(output_dir: &Path, files: BTreeSet<PathBuf>) -> Self {
        let diagnostic = format!("{} file(s) extracted", files.len());
        Self {
            status: OutcomeStatus::Success,
            produced_files: files,
            output_dir: output_dir.to_path_buf(),
            diagnostic,
        }
    }

    pub fn tool_unavailable(output_dir: &Path, diagnostic: impl Into<String>) -> Self {
        Self::failure(OutcomeStatus::ToolUnavailable, output_dir, diagnostic)
    }

    pub fn tool_failed(output_dir: &Path, diagnostic: impl Into<String>) -> Self {
        Self::failure(OutcomeStatus::ToolFailed, output_dir, diagnostic)
    }

    pub fn no_files(output_dir: &Path, diagnostic: impl Into<String>) -> Self {
        Self::failure(OutcomeStatus::NoFilesProduced, output_dir, diagnostic)
    }

    fn failure(status: OutcomeStatus, output_dir: &Path, diagnostic: impl Into<String>) -> Self {
        Self {
            status,
            produced_files: BTreeSet::new(),
            output_dir: output_dir.to_path_buf(),
            diagnostic: diagnostic.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Success
    }
}
