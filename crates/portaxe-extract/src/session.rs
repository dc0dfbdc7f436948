use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{Error, Result};
use crate::kind::ClassificationResult;
use crate::outcome::ExtractionOutcome;

/// One strategy invocation and what came of it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Attempt {
    pub strategy: &'static str,
    pub outcome:  ExtractionOutcome,
}

/// Complete record of one orchestration run.
///
/// Built once by the orchestrator and never mutated afterwards.
#[derive(Clone, Debug, Serialize)]
pub struct ExtractionSession {
    classification: ClassificationResult,
    work_dir:       PathBuf,
    attempts:       Vec<Attempt>,
    final_outcome:  Option<ExtractionOutcome>,
}

impl ExtractionSession {
    pub(crate) fn new(classification: ClassificationResult, work_dir: PathBuf, attempts: Vec<Attempt>) -> Self {
        let final_outcome = attempts.last().map(|a| a.outcome.clone());
        Self {
            classification,
            work_dir,
            attempts,
            final_outcome,
        }
    }

    pub fn classification(&self) -> &ClassificationResult {
        &self.classification
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn attempts(&self) -> &[Attempt] {
        &self.attempts
    }

    /// Outcome of the last attempt; `None` only when no strategy was registered.
    pub fn final_outcome(&self) -> Option<&ExtractionOutcome> {
        self.final_outcome.as_ref()
    }

    pub fn is_success(&self) -> bool {
        self.final_outcome.as_ref().is_some_and(ExtractionOutcome::is_success)
    }

    /// Numbered, one line per attempt.
    pub fn attempt_log(&self) -> String {
        if self.attempts.is_empty() {
            return format!("  no extraction strategy registered for {}", self.classification.kind);
        }
        let mut log = String::new();
        for (n, attempt) in self.attempts.iter().enumerate() {
            if n > 0 {
                log.push('\n');
            }
            let _ = write!(
                log,
                "  {}. {}: {} ({})",
                n + 1,
                attempt.strategy,
                attempt.outcome.status,
                attempt.outcome.diagnostic
            );
        }
        log
    }

    /// The only way to obtain an [`Extracted`] payload.
    pub fn into_extracted(self) -> Result<Extracted> {
        match self.final_outcome.clone() {
            Some(outcome) if outcome.is_success() => Ok(Extracted {
                session: self,
                outcome,
            }),
            _ => Err(Error::Exhausted {
                kind:     self.classification.kind,
                attempts: self.attempt_log(),
            }),
        }
    }
}

/// A session that ended in success.
#[derive(Clone, Debug)]
pub struct Extracted {
    session: ExtractionSession,
    outcome: ExtractionOutcome,
}

impl Extracted {
    pub fn session(&self) -> &ExtractionSession {
        &self.session
    }

    pub fn classification(&self) -> &ClassificationResult {
        &self.session.classification
    }

    /// Directory the successful strategy wrote into.
    pub fn output_dir(&self) -> &Path {
        &self.outcome.output_dir
    }

    /// Produced files relative to [`Self::output_dir`], sorted.
    pub fn files(&self) -> &BTreeSet<PathBuf> {
        &self.outcome.produced_files
    }

    pub fn strategy(&self) -> &'static str {
        self.session
            .attempts
            .last()
            .map(|a| a.strategy)
            .unwrap_or_default()
    }
}
