use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use portaxe_platform::ToolRunner;

use crate::kind::ClassificationResult;
use crate::outcome::ExtractionOutcome;
use crate::registry::Registry;
use crate::session::{Attempt, ExtractionSession};
use crate::strategy::{ExtractionContext, ToolPolicy};

/// Runs a kind's strategies in registry order until one succeeds.
pub struct Orchestrator {
    registry: Arc<Registry>,
    runner:   Arc<dyn ToolRunner>,
    policy:   ToolPolicy,
}

impl Orchestrator {
    pub fn new(registry: Arc<Registry>, runner: Arc<dyn ToolRunner>) -> Self {
        Self {
            registry,
            runner,
            policy: ToolPolicy::default(),
        }
    }

    pub fn policy(mut self, policy: ToolPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Attempt extraction of the classified input into `work_dir`.
    ///
    /// Attempt `n` writes into `<work_dir>/<n>-<strategy id>/`. Each attempt is
    /// bounded by `timeout` on its own. The first success ends the run; later
    /// strategies are never invoked.
    pub fn run(&self, classification: ClassificationResult, work_dir: &Path, timeout: Duration) -> ExtractionSession {
        let input = absolute(&classification.input_path);
        let ctx = ExtractionContext {
            runner: self.runner.as_ref(),
            policy: &self.policy,
            timeout,
        };

        let mut attempts = Vec::new();
        for (n, strategy) in self.registry.strategies_for(classification.kind).iter().enumerate() {
            let output_dir = work_dir.join(format!("{}-{}", n + 1, strategy.id()));
            let outcome = match std::fs::create_dir_all(&output_dir) {
                Ok(()) => strategy.invoke(&input, &output_dir, &ctx),
                Err(e) => ExtractionOutcome::tool_failed(
                    &output_dir,
                    format!("cannot create attempt directory: {e}"),
                ),
            };

            if outcome.is_success() {
                tracing::info!(
                    strategy = strategy.id(),
                    files = outcome.produced_files.len(),
                    "extraction succeeded"
                );
            } else {
                tracing::info!(
                    strategy = strategy.id(),
                    status = %outcome.status,
                    diagnostic = %outcome.diagnostic,
                    "extraction attempt failed"
                );
            }

            let done = outcome.is_success();
            attempts.push(Attempt {
                strategy: strategy.id(),
                outcome,
            });
            if done {
                break;
            }
        }

        let session = ExtractionSession::new(classification, work_dir.to_path_buf(), attempts);
        if !session.is_success() {
            tracing::warn!(
                kind = %session.classification().kind,
                attempts = session.attempts().len(),
                "all extraction strategies exhausted"
            );
        }
        session
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
