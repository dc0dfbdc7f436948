//! Installer classification and extraction.
//!
//! ```text
//! input ──classify──▶ ClassificationResult ──Orchestrator::run──▶ ExtractionSession
//!                                              │
//!                               Registry::strategies_for(kind)
//!                               tried in order until one succeeds
//! ```
//!
//! A session is data: every attempt and its outcome is kept, and only
//! [`ExtractionSession::into_extracted`] turns it into something a layout
//! builder will accept.

pub use classify::{Classifier, DEFAULT_SCAN_LIMIT, classify};
pub use error::{Error, Result};
pub use kind::{ClassificationResult, Confidence, InstallerKind};
pub use orchestrator::Orchestrator;
pub use outcome::{ExtractionOutcome, OutcomeStatus};
pub use registry::Registry;
pub use session::{Attempt, ExtractionSession, Extracted};
pub use strategy::{
    DirectCopy, ExtractionContext, ExtractionStrategy, GenericArchive, InnoExtract,
    NativeInstallerApi, ToolPolicy,
};

mod classify;
mod error;
mod kind;
mod orchestrator;
mod outcome;
mod registry;
mod session;
mod strategy;
