//! External tool discovery and bounded subprocess execution.
//!
//! This crate is the only place that touches real processes. Everything above it
//! talks to [`ToolRunner`], which tests replace with a scripted fake.

pub use command::{Command, CommandOutput};
pub use error::{Error, Result};
pub use runner::{RunReport, SystemRunner, ToolRunner};
pub use tool::Tool;

pub mod command;
#[cfg(any(test, feature = "fixtures"))]
pub mod fake;
mod error;
pub mod runner;
pub mod tool;
