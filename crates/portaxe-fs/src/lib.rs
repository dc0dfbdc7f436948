//! Filesystem primitives for building portable application layouts.
//!
//! - [`atomic_write`] finalizes a file with temp-file + rename, so a reader either
//!   sees the complete content or nothing.
//! - [`copy_file`] places one file, creating parents as needed.
//! - [`list_files`] yields a deterministic, sorted view of a tree.
//! - [`WorkDir`] owns a scratch directory for one conversion job.

mod error;
mod primitives;
mod workspace;

pub use error::{Error, Result};
pub use primitives::{
    AtomicWriteOptions, atomic_read, atomic_write, copy_file, list_files, to_slash_path,
};
pub use workspace::WorkDir;
