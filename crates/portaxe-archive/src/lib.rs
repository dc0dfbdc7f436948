//! Archive format sniffing and native extraction.
//!
//! Only ZIP containers are unpacked in-process; everything else is handed to an
//! external tool by the caller. Every entry path is sanitized before anything
//! touches disk, so a hostile archive cannot write outside the destination.

pub use error::{Error, Result};
pub use extract::{ExtractReport, extract_zip};
pub use format::{ArchiveFormat, detect_format, detect_from_path};
pub use sanitize::sanitize_entry_path;

mod error;
mod extract;
mod format;
mod sanitize;
