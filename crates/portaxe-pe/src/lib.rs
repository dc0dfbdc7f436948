//! Native executable inspection.
//!
//! [`inspect`] turns a file on disk into a [`BinaryProfile`]: machine type,
//! subsystem, and the set of imported libraries. Parsing is total. Files without
//! a DOS header are not executables and yield `None`; damaged executables yield a
//! profile with `Unknown` fields and no imports.

mod profile;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixture;

pub use profile::{Architecture, BinaryProfile, Subsystem, inspect, inspect_bytes, is_pe_image};
