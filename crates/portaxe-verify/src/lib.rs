//! Content digests for portable layout manifests.
//!
//! Every file placed into a portable layout is hashed after it is finalized on disk.
//! The digest is computed in a single streaming pass, so large payloads never need
//! to be held in memory.
//!
//! # Example
//!
//! ```
//! use portaxe_verify::{Sha256Hasher, VerifiedReader};
//!
//! let data = b"hello world";
//! let expected = Sha256Hasher::digest(b"hello world");
//!
//! let mut reader = VerifiedReader::new(&data[..], Sha256Hasher::new());
//! let mut sink = Vec::new();
//! std::io::copy(&mut reader, &mut sink).unwrap();
//!
//! reader.finish(&expected).unwrap();
//! ```

pub use self::error::{Result, VerifyError};
pub use self::file::{FileDigest, digest_file, digest_reader, verify_file};
pub use self::hasher::{Hasher, Sha256Hasher};
pub use self::reader::VerifiedReader;

mod error;
mod file;
mod hasher;
mod reader;
