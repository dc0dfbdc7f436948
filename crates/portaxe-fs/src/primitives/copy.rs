use crate::{Error, Result};
use std::fs;
use std::path::Path;

/// Copy one file, creating the destination's parent directories first.
///
/// Returns the number of bytes copied.
pub fn copy_file(src: impl AsRef<Path>, dest: impl AsRef<Path>) -> Result<u64> {
    let src = src.as_ref();
    let dest = dest.as_ref();

    if let Some(parent) = dest.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).map_err(|source| Error::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }

    fs::copy(src, dest).map_err(|source| {
        if src.exists() {
            Error::Write {
                path: dest.to_path_buf(),
                source,
            }
        } else {
            Error::Read {
                path: src.to_path_buf(),
                source,
            }
        }
    })
}
