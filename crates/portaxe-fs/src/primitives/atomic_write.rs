use crate::{Error, Result};
use std::fs;
use std::io::Write;
use std::path::Path;

#[derive(Clone, Copy, Debug)]
pub struct AtomicWriteOptions {
    prefix: &'static str,
    suffix: &'static str,
    sync:   bool,
}

impl Default for AtomicWriteOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl AtomicWriteOptions {
    pub fn new() -> Self {
        Self {
            prefix: ".tmp.",
            suffix: ".portaxe",
            sync:   true,
        }
    }

    pub fn prefix(mut self, prefix: &'static str) -> Self {
        self.prefix = prefix;
        self
    }

    pub fn suffix(mut self, suffix: &'static str) -> Self {
        self.suffix = suffix;
        self
    }

    pub fn sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }
}

/// Write `content` to `path` through a sibling temp file and a rename.
///
/// The temp file lives in the destination directory so the final rename never
/// crosses a filesystem boundary.
pub fn atomic_write(
    path: impl AsRef<Path>,
    content: &[u8],
    options: AtomicWriteOptions,
) -> Result<()> {
    let path = path.as_ref();
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .ok_or_else(|| Error::NoParent(path.to_path_buf()))?;

    let mut tmp = tempfile::Builder::new()
        .prefix(options.prefix)
        .suffix(options.suffix)
        .tempfile_in(parent)
        .map_err(|source| Error::Write {
            path: parent.to_path_buf(),
            source,
        })?;

    tmp.write_all(content).map_err(|source| Error::Write {
        path: tmp.path().to_path_buf(),
        source,
    })?;

    if options.sync {
        tmp.as_file().sync_all().map_err(|source| Error::Write {
            path: tmp.path().to_path_buf(),
            source,
        })?;
    }

    tmp.persist(path).map_err(|e| Error::Write {
        path:   path.to_path_buf(),
        source: e.error,
    })?;

    Ok(())
}

pub fn atomic_read(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    let path = path.as_ref();
    fs::read(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })
}
