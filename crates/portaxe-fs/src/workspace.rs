use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Scratch directory owned by one conversion job.
///
/// A temporary work dir is removed on drop unless [`WorkDir::keep`] was called.
/// A caller-supplied directory is never removed.
pub struct WorkDir {
    path:    PathBuf,
    cleanup: bool,
}

impl WorkDir {
    /// Create a fresh temporary work dir.
    pub fn temp(prefix: &str) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(prefix)
            .tempdir()
            .map_err(|source| Error::Write {
                path: std::env::temp_dir(),
                source,
            })?;
        Ok(Self {
            path:    dir.keep(),
            cleanup: true,
        })
    }

    /// Use an existing (or to-be-created) directory chosen by the caller.
    pub fn at(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            std::fs::create_dir_all(&path).map_err(|source| Error::Write {
                path: path.clone(),
                source,
            })?;
        }
        Ok(Self {
            path,
            cleanup: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Leave the directory on disk after drop, for post-mortem inspection.
    pub fn keep(mut self) -> PathBuf {
        self.cleanup = false;
        self.path.clone()
    }
}

impl Drop for WorkDir {
    fn drop(&mut self) {
        if self.cleanup {
            if let Err(e) = std::fs::remove_dir_all(&self.path) {
                tracing::debug!(path = %self.path.display(), error = %e, "work dir cleanup failed");
            }
        }
    }
}
