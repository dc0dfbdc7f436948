use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to write '{path}': {source}")]
    Write {
        path:   PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read '{path}': {source}")]
    Read {
        path:   PathBuf,
        source: std::io::Error,
    },

    #[error("path '{path}' is not inside '{base}'")]
    OutsideBase { path: PathBuf, base: PathBuf },

    #[error("path has no parent directory: '{0}'")]
    NoParent(PathBuf),
}

impl Error {
    /// Path the failed operation was acting on.
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::Write { path, .. } | Self::Read { path, .. } | Self::OutsideBase { path, .. } => {
                path
            }
            Self::NoParent(path) => path,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
