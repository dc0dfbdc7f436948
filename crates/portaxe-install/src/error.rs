use std::io;
use std::path::PathBuf;

use portaxe_extract::InstallerKind;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("every extraction strategy failed for {kind} input:\n{attempts}")]
    ExtractionExhausted { kind: InstallerKind, attempts: String },

    #[error("layout build failed at '{path}': {source}")]
    LayoutBuildFailed { path: PathBuf, source: io::Error },

    #[error("target already holds a finished portable layout: '{0}'")]
    TargetExists(PathBuf),

    #[error("target holds files from an unfinished build, remove it first: '{0}'")]
    IncompleteTarget(PathBuf),

    #[error("work directory unavailable: {0}")]
    WorkDir(#[source] portaxe_fs::Error),

    #[error("manifest '{path}' is unreadable: {source}")]
    ManifestUnreadable { path: PathBuf, source: io::Error },
}

impl From<portaxe_extract::Error> for Error {
    fn from(e: portaxe_extract::Error) -> Self {
        match e {
            portaxe_extract::Error::Exhausted { kind, attempts } => Self::ExtractionExhausted { kind, attempts },
        }
    }
}

impl Error {
    pub(crate) fn layout(path: impl Into<PathBuf>, source: impl Into<io::Error>) -> Self {
        Self::LayoutBuildFailed {
            path:   path.into(),
            source: source.into(),
        }
    }
}

pub(crate) fn fs_io(e: portaxe_fs::Error) -> io::Error {
    match e {
        portaxe_fs::Error::Write { source, .. } | portaxe_fs::Error::Read { source, .. } => source,
        other => io::Error::other(other),
    }
}

pub(crate) fn verify_io(e: portaxe_verify::VerifyError) -> io::Error {
    match e {
        portaxe_verify::VerifyError::Read { source, .. } | portaxe_verify::VerifyError::Io(source) => source,
        other => io::Error::other(other),
    }
}

pub type Result<T> = std::result::Result<T, Error>;
