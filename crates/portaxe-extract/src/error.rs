use crate::kind::InstallerKind;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("every extraction strategy failed for {kind} input\n{attempts}")]
    Exhausted { kind: InstallerKind, attempts: String },
}

pub type Result<T> = std::result::Result<T, Error>;
