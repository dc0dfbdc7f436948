use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};

use goblin::pe::PE;
use goblin::pe::header::{COFF_MACHINE_ARM64, COFF_MACHINE_X86, COFF_MACHINE_X86_64, Header};
use serde::Serialize;

/// Upper bound on how much of one file is read for analysis.
const MAX_IMAGE_BYTES: u64 = 256 * 1024 * 1024;

const MZ_MAGIC: [u8; 2] = *b"MZ";

const SUBSYSTEM_WINDOWS_GUI: u16 = 2;
const SUBSYSTEM_WINDOWS_CUI: u16 = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Architecture {
    #[serde(rename = "x86")]
    X86,
    #[serde(rename = "x64")]
    X64,
    #[serde(rename = "arm64")]
    Arm64,
    #[serde(rename = "unknown")]
    Unknown,
}

impl Architecture {
    fn from_machine(machine: u16) -> Self {
        match machine {
            COFF_MACHINE_X86 => Self::X86,
            COFF_MACHINE_X86_64 => Self::X64,
            COFF_MACHINE_ARM64 => Self::Arm64,
            _ => Self::Unknown,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Subsystem {
    Windows,
    Console,
    Unknown,
}

impl Subsystem {
    fn from_raw(value: u16) -> Self {
        match value {
            SUBSYSTEM_WINDOWS_GUI => Self::Windows,
            SUBSYSTEM_WINDOWS_CUI => Self::Console,
            _ => Self::Unknown,
        }
    }
}

/// Structural summary of one PE image.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BinaryProfile {
    pub path:               PathBuf,
    pub architecture:       Architecture,
    pub subsystem:          Subsystem,
    /// Lowercase library names from the import table.
    pub imported_libraries: BTreeSet<String>,
    pub sections:           Vec<String>,
    pub is_dll:             bool,
    /// A DOS header was present but the image could not be parsed.
    pub malformed:          bool,
}

impl BinaryProfile {
    fn unreadable(path: PathBuf) -> Self {
        Self {
            path,
            architecture: Architecture::Unknown,
            subsystem: Subsystem::Unknown,
            imported_libraries: BTreeSet::new(),
            sections: Vec::new(),
            is_dll: false,
            malformed: true,
        }
    }

    fn from_pe(path: PathBuf, pe: &PE<'_>) -> Self {
        let imported_libraries = pe
            .libraries
            .iter()
            .copied()
            .chain(pe.imports.iter().map(|i| i.dll))
            .map(|name| {
                name.chars()
                    .filter(|c| !c.is_control())
                    .collect::<String>()
                    .to_ascii_lowercase()
            })
            .filter(|name| !name.is_empty())
            .collect();

        let sections = pe
            .sections
            .iter()
            .map(|s| match s.name() {
                Ok(name) => name.to_string(),
                Err(_) => String::from_utf8_lossy(&s.name).trim_end_matches('\0').to_string(),
            })
            .collect();

        Self {
            path,
            architecture: Architecture::from_machine(pe.header.coff_header.machine),
            subsystem: pe
                .header
                .optional_header
                .as_ref()
                .map_or(Subsystem::Unknown, |o| Subsystem::from_raw(o.windows_fields.subsystem)),
            imported_libraries,
            sections,
            is_dll: pe.is_lib,
            malformed: false,
        }
    }

    pub fn is_gui(&self) -> bool {
        self.subsystem == Subsystem::Windows && !self.is_dll
    }
}

/// True when `data` carries a DOS header pointing at a PE signature and COFF header.
pub fn is_pe_image(data: &[u8]) -> bool {
    data.starts_with(&MZ_MAGIC) && matches!(catch_unwind(|| Header::parse(data).is_ok()), Ok(true))
}

/// Inspect the file at `path`.
///
/// Returns `None` for files that do not start with a DOS header, including files
/// that cannot be opened. Damage past the DOS header never fails: it yields a
/// profile marked `malformed`.
pub fn inspect(path: impl AsRef<Path>) -> Option<BinaryProfile> {
    let path = path.as_ref();
    let mut data = Vec::new();
    let read = File::open(path).and_then(|f| f.take(MAX_IMAGE_BYTES).read_to_end(&mut data));
    if let Err(e) = read {
        tracing::debug!(path = %path.display(), error = %e, "binary not readable");
        return None;
    }
    inspect_bytes(path, &data)
}

/// Inspect an in-memory image, attributing the result to `path`.
pub fn inspect_bytes(path: impl Into<PathBuf>, data: &[u8]) -> Option<BinaryProfile> {
    if !data.starts_with(&MZ_MAGIC) {
        return None;
    }
    let path = path.into();

    match catch_unwind(AssertUnwindSafe(|| PE::parse(data))) {
        Ok(Ok(pe)) => Some(BinaryProfile::from_pe(path, &pe)),
        Ok(Err(e)) => {
            tracing::debug!(path = %path.display(), error = %e, "damaged PE image");
            Some(BinaryProfile::unreadable(path))
        }
        Err(_) => {
            tracing::debug!(path = %path.display(), "PE parser gave up on image");
            Some(BinaryProfile::unreadable(path))
        }
    }
}
