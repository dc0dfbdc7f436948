use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

/// Installer technology an input was built with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum InstallerKind {
    InnoSetup,
    #[serde(rename = "NSIS")]
    Nsis,
    #[serde(rename = "MSI")]
    Msi,
    InstallShield,
    WiXMsi,
    ArchiveZip,
    ArchiveRar,
    StandaloneExecutable,
    Unknown,
}

impl InstallerKind {
    pub const ALL: [InstallerKind; 9] = [
        Self::InnoSetup,
        Self::Nsis,
        Self::Msi,
        Self::InstallShield,
        Self::WiXMsi,
        Self::ArchiveZip,
        Self::ArchiveRar,
        Self::StandaloneExecutable,
        Self::Unknown,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::InnoSetup => "InnoSetup",
            Self::Nsis => "NSIS",
            Self::Msi => "MSI",
            Self::InstallShield => "InstallShield",
            Self::WiXMsi => "WiXMsi",
            Self::ArchiveZip => "ArchiveZip",
            Self::ArchiveRar => "ArchiveRar",
            Self::StandaloneExecutable => "StandaloneExecutable",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for InstallerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        })
    }
}

/// What the classifier concluded about one input, and why.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ClassificationResult {
    pub input_path: PathBuf,
    pub kind:       InstallerKind,
    pub confidence: Confidence,
    /// Matched signatures, in the order they were checked.
    pub evidence:   Vec<String>,
}

impl ClassificationResult {
    pub fn is_ambiguous(&self) -> bool {
        self.confidence == Confidence::Low
    }
}
