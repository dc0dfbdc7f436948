use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use crate::kind::{ClassificationResult, Confidence, InstallerKind};

/// Bytes of the input searched for installer markers.
pub const DEFAULT_SCAN_LIMIT: u64 = 8 * 1024 * 1024;

/// A byte sequence that identifies an installer technology.
struct Marker {
    kind:  InstallerKind,
    bytes: &'static [u8],
    label: &'static str,
}

/// Container magic numbers, only meaningful at offset 0.
const CONTAINER_MAGIC: &[Marker] = &[
    Marker {
        kind:  InstallerKind::Msi,
        bytes: &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1],
        label: "structured storage header",
    },
    Marker {
        kind:  InstallerKind::ArchiveZip,
        bytes: b"PK\x03\x04",
        label: "ZIP local file header",
    },
    Marker {
        kind:  InstallerKind::ArchiveZip,
        bytes: b"PK\x05\x06",
        label: "empty ZIP central directory",
    },
    Marker {
        kind:  InstallerKind::ArchiveRar,
        bytes: b"Rar!\x1A\x07\x01\x00",
        label: "RAR5 signature",
    },
    Marker {
        kind:  InstallerKind::ArchiveRar,
        bytes: b"Rar!\x1A\x07\x00",
        label: "RAR signature",
    },
];

/// Structural markers searched anywhere in the scan window.
const BINARY_MARKERS: &[Marker] = &[
    Marker {
        kind:  InstallerKind::InnoSetup,
        bytes: b"rDlPtS",
        label: "Inno Setup loader offset table",
    },
    Marker {
        kind:  InstallerKind::InnoSetup,
        bytes: b"Inno Setup Setup Data (",
        label: "Inno Setup setup data header",
    },
    Marker {
        kind:  InstallerKind::Nsis,
        bytes: b"\xEF\xBE\xAD\xDENullsoftInst",
        label: "NSIS first header",
    },
    Marker {
        kind:  InstallerKind::InstallShield,
        bytes: b"ISSetupStream",
        label: "InstallShield setup stream",
    },
];

/// Plain-text hints; weaker than any structural marker.
const TEXT_MARKERS: &[Marker] = &[
    Marker {
        kind:  InstallerKind::InnoSetup,
        bytes: b"Inno Setup",
        label: "'Inno Setup' text",
    },
    Marker {
        kind:  InstallerKind::Nsis,
        bytes: b"Nullsoft",
        label: "'Nullsoft' text",
    },
    Marker {
        kind:  InstallerKind::InstallShield,
        bytes: b"InstallShield",
        label: "'InstallShield' text",
    },
    Marker {
        kind:  InstallerKind::WiXMsi,
        bytes: b"Windows Installer XML",
        label: "'Windows Installer XML' text",
    },
    Marker {
        kind:  InstallerKind::WiXMsi,
        bytes: b"WiX Toolset",
        label: "'WiX Toolset' text",
    },
];

const WIX_BURN_SECTION: &str = ".wixburn";

/// Assigns an [`InstallerKind`] from leading bytes and embedded markers.
///
/// Checks run in a fixed order and the first hit wins, so a structural match
/// always beats a textual one.
#[derive(Clone, Copy, Debug)]
pub struct Classifier {
    scan_limit: u64,
}

impl Default for Classifier {
    fn default() -> Self {
        Self {
            scan_limit: DEFAULT_SCAN_LIMIT,
        }
    }
}

impl Classifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scan_limit(mut self, bytes: u64) -> Self {
        self.scan_limit = bytes.max(64);
        self
    }

    /// Never fails: unreadable or unrecognised inputs are `Unknown` with `Low` confidence.
    pub fn classify(&self, path: impl AsRef<Path>) -> ClassificationResult {
        let path = path.as_ref();
        let result = match read_prefix(path, self.scan_limit) {
            Ok(data) => self.classify_bytes(path, &data),
            Err(e) => result(path, InstallerKind::Unknown, Confidence::Low, format!("unreadable: {e}")),
        };

        if result.is_ambiguous() {
            tracing::warn!(
                input = %path.display(),
                evidence = ?result.evidence,
                "installer type not recognised"
            );
        } else {
            tracing::info!(
                input = %path.display(),
                kind = %result.kind,
                confidence = %result.confidence,
                "classified input"
            );
        }
        result
    }

    fn classify_bytes(&self, path: &Path, data: &[u8]) -> ClassificationResult {
        if data.is_empty() {
            return result(path, InstallerKind::Unknown, Confidence::Low, "empty file".into());
        }

        if let Some(m) = CONTAINER_MAGIC.iter().find(|m| data.starts_with(m.bytes)) {
            return result(path, m.kind, Confidence::High, format!("{} at offset 0", m.label));
        }

        for m in BINARY_MARKERS {
            if let Some(offset) = find(data, m.bytes) {
                return result(path, m.kind, Confidence::High, format!("{} at offset {offset:#x}", m.label));
            }
        }

        let profile = portaxe_pe::is_pe_image(data)
            .then(|| portaxe_pe::inspect_bytes(path, data))
            .flatten();

        if let Some(p) = &profile {
            if p.sections.iter().any(|s| s == WIX_BURN_SECTION) {
                return result(
                    path,
                    InstallerKind::WiXMsi,
                    Confidence::High,
                    format!("WiX Burn bundle section '{WIX_BURN_SECTION}'"),
                );
            }
        }

        for m in TEXT_MARKERS {
            if let Some(offset) = find(data, m.bytes) {
                let mut r = result(path, m.kind, Confidence::Medium, format!("{} at offset {offset:#x}", m.label));
                r.evidence.push("no structural installer signature".into());
                return r;
            }
        }

        match profile {
            Some(p) => result(
                path,
                InstallerKind::StandaloneExecutable,
                Confidence::High,
                format!(
                    "PE image ({:?}, {:?} subsystem) without installer markers",
                    p.architecture, p.subsystem
                ),
            ),
            None => result(
                path,
                InstallerKind::Unknown,
                Confidence::Low,
                format!("no known signature in the first {} bytes", data.len()),
            ),
        }
    }
}

/// Classify with the default scan window.
pub fn classify(path: impl AsRef<Path>) -> ClassificationResult {
    Classifier::default().classify(path)
}

fn result(path: &Path, kind: InstallerKind, confidence: Confidence, evidence: String) -> ClassificationResult {
    ClassificationResult {
        input_path: path.to_path_buf(),
        kind,
        confidence,
        evidence: vec![evidence],
    }
}

fn read_prefix(path: &Path, limit: u64) -> io::Result<Vec<u8>> {
    let mut data = Vec::new();
    File::open(path)?.take(limit).read_to_end(&mut data)?;
    Ok(data)
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    let (&first, rest) = needle.split_first()?;
    let mut start = 0;
    while let Some(pos) = haystack[start..].iter().position(|&b| b == first) {
        let at = start + pos;
        if haystack[at + 1..].starts_with(rest) {
            return Some(at);
        }
        start = at + 1;
    }
    None
}
