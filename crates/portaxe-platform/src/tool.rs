use serde::Serialize;
use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;

/// External programs an extraction strategy may depend on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Tool {
    #[serde(rename = "7-zip")]
    SevenZip,
    #[serde(rename = "innoextract")]
    InnoExtract,
    #[serde(rename = "msiexec")]
    MsiExec,
}

impl Tool {
    pub const ALL: [Tool; 3] = [Tool::SevenZip, Tool::InnoExtract, Tool::MsiExec];

    pub fn name(self) -> &'static str {
        match self {
            Self::SevenZip => "7-zip",
            Self::InnoExtract => "innoextract",
            Self::MsiExec => "msiexec",
        }
    }

    /// Executable names searched on `PATH`, in preference order.
    pub fn candidates(self) -> &'static [&'static str] {
        match self {
            Self::SevenZip => &["7z", "7za", "7zz"],
            Self::InnoExtract => &["innoextract"],
            Self::MsiExec => &["msiexec"],
        }
    }

    /// Install locations checked before `PATH`.
    pub fn well_known_paths(self) -> Vec<PathBuf> {
        self.install_locations(|var| std::env::var_os(var))
    }

    fn install_locations(self, var: impl Fn(&str) -> Option<OsString>) -> Vec<PathBuf> {
        let mut paths = Vec::new();
        match self {
            Self::SevenZip => {
                for name in ["ProgramFiles", "ProgramFiles(x86)", "ProgramW6432"] {
                    if let Some(root) = var(name) {
                        paths.push(PathBuf::from(root).join("7-Zip").join("7z.exe"));
                    }
                }
                paths.push(PathBuf::from(r"C:\Program Files\7-Zip\7z.exe"));
                paths.push(PathBuf::from(r"C:\Program Files (x86)\7-Zip\7z.exe"));
            }
            Self::InnoExtract => {
                for name in ["ProgramFiles", "ProgramFiles(x86)"] {
                    if let Some(root) = var(name) {
                        paths.push(PathBuf::from(root).join("innoextract").join("innoextract.exe"));
                    }
                }
            }
            Self::MsiExec => {
                if let Some(root) = var("SystemRoot") {
                    paths.push(PathBuf::from(root).join("System32").join("msiexec.exe"));
                }
                paths.push(PathBuf::from(r"C:\Windows\System32\msiexec.exe"));
            }
        }
        paths.dedup();
        paths
    }

    /// Resolve the tool to an executable path. A well-known install location
    /// wins over whatever `PATH` resolves first.
    pub fn locate(self) -> Option<PathBuf> {
        self.locate_among(self.well_known_paths())
    }

    fn locate_among(self, installed: Vec<PathBuf>) -> Option<PathBuf> {
        if let Some(path) = installed.into_iter().find(|p| p.is_file()) {
            tracing::debug!(tool = self.name(), path = %path.display(), "tool found at install location");
            return Some(path);
        }
        for name in self.candidates() {
            if let Ok(path) = which::which(name) {
                tracing::debug!(tool = self.name(), path = %path.display(), "tool found on PATH");
                return Some(path);
            }
        }
        None
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
