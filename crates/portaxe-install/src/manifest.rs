//! The integrity manifest of a portable layout.
//!
//! `manifest.json` is the last file written during a build. Its presence is the
//! only signal that a layout is complete.

use std::collections::BTreeSet;
use std::path::Path;

use portaxe_fs::AtomicWriteOptions;
use portaxe_verify::{FileDigest, VerifyError};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result, fs_io};
use crate::layout::APP_DIR;

pub const MANIFEST_FILE: &str = "manifest.json";
pub const LAUNCHER_FILE: &str = "launcher.json";
const FORMAT_VERSION: u32 = 1;

/// One file under `App/`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Relative to `App/`, `/`-separated.
    pub path:   String,
    pub sha256: String,
    pub size:   u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub format:                   u32,
    pub app_name:                 String,
    pub installer_kind:           String,
    pub strategy:                 String,
    pub dependencies:             Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_redistributables: Vec<String>,
    /// In placement order.
    pub entries:                  Vec<ManifestEntry>,
}

impl Manifest {
    pub(crate) fn new(app_name: &str, installer_kind: &str, strategy: &str) -> Self {
        Self {
            format:                   FORMAT_VERSION,
            app_name:                 app_name.to_string(),
            installer_kind:           installer_kind.to_string(),
            strategy:                 strategy.to_string(),
            dependencies:             Vec::new(),
            missing_redistributables: Vec::new(),
            entries:                  Vec::new(),
        }
    }

    /// Finalize the manifest under `root`.
    pub(crate) fn write(&self, root: &Path) -> Result<()> {
        let path = root.join(MANIFEST_FILE);
        let json = serde_json::to_vec_pretty(self).map_err(|e| Error::layout(&path, e))?;
        portaxe_fs::atomic_write(&path, &json, AtomicWriteOptions::default())
            .map_err(|e| Error::layout(&path, fs_io(e)))
    }

    pub fn read(root: impl AsRef<Path>) -> Result<Self> {
        let path = root.as_ref().join(MANIFEST_FILE);
        let bytes = portaxe_fs::atomic_read(&path).map_err(|e| Error::ManifestUnreadable {
            path:   path.clone(),
            source: fs_io(e),
        })?;
        serde_json::from_slice(&bytes).map_err(|e| Error::ManifestUnreadable {
            path,
            source: e.into(),
        })
    }
}

/// Differences between a manifest and the files actually on disk.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VerifyReport {
    pub checked:  usize,
    pub missing:  Vec<String>,
    pub modified: Vec<String>,
    pub unlisted: Vec<String>,
}

impl VerifyReport {
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.modified.is_empty() && self.unlisted.is_empty()
    }
}

/// Recompute every digest in `root`'s manifest and look for files it does not list.
pub fn verify_layout(root: impl AsRef<Path>) -> Result<VerifyReport> {
    let root = root.as_ref();
    let manifest = Manifest::read(root)?;
    let app = root.join(APP_DIR);

    let mut report = VerifyReport::default();
    let mut listed = BTreeSet::new();
    for entry in &manifest.entries {
        listed.insert(entry.path.clone());
        report.checked += 1;
        let expected = FileDigest {
            sha256: entry.sha256.clone(),
            size:   entry.size,
        };
        match portaxe_verify::verify_file(app.join(&entry.path), &expected) {
            Ok(()) => {}
            Err(VerifyError::Read { .. }) => report.missing.push(entry.path.clone()),
            Err(_) => report.modified.push(entry.path.clone()),
        }
    }

    if app.is_dir() {
        let on_disk = portaxe_fs::list_files(&app).map_err(|e| Error::ManifestUnreadable {
            path:   app.clone(),
            source: fs_io(e),
        })?;
        report.unlisted = on_disk
            .iter()
            .map(|p| portaxe_fs::to_slash_path(p))
            .filter(|p| !listed.contains(p))
            .collect();
    }

    if !report.is_clean() {
        tracing::warn!(
            root = %root.display(),
            missing = report.missing.len(),
            modified = report.modified.len(),
            unlisted = report.unlisted.len(),
            "layout does not match its manifest"
        );
    }
    Ok(report)
}
