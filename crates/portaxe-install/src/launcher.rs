//! Redirection definitions for the launcher emitter.
//!
//! Only data lives here. Turning a [`LauncherDefinition`] into a script or stub
//! executable is left to whoever consumes `launcher.json`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use portaxe_pe::BinaryProfile;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::layout::{APP_DIR, DATA_REGISTRY_DIR, DEPENDENCIES_DIR, PLUGINS_DIR};

/// Registry subtree captured at first run and replayed on later runs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    pub key:  String,
    pub file: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LauncherDefinition {
    pub app_name:     String,
    /// Executable to start, `/`-separated and relative to the layout root.
    pub entry_point:  Option<String>,
    /// Variable name -> directory relative to the layout root.
    pub environment:  BTreeMap<String, String>,
    /// Directories prepended to `PATH`, highest priority first.
    pub path_prepend: Vec<String>,
    /// Literal variables set for the child process.
    pub markers:      BTreeMap<String, String>,
    pub registry:     Option<RegistrySnapshot>,
}

const REDIRECTS: &[(&str, &str)] = &[
    ("APPDATA", "Data/AppData"),
    ("LOCALAPPDATA", "Data/LocalAppData"),
    ("USERPROFILE", "Data/Profile"),
    ("HOME", "Data/Profile"),
    ("TEMP", "Data/Temp"),
    ("TMP", "Data/Temp"),
];

static NOT_AN_ENTRY_POINT: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"(?i)(unins|setup|install|update|crash|error|report|vcredist|redist|directx|dxsetup)").ok()
});

impl LauncherDefinition {
    pub fn new(
        app_name: &str,
        entry_point: Option<String>,
        dependencies_staged: bool,
        backup_registry: bool,
    ) -> Self {
        let environment = REDIRECTS
            .iter()
            .map(|(var, dir)| (var.to_string(), dir.to_string()))
            .collect();

        let mut path_prepend = Vec::new();
        if dependencies_staged {
            path_prepend.push(DEPENDENCIES_DIR.to_string());
        }
        path_prepend.push(APP_DIR.to_string());
        path_prepend.push(PLUGINS_DIR.to_string());

        let markers = BTreeMap::from([("PORTABLE".to_string(), "1".to_string())]);

        let registry = backup_registry.then(|| RegistrySnapshot {
            key:  format!(r"HKCU\Software\{app_name}"),
            file: format!("{DATA_REGISTRY_DIR}/backup.reg"),
        });

        Self {
            app_name: app_name.to_string(),
            entry_point,
            environment,
            path_prepend,
            markers,
            registry,
        }
    }
}

/// Pick the executable the launcher should start.
///
/// `files` are relative to `root`; `profiles` carry absolute paths under `root`.
/// Preferred names win (shallowest first), then the first GUI executable that
/// does not look like an uninstaller, updater, or runtime installer.
pub fn guess_entry_point(
    app_name: &str,
    root: &Path,
    files: &[PathBuf],
    profiles: &[BinaryProfile],
) -> Option<PathBuf> {
    let mut candidates: Vec<&PathBuf> = files
        .iter()
        .filter(|f| has_exe_extension(f))
        .filter(|f| !looks_auxiliary(f))
        .collect();
    candidates.sort_by_key(|f| (f.components().count(), f.to_path_buf()));

    let preferred = [
        format!("{}.exe", app_name.to_lowercase()),
        "main.exe".to_string(),
        "app.exe".to_string(),
        "start.exe".to_string(),
    ];
    for name in &preferred {
        if let Some(found) = candidates.iter().find(|f| file_name_lower(f).as_deref() == Some(name)) {
            return Some((*found).clone());
        }
    }

    let is_gui = |f: &Path| {
        let abs = root.join(f);
        profiles.iter().any(|p| p.path == abs && p.is_gui())
    };
    candidates
        .iter()
        .copied()
        .find(|f| is_gui(f.as_path()))
        .or_else(|| candidates.first().copied())
        .cloned()
}

fn file_name_lower(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().to_lowercase())
}

fn has_exe_extension(path: &Path) -> bool {
    path.extension().is_some_and(|e| e.eq_ignore_ascii_case("exe"))
}

fn looks_auxiliary(path: &Path) -> bool {
    match (file_name_lower(path), NOT_AN_ENTRY_POINT.as_ref()) {
        (Some(name), Some(re)) => re.is_match(&name),
        _ => false,
    }
}
