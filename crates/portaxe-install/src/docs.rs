use std::fmt::Write as _;
use std::path::Path;

use portaxe_fs::AtomicWriteOptions;
use serde::Serialize;

use crate::error::{Error, Result, fs_io};
use crate::launcher::LauncherDefinition;
use crate::manifest::Manifest;

pub const CONFIG_FILE: &str = "portable_config.json";
pub const README_FILE: &str = "Documentation/README.md";
pub const INFO_FILE: &str = "Documentation/INFO.txt";

const CREATED_BY: &str = concat!("portaxe ", env!("CARGO_PKG_VERSION"));

/// Strategy whose output is the input file itself.
const STANDALONE_STRATEGY: &str = "direct-copy";

/// Contents of `portable_config.json`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PortableConfig {
    pub app_info:          AppInfo,
    pub portable_settings: PortableSettings,
    pub launcher_settings: LauncherSettings,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AppInfo {
    pub name:           String,
    #[serde(rename = "type")]
    pub origin:         &'static str,
    pub installer_kind: String,
    pub strategy:       String,
    pub created_by:     &'static str,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PortableSettings {
    pub data_directory:    &'static str,
    pub redirect_appdata:  bool,
    pub redirect_registry: bool,
    pub isolated_temp:     bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LauncherSettings {
    pub entry_point:     Option<String>,
    pub backup_registry: bool,
}

impl PortableConfig {
    pub fn new(manifest: &Manifest, launcher: &LauncherDefinition) -> Self {
        let backup_registry = launcher.registry.is_some();
        Self {
            app_info:          AppInfo {
                name:           manifest.app_name.clone(),
                origin:         origin(manifest),
                installer_kind: manifest.installer_kind.clone(),
                strategy:       manifest.strategy.clone(),
                created_by:     CREATED_BY,
            },
            portable_settings: PortableSettings {
                data_directory:    "./Data",
                redirect_appdata:  launcher.environment.contains_key("APPDATA"),
                redirect_registry: backup_registry,
                isolated_temp:     launcher.environment.contains_key("TEMP"),
            },
            launcher_settings: LauncherSettings {
                entry_point: launcher.entry_point.clone(),
                backup_registry,
            },
        }
    }
}

fn origin(manifest: &Manifest) -> &'static str {
    if manifest.strategy == STANDALONE_STRATEGY {
        "standalone"
    } else {
        "extracted_installer"
    }
}

fn readme(manifest: &Manifest, launcher: &LauncherDefinition) -> String {
    let name = &manifest.app_name;
    let mut out = format!("# {name} - Portable Version\n\nGenerated by {CREATED_BY}.\n\n");
    let _ = writeln!(
        out,
        "This is a portable build of **{name}**. It runs from any location, including removable drives, without installation.\n"
    );
    out.push_str("## How to Use\n\n");
    match &launcher.entry_point {
        Some(entry) => {
            let _ = writeln!(out, "1. **Launch**: start `{entry}` through the launcher described in `launcher.json`.");
        }
        None => out.push_str("1. **Launch**: no entry point was detected; pick the executable under `App/` by hand.\n"),
    }
    out.push_str(
        "2. **Data Storage**: application data, settings and profiles are redirected into `Data/`.\n\
         3. **Updating**: replace the contents of `App/` with the new version. `Data/` is preserved.\n\n",
    );
    out.push_str(
        "## Directory Structure\n\n\
         - `App/`: application files, listed with their digests in `manifest.json`.\n\
         - `App/Dependencies/`: bundled runtime redistributables.\n\
         - `Data/`: user data, settings and the registry backup.\n\
         - `Documentation/`: this file and `INFO.txt`.\n\
         - `Plugins/`: application plugins.\n",
    );
    if !manifest.dependencies.is_empty() {
        out.push_str("\n## Runtime Dependencies\n\n");
        for id in &manifest.dependencies {
            let status = if manifest.missing_redistributables.contains(id) {
                "not bundled"
            } else {
                "bundled"
            };
            let _ = writeln!(out, "- `{id}` ({status})");
        }
    }
    out
}

fn info(manifest: &Manifest, launcher: &LauncherDefinition) -> String {
    let kind = match origin(manifest) {
        "standalone" => "Standalone Application",
        _ => "Extracted Installer",
    };
    let entry = launcher.entry_point.as_deref().unwrap_or("(none detected)");
    format!(
        "Application: {}\n\
         Type: {kind}\n\
         Installer: {}\n\
         Strategy: {}\n\
         Entry point: {entry}\n\
         Portable: Yes\n\
         Creator: {CREATED_BY}\n\
         \n\
         All data is stored in the Data/ folder.\n",
        manifest.app_name, manifest.installer_kind, manifest.strategy,
    )
}

/// Write `portable_config.json`, `Documentation/README.md` and
/// `Documentation/INFO.txt`. None of them carries a timestamp.
pub(crate) fn write_companion_files(root: &Path, manifest: &Manifest, launcher: &LauncherDefinition) -> Result<()> {
    let config_path = root.join(CONFIG_FILE);
    let config = serde_json::to_vec_pretty(&PortableConfig::new(manifest, launcher))
        .map_err(|e| Error::layout(&config_path, e))?;

    for (path, bytes) in [
        (config_path, config),
        (root.join(README_FILE), readme(manifest, launcher).into_bytes()),
        (root.join(INFO_FILE), info(manifest, launcher).into_bytes()),
    ] {
        portaxe_fs::atomic_write(&path, &bytes, AtomicWriteOptions::default())
            .map_err(|e| Error::layout(&path, fs_io(e)))?;
    }
    tracing::debug!(root = %root.display(), "companion files written");
    Ok(())
}
