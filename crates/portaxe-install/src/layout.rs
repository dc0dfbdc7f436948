use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use portaxe_extract::Extracted;
use portaxe_fs::{AtomicWriteOptions, to_slash_path};
use portaxe_pe::BinaryProfile;
use serde::Serialize;

use crate::deps::DependencyRequirement;
use crate::docs::write_companion_files;
use crate::error::{Error, Result, fs_io, verify_io};
use crate::launcher::{LauncherDefinition, guess_entry_point};
use crate::manifest::{LAUNCHER_FILE, MANIFEST_FILE, Manifest, ManifestEntry};

pub const APP_DIR: &str = "App";
pub const DEPENDENCIES_DIR: &str = "App/Dependencies";
pub const PLUGINS_DIR: &str = "Plugins";
pub const DATA_REGISTRY_DIR: &str = "Data/Registry";

/// Directories every layout gets, whether or not anything lands in them.
pub const SUBDIRECTORIES: &[&str] = &[
    APP_DIR,
    DEPENDENCIES_DIR,
    "Data/AppData",
    "Data/LocalAppData",
    "Data/Profile",
    DATA_REGISTRY_DIR,
    "Data/Settings",
    "Data/Temp",
    "Documentation",
    PLUGINS_DIR,
];

#[derive(Clone, Debug)]
pub struct LayoutOptions {
    pub app_name:             String,
    pub include_dependencies: bool,
    pub backup_registry:      bool,
    /// Root of the bundled redistributable assets, `<dir>/<redistributable id>/...`.
    pub redist_dir:           Option<PathBuf>,
}

impl LayoutOptions {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name:             app_name.into(),
            include_dependencies: true,
            backup_registry:      false,
            redist_dir:           None,
        }
    }

    pub fn include_dependencies(mut self, include: bool) -> Self {
        self.include_dependencies = include;
        self
    }

    pub fn backup_registry(mut self, backup: bool) -> Self {
        self.backup_registry = backup;
        self
    }

    pub fn redist_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.redist_dir = Some(dir.into());
        self
    }
}

/// A finished portable directory.
#[derive(Clone, Debug, Serialize)]
pub struct PortableLayout {
    pub root:     PathBuf,
    pub manifest: Manifest,
    pub launcher: LauncherDefinition,
}

impl PortableLayout {
    pub fn app_dir(&self) -> PathBuf {
        self.root.join(APP_DIR)
    }
}

/// Refuse a root holding a finished layout, or payload files from a build that
/// never reached its manifest.
pub(crate) fn check_target(target_root: &Path) -> Result<()> {
    if target_root.join(MANIFEST_FILE).exists() {
        return Err(Error::TargetExists(target_root.to_path_buf()));
    }
    let app = target_root.join(APP_DIR);
    if app.is_dir() {
        let leftovers = portaxe_fs::list_files(&app).map_err(|e| Error::layout(&app, fs_io(e)))?;
        if let Some(first) = leftovers.first() {
            tracing::warn!(root = %target_root.display(), file = %first.display(), "unfinished layout found");
            return Err(Error::IncompleteTarget(target_root.to_path_buf()));
        }
    }
    Ok(())
}

/// Assembles a [`PortableLayout`] from a successful extraction.
///
/// Stages run strictly in order: skeleton, payload copy, redistributables,
/// digests, launcher definition, companion files, manifest. The manifest is written last, so a
/// failure anywhere leaves a root without one.
#[derive(Clone, Debug)]
pub struct LayoutBuilder {
    options: LayoutOptions,
}

impl LayoutBuilder {
    pub fn new(options: LayoutOptions) -> Self {
        Self { options }
    }

    pub fn build(
        &self,
        extracted: &Extracted,
        profiles: &[BinaryProfile],
        dependencies: &[DependencyRequirement],
        target_root: &Path,
    ) -> Result<PortableLayout> {
        check_target(target_root)?;
        let app = target_root.join(APP_DIR);

        for dir in SUBDIRECTORIES {
            let path = target_root.join(dir);
            std::fs::create_dir_all(&path).map_err(|e| Error::layout(&path, e))?;
        }
        tracing::debug!(root = %target_root.display(), "layout skeleton created");

        let mut placed: Vec<PathBuf> = Vec::new();
        let mut taken: BTreeSet<PathBuf> = BTreeSet::new();

        for rel in extracted.files() {
            let dest = app.join(rel);
            portaxe_fs::copy_file(extracted.output_dir().join(rel), &dest)
                .map_err(|e| Error::layout(&dest, fs_io(e)))?;
            taken.insert(rel.clone());
            placed.push(rel.clone());
        }
        tracing::info!(files = placed.len(), "payload copied into App/");

        let mut manifest = Manifest::new(
            &self.options.app_name,
            extracted.classification().kind.as_str(),
            extracted.strategy(),
        );
        manifest.dependencies = dependencies
            .iter()
            .map(|d| d.redistributable_id.to_string())
            .collect();

        let mut staged = 0usize;
        if self.options.include_dependencies {
            for requirement in dependencies {
                match self.stage_redistributable(requirement.redistributable_id, &app, &mut taken)? {
                    Some(files) => {
                        staged += files.len();
                        placed.extend(files);
                    }
                    None => manifest
                        .missing_redistributables
                        .push(requirement.redistributable_id.to_string()),
                }
            }
        }

        for rel in &placed {
            let path = app.join(rel);
            let digest = portaxe_verify::digest_file(&path).map_err(|e| Error::layout(&path, verify_io(e)))?;
            manifest.entries.push(ManifestEntry {
                path:   to_slash_path(rel),
                sha256: digest.sha256,
                size:   digest.size,
            });
        }

        let files: Vec<PathBuf> = extracted.files().iter().cloned().collect();
        let entry_point = guess_entry_point(&self.options.app_name, extracted.output_dir(), &files, profiles)
            .map(|rel| format!("{APP_DIR}/{}", to_slash_path(&rel)));
        if entry_point.is_none() {
            tracing::warn!("no entry point executable found");
        }
        let launcher = LauncherDefinition::new(
            &self.options.app_name,
            entry_point,
            staged > 0,
            self.options.backup_registry,
        );
        let launcher_path = target_root.join(LAUNCHER_FILE);
        let json = serde_json::to_vec_pretty(&launcher).map_err(|e| Error::layout(&launcher_path, e))?;
        portaxe_fs::atomic_write(&launcher_path, &json, AtomicWriteOptions::default())
            .map_err(|e| Error::layout(&launcher_path, fs_io(e)))?;

        write_companion_files(target_root, &manifest, &launcher)?;
        manifest.write(target_root)?;
        tracing::info!(
            root = %target_root.display(),
            entries = manifest.entries.len(),
            "portable layout finalized"
        );

        Ok(PortableLayout {
            root: target_root.to_path_buf(),
            manifest,
            launcher,
        })
    }

    /// Copy one bundled redistributable into `App/Dependencies/`.
    ///
    /// Returns the placed paths relative to `App/`, or `None` when the asset set
    /// has no payload for `id`.
    fn stage_redistributable(
        &self,
        id: &str,
        app: &Path,
        taken: &mut BTreeSet<PathBuf>,
    ) -> Result<Option<Vec<PathBuf>>> {
        let Some(source) = self.options.redist_dir.as_ref().map(|d| d.join(id)).filter(|d| d.is_dir()) else {
            tracing::warn!(redistributable = id, "no bundled payload for redistributable");
            return Ok(None);
        };
        let files = portaxe_fs::list_files(&source).map_err(|e| Error::layout(&source, fs_io(e)))?;

        let mut placed = Vec::new();
        for rel in files {
            let in_app = Path::new("Dependencies").join(&rel);
            if !taken.insert(in_app.clone()) {
                tracing::warn!(file = %in_app.display(), "redistributable file already present, skipped");
                continue;
            }
            let dest = app.join(&in_app);
            portaxe_fs::copy_file(source.join(&rel), &dest).map_err(|e| Error::layout(&dest, fs_io(e)))?;
            placed.push(in_app);
        }
        tracing::info!(redistributable = id, files = placed.len(), "redistributable staged");
        Ok(Some(placed))
    }
}
