//! One conversion job: classify, extract, analyze, resolve, build.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use portaxe_extract::{
    ClassificationResult, Classifier, DEFAULT_SCAN_LIMIT, Orchestrator, Registry, ToolPolicy,
};
use portaxe_fs::WorkDir;
use portaxe_pe::BinaryProfile;
use portaxe_platform::ToolRunner;
use rayon::prelude::*;

use crate::deps::{self, DependencyRequirement};
use crate::error::{Error, Result};
use crate::layout::{LayoutBuilder, LayoutOptions, PortableLayout, check_target};

/// Extensions worth handing to the PE analyzer.
const BINARY_EXTENSIONS: &[&str] = &["exe", "dll", "ocx", "sys", "cpl", "scr", "drv"];

const PORTABLE_SUFFIX: &str = "_Portable";

#[derive(Clone, Debug)]
pub struct ConvertOptions {
    pub output_dir:           PathBuf,
    /// Defaults to the input file stem.
    pub app_name:             Option<String>,
    pub timeout:              Duration,
    pub policy:               ToolPolicy,
    pub include_dependencies: bool,
    pub backup_registry:      bool,
    pub redist_dir:           Option<PathBuf>,
    pub scan_limit:           u64,
    /// Scratch directory to use instead of a fresh temporary one.
    pub work_dir:             Option<PathBuf>,
    pub keep_work_dir:        bool,
}

impl ConvertOptions {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir:           output_dir.into(),
            app_name:             None,
            timeout:              Duration::from_secs(300),
            policy:               ToolPolicy::default(),
            include_dependencies: true,
            backup_registry:      false,
            redist_dir:           None,
            scan_limit:           DEFAULT_SCAN_LIMIT,
            work_dir:             None,
            keep_work_dir:        false,
        }
    }
}

/// Everything a finished conversion produced.
#[derive(Debug)]
pub struct ConversionReport {
    pub classification: ClassificationResult,
    pub attempt_log:    String,
    pub profiles:       Vec<BinaryProfile>,
    pub dependencies:   Vec<DependencyRequirement>,
    pub layout:         PortableLayout,
}

pub struct Pipeline {
    registry: Arc<Registry>,
    runner:   Arc<dyn ToolRunner>,
    options:  ConvertOptions,
}

impl Pipeline {
    pub fn new(registry: Arc<Registry>, runner: Arc<dyn ToolRunner>, options: ConvertOptions) -> Self {
        Self {
            registry,
            runner,
            options,
        }
    }

    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// `<output_dir>/<AppName>_Portable` for `input`.
    pub fn target_root(&self, input: &Path) -> PathBuf {
        self.options
            .output_dir
            .join(format!("{}{PORTABLE_SUFFIX}", self.app_name(input)))
    }

    fn app_name(&self, input: &Path) -> String {
        self.options.app_name.clone().unwrap_or_else(|| {
            input
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "App".to_string())
        })
    }

    pub fn run(&self, input: &Path) -> Result<ConversionReport> {
        let target_root = self.target_root(input);
        check_target(&target_root)?;

        let classification = Classifier::new()
            .scan_limit(self.options.scan_limit)
            .classify(input);

        let work = match &self.options.work_dir {
            Some(dir) => WorkDir::at(dir),
            None => WorkDir::temp("portaxe-"),
        }
        .map_err(Error::WorkDir)?;

        let session = Orchestrator::new(self.registry.clone(), self.runner.clone())
            .policy(self.options.policy)
            .run(classification.clone(), work.path(), self.options.timeout);
        let attempt_log = session.attempt_log();
        let extracted = session.into_extracted()?;

        let profiles = analyze(extracted.output_dir(), extracted.files().iter());
        let dependencies = deps::resolve(&profiles);
        tracing::info!(
            binaries = profiles.len(),
            dependencies = dependencies.len(),
            "binaries analyzed"
        );

        let mut layout_options = LayoutOptions::new(self.app_name(input))
            .include_dependencies(self.options.include_dependencies)
            .backup_registry(self.options.backup_registry);
        if let Some(dir) = &self.options.redist_dir {
            layout_options = layout_options.redist_dir(dir);
        }
        let layout = LayoutBuilder::new(layout_options).build(&extracted, &profiles, &dependencies, &target_root)?;

        if self.options.keep_work_dir {
            let kept = work.keep();
            tracing::info!(path = %kept.display(), "work directory kept");
        }

        Ok(ConversionReport {
            classification,
            attempt_log,
            profiles,
            dependencies,
            layout,
        })
    }
}

/// Inspect every binary-looking file in parallel; results follow input order.
pub fn analyze<'a>(root: &Path, files: impl Iterator<Item = &'a PathBuf>) -> Vec<BinaryProfile> {
    let candidates: Vec<PathBuf> = files
        .filter(|f| {
            f.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| BINARY_EXTENSIONS.iter().any(|b| e.eq_ignore_ascii_case(b)))
        })
        .map(|f| root.join(f))
        .collect();

    candidates
        .par_iter()
        .filter_map(|path| {
            let profile = portaxe_pe::inspect(path);
            if profile.as_ref().is_some_and(|p| p.malformed) {
                tracing::debug!(path = %path.display(), "damaged binary treated as dependency-inert");
            }
            profile
        })
        .collect()
}
