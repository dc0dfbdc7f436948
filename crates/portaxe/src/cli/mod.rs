pub mod app;

use std::sync::Arc;

use anyhow::{Context, Result};
use portaxe_extract::{Classifier, Registry};
use portaxe_install::{Pipeline, verify_layout};
use portaxe_platform::{SystemRunner, Tool, ToolRunner};

use crate::config::{Overrides, Settings};
use app::{App, Commands, ConvertArg, FileArg, VerifyArg};

pub fn run(app: App) -> Result<()> {
    let overrides = match &app.cmd {
        Commands::Convert(arg) => overrides(arg),
        _ => Overrides::default(),
    };
    let settings = Settings::load(app.config.as_deref(), &overrides)?;

    match app.cmd {
        Commands::Convert(arg) => convert(arg, &settings),
        Commands::Classify(arg) => classify(arg, &settings),
        Commands::Inspect(arg) => inspect(arg),
        Commands::Verify(arg) => verify(arg),
        Commands::Tools => tools(&settings),
    }
}

fn overrides(arg: &ConvertArg) -> Overrides {
    let off = |flag: bool| flag.then_some(false);
    Overrides {
        output_dir:           arg.output_dir.clone(),
        timeout_seconds:      arg.timeout,
        use_7zip:             off(arg.no_7zip),
        use_innoextract:      off(arg.no_innoextract),
        use_msi_extract:      off(arg.no_msi_extract),
        include_dependencies: off(arg.no_dependencies),
        backup_registry:      arg.backup_registry.then_some(true),
        redist_dir:           arg.redist_dir.clone(),
    }
}

fn convert(arg: ConvertArg, settings: &Settings) -> Result<()> {
    let mut options = settings.convert_options();
    options.app_name = arg.name;
    options.work_dir = arg.work_dir;
    options.keep_work_dir = arg.keep_work_dir;

    let pipeline = Pipeline::new(Arc::new(Registry::standard()), Arc::new(SystemRunner), options);
    let report = pipeline
        .run(&arg.input)
        .with_context(|| format!("failed to convert '{}'", arg.input.display()))?;

    if arg.json {
        println!("{}", serde_json::to_string_pretty(&report.layout)?);
        return Ok(());
    }
    let layout = &report.layout;
    println!(
        "{} ({}) -> {}",
        report.classification.kind,
        report.classification.confidence,
        layout.root.display()
    );
    println!("attempts:\n{}", report.attempt_log);
    println!("files: {}", layout.manifest.entries.len());
    if !layout.manifest.dependencies.is_empty() {
        println!("dependencies: {}", layout.manifest.dependencies.join(", "));
    }
    if !layout.manifest.missing_redistributables.is_empty() {
        println!(
            "missing redistributable payloads: {}",
            layout.manifest.missing_redistributables.join(", ")
        );
    }
    match &layout.launcher.entry_point {
        Some(entry) => println!("entry point: {entry}"),
        None => println!("entry point: none found"),
    }
    Ok(())
}

fn classify(arg: FileArg, settings: &Settings) -> Result<()> {
    let result = Classifier::new()
        .scan_limit(settings.scan_limit_bytes)
        .classify(&arg.path);
    if arg.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }
    println!("{} ({})", result.kind, result.confidence);
    for line in &result.evidence {
        println!("  {line}");
    }
    Ok(())
}

fn inspect(arg: FileArg) -> Result<()> {
    let Some(profile) = portaxe_pe::inspect(&arg.path) else {
        anyhow::bail!("'{}' is not a PE executable", arg.path.display());
    };
    if arg.json {
        println!("{}", serde_json::to_string_pretty(&profile)?);
        return Ok(());
    }
    println!("architecture: {:?}", profile.architecture);
    println!("subsystem:    {:?}", profile.subsystem);
    println!("dll:          {}", profile.is_dll);
    if profile.malformed {
        println!("(headers damaged, fields may be incomplete)");
    }
    for library in &profile.imported_libraries {
        match portaxe_install::deps::redistributable_for(library) {
            Some(redist) => println!("  {library}  [{}]", redist.id),
            None => println!("  {library}"),
        }
    }
    Ok(())
}

fn verify(arg: VerifyArg) -> Result<()> {
    let report = verify_layout(&arg.layout).with_context(|| format!("cannot verify '{}'", arg.layout.display()))?;
    for path in &report.missing {
        println!("missing   {path}");
    }
    for path in &report.modified {
        println!("modified  {path}");
    }
    for path in &report.unlisted {
        println!("unlisted  {path}");
    }
    if !report.is_clean() {
        anyhow::bail!("layout does not match its manifest");
    }
    println!("{} files verified", report.checked);
    Ok(())
}

fn tools(settings: &Settings) -> Result<()> {
    let policy = settings.policy();
    let runner = SystemRunner;
    for tool in Tool::ALL {
        let state = if !policy.enabled(tool) {
            "disabled".to_string()
        } else {
            match runner.locate(tool) {
                Some(path) => path.display().to_string(),
                None => "not found".to_string(),
            }
        };
        println!("{:<12} {state}", tool.name());
    }
    Ok(())
}
