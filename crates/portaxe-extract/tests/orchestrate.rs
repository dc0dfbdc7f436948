use std::collections::BTreeSet;
use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use portaxe_extract::{
    ClassificationResult, Confidence, ExtractionContext, ExtractionOutcome, ExtractionStrategy,
    InstallerKind, Orchestrator, OutcomeStatus, Registry, ToolPolicy, classify,
};
use portaxe_pe::fixture::PeBuilder;
use portaxe_platform::fake::{ScriptedRunner, destination, exited};
use portaxe_platform::{Error as PlatformError, RunReport, Tool};
use tempfile::TempDir;

const TIMEOUT: Duration = Duration::from_secs(30);

/// Writes `files` into the destination parsed from the tool's arguments.
fn producing(tool: Tool, files: &'static [&'static str]) -> impl Fn(&[OsString]) -> portaxe_platform::Result<RunReport> {
    move |args| {
        let dest = destination(tool, args).expect("destination argument");
        for file in files {
            let path = dest.join(file);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, file.as_bytes()).unwrap();
        }
        Ok(exited(0))
    }
}

fn classification(path: &Path, kind: InstallerKind) -> ClassificationResult {
    ClassificationResult {
        input_path: path.to_path_buf(),
        kind,
        confidence: Confidence::High,
        evidence: vec!["test fixture".into()],
    }
}

fn inno_fixture(dir: &Path) -> PathBuf {
    let path = dir.join("setup.exe");
    std::fs::write(&path, PeBuilder::x86().overlay(b"rDlPtS02\x87eVx").build()).unwrap();
    path
}

fn orchestrator(runner: ScriptedRunner) -> (Orchestrator, Arc<ScriptedRunner>) {
    let runner = Arc::new(runner);
    let orchestrator = Orchestrator::new(Arc::new(Registry::standard()), runner.clone());
    (orchestrator, runner)
}

fn statuses(session: &portaxe_extract::ExtractionSession) -> Vec<(&'static str, OutcomeStatus)> {
    session
        .attempts()
        .iter()
        .map(|a| (a.strategy, a.outcome.status))
        .collect()
}

struct Counting {
    id:     &'static str,
    status: OutcomeStatus,
    calls:  Arc<AtomicUsize>,
}

impl ExtractionStrategy for Counting {
    fn id(&self) -> &'static str {
        self.id
    }

    fn required_tool(&self) -> Option<Tool> {
        None
    }

    fn invoke(&self, _input: &Path, output_dir: &Path, _ctx: &ExtractionContext<'_>) -> ExtractionOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.status {
            OutcomeStatus::Success => {
                std::fs::write(output_dir.join("payload.bin"), self.id).unwrap();
                ExtractionOutcome::success(output_dir, BTreeSet::from([PathBuf::from("payload.bin")]))
            }
            OutcomeStatus::ToolFailed => ExtractionOutcome::tool_failed(output_dir, "scripted failure"),
            OutcomeStatus::ToolUnavailable => ExtractionOutcome::tool_unavailable(output_dir, "scripted"),
            OutcomeStatus::NoFilesProduced => ExtractionOutcome::no_files(output_dir, "scripted"),
        }
    }
}

#[test]
fn stops_at_first_success() {
    let work = TempDir::new().unwrap();
    let counters: Vec<_> = (0..3).map(|_| Arc::new(AtomicUsize::new(0))).collect();
    let strategy = |id, status, i: usize| -> Arc<dyn ExtractionStrategy> {
        Arc::new(Counting {
            id,
            status,
            calls: counters[i].clone(),
        })
    };
    let registry = Registry::empty().with(
        InstallerKind::Unknown,
        vec![
            strategy("first", OutcomeStatus::ToolFailed, 0),
            strategy("second", OutcomeStatus::Success, 1),
            strategy("third", OutcomeStatus::Success, 2),
        ],
    );
    let orchestrator = Orchestrator::new(Arc::new(registry), Arc::new(ScriptedRunner::new()));

    let session = orchestrator.run(
        classification(Path::new("input.bin"), InstallerKind::Unknown),
        work.path(),
        TIMEOUT,
    );

    assert_eq!(
        statuses(&session),
        [("first", OutcomeStatus::ToolFailed), ("second", OutcomeStatus::Success)]
    );
    assert_eq!(counters[2].load(Ordering::SeqCst), 0);
    assert!(session.is_success());
    assert_eq!(
        session.attempts().iter().filter(|a| a.outcome.is_success()).count(),
        1
    );
}

#[test]
fn disabled_tool_is_skipped_without_running() {
    let input_dir = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let input = inno_fixture(input_dir.path());

    let (orchestrator, runner) = orchestrator(
        ScriptedRunner::new()
            .with_tool(Tool::InnoExtract, producing(Tool::InnoExtract, &["app/main.exe"]))
            .with_tool(Tool::SevenZip, producing(Tool::SevenZip, &["main.exe", "data.pak"])),
    );
    let orchestrator = orchestrator.policy(ToolPolicy::default().disable(Tool::InnoExtract));

    let session = orchestrator.run(classify(&input), work.path(), TIMEOUT);

    assert_eq!(
        statuses(&session),
        [
            ("innoextract", OutcomeStatus::ToolUnavailable),
            ("generic-archive", OutcomeStatus::Success)
        ]
    );
    assert!(session.attempts()[0].outcome.diagnostic.contains("disabled"));
    let tools: Vec<_> = runner.calls().into_iter().map(|c| c.tool).collect();
    assert_eq!(tools, [Tool::SevenZip]);

    let extracted = session.into_extracted().unwrap();
    assert_eq!(extracted.output_dir(), work.path().join("2-generic-archive"));
    assert_eq!(
        extracted.files(),
        &BTreeSet::from([PathBuf::from("data.pak"), PathBuf::from("main.exe")])
    );
}

#[test]
fn preferred_tool_wins_when_available() {
    let input_dir = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let input = inno_fixture(input_dir.path());
    let (orchestrator, runner) = orchestrator(
        ScriptedRunner::new()
            .with_tool(Tool::InnoExtract, producing(Tool::InnoExtract, &["app/main.exe"]))
            .with_tool(Tool::SevenZip, producing(Tool::SevenZip, &["main.exe"])),
    );

    let session = orchestrator.run(classify(&input), work.path(), TIMEOUT);

    assert_eq!(statuses(&session), [("innoextract", OutcomeStatus::Success)]);
    assert_eq!(runner.calls().len(), 1);

    let args = &runner.calls()[0].args;
    assert_eq!(args[1], OsString::from("-d"));
    assert_eq!(args[3], OsString::from("-s"));
}

#[test]
fn failing_exit_status_and_timeout_are_tool_failed() {
    let input_dir = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let input = inno_fixture(input_dir.path());
    let (orchestrator, _) = orchestrator(
        ScriptedRunner::new()
            .with_tool(Tool::InnoExtract, |_| {
                Ok(RunReport {
                    exit_code: Some(1),
                    stderr: "Not a supported Inno Setup installer!".into(),
                    ..Default::default()
                })
            })
            .with_tool(Tool::SevenZip, |_| {
                Err(PlatformError::Timeout {
                    cmd:          "7z".into(),
                    timeout_secs: 30,
                })
            }),
    );

    let session = orchestrator.run(classify(&input), work.path(), TIMEOUT);

    assert_eq!(
        statuses(&session),
        [
            ("innoextract", OutcomeStatus::ToolFailed),
            ("generic-archive", OutcomeStatus::ToolFailed)
        ]
    );
    assert!(session.attempts()[0].outcome.diagnostic.contains("Not a supported"));
    assert!(session.attempts()[1].outcome.diagnostic.contains("timed out after 30s"));
    assert!(!session.is_success());
}

#[test]
fn successful_exit_without_files_is_not_success() {
    let input_dir = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let input = input_dir.path().join("setup.exe");
    std::fs::write(&input, PeBuilder::x86().overlay(b"ISSetupStream").build()).unwrap();
    let (orchestrator, _) = orchestrator(ScriptedRunner::new().with_tool(Tool::SevenZip, |_| Ok(exited(0))));

    let session = orchestrator.run(classify(&input), work.path(), TIMEOUT);

    assert_eq!(statuses(&session), [("generic-archive", OutcomeStatus::NoFilesProduced)]);
    assert_eq!(
        session.final_outcome().map(|o| o.status),
        Some(OutcomeStatus::NoFilesProduced)
    );
}

#[test]
fn dissected_executable_is_rejected() {
    let input_dir = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let input = input_dir.path().join("mystery.bin");
    std::fs::write(&input, b"\x00\x01 not recognisable").unwrap();
    let (orchestrator, _) = orchestrator(
        ScriptedRunner::new().with_tool(
            Tool::SevenZip,
            producing(Tool::SevenZip, &[".text", ".rdata", ".data", ".rsrc/MANIFEST/1"]),
        ),
    );

    let session = orchestrator.run(classify(&input), work.path(), TIMEOUT);

    assert_eq!(
        statuses(&session),
        [
            ("generic-archive", OutcomeStatus::NoFilesProduced),
            ("direct-copy", OutcomeStatus::Success)
        ]
    );
}

#[test]
fn inno_without_any_tool_is_exhausted() {
    let input_dir = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let input = inno_fixture(input_dir.path());
    let (orchestrator, _) = orchestrator(ScriptedRunner::new());
    let orchestrator = orchestrator.policy(ToolPolicy::default().disable(Tool::InnoExtract));

    let session = orchestrator.run(classify(&input), work.path(), TIMEOUT);

    assert_eq!(
        statuses(&session),
        [
            ("innoextract", OutcomeStatus::ToolUnavailable),
            ("generic-archive", OutcomeStatus::ToolUnavailable)
        ]
    );
    assert_eq!(
        session.final_outcome().map(|o| o.status),
        Some(OutcomeStatus::ToolUnavailable)
    );
    let err = session.into_extracted().unwrap_err();
    assert!(err.to_string().contains("innoextract disabled by configuration"));
    assert!(err.to_string().contains("7-zip not found"));
}

#[test]
fn zip_is_extracted_natively_without_tools() {
    let input_dir = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let input = input_dir.path().join("portable.zip");
    let mut writer = zip::ZipWriter::new(std::fs::File::create(&input).unwrap());
    let options = zip::write::SimpleFileOptions::default();
    writer.start_file("app.exe", options).unwrap();
    writer.write_all(&PeBuilder::x64().build()).unwrap();
    writer.start_file("readme.txt", options).unwrap();
    writer.write_all(b"read me").unwrap();
    writer.finish().unwrap();

    let (orchestrator, runner) = orchestrator(ScriptedRunner::new());
    let session = orchestrator.run(classify(&input), work.path(), TIMEOUT);

    assert_eq!(statuses(&session), [("generic-archive", OutcomeStatus::Success)]);
    assert!(runner.calls().is_empty());
    let extracted = session.into_extracted().unwrap();
    assert_eq!(
        extracted.files(),
        &BTreeSet::from([PathBuf::from("app.exe"), PathBuf::from("readme.txt")])
    );
}

#[test]
fn msi_admin_install_drops_package_copy() {
    let input_dir = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let input = input_dir.path().join("product.msi");
    std::fs::write(&input, [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1, 0, 0]).unwrap();

    let (orchestrator, runner) = orchestrator(ScriptedRunner::new().with_tool(
        Tool::MsiExec,
        producing(Tool::MsiExec, &["product.msi", "PFiles/Product/product.exe"]),
    ));
    let session = orchestrator.run(classify(&input), work.path(), TIMEOUT);

    assert_eq!(statuses(&session), [("msiexec-admin", OutcomeStatus::Success)]);
    let call = &runner.calls()[0];
    assert_eq!(call.args[0], OsString::from("/a"));
    assert_eq!(call.args[2], OsString::from("/qn"));

    let extracted = session.into_extracted().unwrap();
    assert_eq!(
        extracted.files(),
        &BTreeSet::from([PathBuf::from("PFiles/Product/product.exe")])
    );
}

#[test]
fn standalone_executable_is_copied() {
    let input_dir = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let input = input_dir.path().join("tool.exe");
    std::fs::write(&input, PeBuilder::x64().console().build()).unwrap();

    let (orchestrator, _) = orchestrator(ScriptedRunner::new());
    let session = orchestrator.run(classify(&input), work.path(), TIMEOUT);

    let extracted = session.into_extracted().unwrap();
    assert_eq!(extracted.files(), &BTreeSet::from([PathBuf::from("tool.exe")]));
    assert_eq!(
        std::fs::read(extracted.output_dir().join("tool.exe")).unwrap(),
        std::fs::read(&input).unwrap()
    );
}

#[test]
fn session_is_complete_record() {
    let input_dir = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let input = inno_fixture(input_dir.path());
    let (orchestrator, _) = orchestrator(ScriptedRunner::new());

    let session = orchestrator.run(classify(&input), work.path(), TIMEOUT);

    assert_eq!(session.work_dir(), work.path());
    assert_eq!(session.classification().kind, InstallerKind::InnoSetup);
    assert!(work.path().join("1-innoextract").is_dir());
    assert!(work.path().join("2-generic-archive").is_dir());
    let json = serde_json::to_value(&session).unwrap();
    assert_eq!(json["attempts"].as_array().unwrap().len(), 2);
}
