use std::io::Write;
use std::path::{Path, PathBuf};

use portaxe_extract::{Classifier, Confidence, InstallerKind, classify};
use portaxe_pe::fixture::PeBuilder;
use proptest::prelude::*;
use tempfile::TempDir;

fn write(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

fn zip_fixture(dir: &Path) -> PathBuf {
    let path = dir.join("portable.zip");
    let mut writer = zip::ZipWriter::new(std::fs::File::create(&path).unwrap());
    writer
        .start_file("app.exe", zip::write::SimpleFileOptions::default())
        .unwrap();
    writer.write_all(&PeBuilder::x64().build()).unwrap();
    writer.finish().unwrap();
    path
}

fn assert_kind(path: &Path, kind: InstallerKind, confidence: Confidence) {
    let result = classify(path);
    assert_eq!(result.kind, kind, "evidence: {:?}", result.evidence);
    assert_eq!(result.confidence, confidence, "evidence: {:?}", result.evidence);
    assert!(!result.evidence.is_empty());
    assert_eq!(result.input_path, path);
}

#[test]
fn structured_storage_is_msi() {
    let dir = TempDir::new().unwrap();
    let mut bytes = vec![0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
    bytes.resize(4096, 0);
    let path = write(dir.path(), "product.msi", &bytes);
    assert_kind(&path, InstallerKind::Msi, Confidence::High);
}

#[test]
fn zip_archive() {
    let dir = TempDir::new().unwrap();
    let path = zip_fixture(dir.path());
    assert_kind(&path, InstallerKind::ArchiveZip, Confidence::High);
}

#[test]
fn rar_archives() {
    let dir = TempDir::new().unwrap();
    let rar4 = write(dir.path(), "a.rar", b"Rar!\x1A\x07\x00\xCF\x90\x73\x00\x00");
    let rar5 = write(dir.path(), "b.rar", b"Rar!\x1A\x07\x01\x00\x33\x92\xB5\xE5");
    assert_kind(&rar4, InstallerKind::ArchiveRar, Confidence::High);
    assert_kind(&rar5, InstallerKind::ArchiveRar, Confidence::High);
}

#[test]
fn inno_setup_loader() {
    let dir = TempDir::new().unwrap();
    let image = PeBuilder::x86().overlay(b"rDlPtS02\x87eVx").build();
    let path = write(dir.path(), "setup.exe", &image);
    assert_kind(&path, InstallerKind::InnoSetup, Confidence::High);
}

#[test]
fn nsis_first_header() {
    let dir = TempDir::new().unwrap();
    let image = PeBuilder::x86()
        .overlay([0u8; 4])
        .overlay(b"\xEF\xBE\xAD\xDENullsoftInst")
        .build();
    let path = write(dir.path(), "nsis-setup.exe", &image);
    assert_kind(&path, InstallerKind::Nsis, Confidence::High);
}

#[test]
fn installshield_stream() {
    let dir = TempDir::new().unwrap();
    let image = PeBuilder::x86().overlay(b"ISSetupStream\0\0").build();
    let path = write(dir.path(), "setup.exe", &image);
    assert_kind(&path, InstallerKind::InstallShield, Confidence::High);
}

#[test]
fn wix_burn_bundle() {
    let dir = TempDir::new().unwrap();
    let image = PeBuilder::x86().section(".wixburn").build();
    let path = write(dir.path(), "bundle.exe", &image);
    assert_kind(&path, InstallerKind::WiXMsi, Confidence::High);
}

#[test]
fn plain_executable_is_standalone() {
    let dir = TempDir::new().unwrap();
    let image = PeBuilder::x64().import("kernel32.dll").build();
    let path = write(dir.path(), "tool.exe", &image);
    assert_kind(&path, InstallerKind::StandaloneExecutable, Confidence::High);
}

#[test]
fn version_string_alone_is_medium() {
    let dir = TempDir::new().unwrap();
    let image = PeBuilder::x86()
        .overlay(b"This installation was built with Inno Setup.")
        .build();
    let path = write(dir.path(), "setup.exe", &image);
    let result = classify(&path);
    assert_eq!(result.kind, InstallerKind::InnoSetup);
    assert_eq!(result.confidence, Confidence::Medium);
}

#[test]
fn text_hints_for_other_kinds() {
    let dir = TempDir::new().unwrap();
    for (text, kind) in [
        (&b"Nullsoft Install System v3.08"[..], InstallerKind::Nsis),
        (&b"InstallShield(R) Setup"[..], InstallerKind::InstallShield),
        (&b"WiX Toolset Bootstrapper"[..], InstallerKind::WiXMsi),
    ] {
        let path = write(dir.path(), "setup.exe", &PeBuilder::x86().overlay(text).build());
        let result = classify(&path);
        assert_eq!(result.kind, kind);
        assert_eq!(result.confidence, Confidence::Medium);
    }
}

#[test]
fn unrecognised_inputs_are_unknown_low() {
    let dir = TempDir::new().unwrap();
    let text = write(dir.path(), "readme.txt", b"just some notes");
    let empty = write(dir.path(), "empty.bin", b"");
    let missing = dir.path().join("missing.exe");

    for path in [&text, &empty, &missing] {
        let result = classify(path);
        assert_eq!(result.kind, InstallerKind::Unknown);
        assert_eq!(result.confidence, Confidence::Low);
        assert!(result.is_ambiguous());
        assert!(!result.evidence.is_empty());
    }
}

#[test]
fn markers_beyond_scan_window_are_ignored() {
    let dir = TempDir::new().unwrap();
    let plain = PeBuilder::x86().build();
    let image = PeBuilder::x86()
        .overlay(vec![0u8; 4096])
        .overlay(b"\xEF\xBE\xAD\xDENullsoftInst")
        .build();
    let path = write(dir.path(), "setup.exe", &image);

    let narrow = Classifier::new().scan_limit(plain.len() as u64 + 1024).classify(&path);
    assert_eq!(narrow.kind, InstallerKind::StandaloneExecutable);

    let wide = Classifier::new().classify(&path);
    assert_eq!(wide.kind, InstallerKind::Nsis);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn classify_never_panics(data in proptest::collection::vec(any::<u8>(), 0..2048)) {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "input.bin", &data);
        let result = classify(&path);
        prop_assert!(!result.evidence.is_empty());
    }
}
