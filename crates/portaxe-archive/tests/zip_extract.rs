use std::io::Write;
use std::path::{Path, PathBuf};

use portaxe_archive::{ArchiveFormat, Error, detect_from_path, extract_zip};
use tempfile::TempDir;
use zip::CompressionMethod;
use zip::write::{SimpleFileOptions, ZipWriter};

fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
    let file = std::fs::File::create(path).unwrap();
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, data) in entries {
        if name.ends_with('/') {
            writer.add_directory(*name, options).unwrap();
        } else {
            writer.start_file(*name, options).unwrap();
            writer.write_all(data).unwrap();
        }
    }
    writer.finish().unwrap();
}

#[test]
fn extracts_nested_files() {
    let dir = TempDir::new().unwrap();
    let archive = dir.path().join("app.zip");
    write_zip(
        &archive,
        &[
            ("bin/", b""),
            ("bin/app.exe", b"MZ fake"),
            ("readme.txt", b"hello"),
        ],
    );

    let dest = dir.path().join("out");
    let report = extract_zip(&archive, &dest).unwrap();

    assert_eq!(
        report.files,
        vec![PathBuf::from("bin").join("app.exe"), PathBuf::from("readme.txt")]
    );
    assert_eq!(report.bytes, 12);
    assert_eq!(std::fs::read(dest.join("bin/app.exe")).unwrap(), b"MZ fake");
}

#[test]
fn sniffed_as_zip() {
    let dir = TempDir::new().unwrap();
    let archive = dir.path().join("app.zip");
    write_zip(&archive, &[("a.txt", b"a")]);
    assert_eq!(detect_from_path(&archive).unwrap(), Some(ArchiveFormat::Zip));
}

#[test]
fn hostile_archive_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let archive = dir.path().join("evil.zip");
    write_zip(
        &archive,
        &[("good.txt", b"fine"), ("../../escaped.dll", b"bad")],
    );

    let dest = dir.path().join("nested").join("out");
    let result = extract_zip(&archive, &dest);

    assert!(matches!(result, Err(Error::ZipSlip { .. })));
    assert!(!dest.exists());
    assert!(!dir.path().join("escaped.dll").exists());
}

#[test]
fn corrupted_archive_is_reported() {
    let dir = TempDir::new().unwrap();
    let archive = dir.path().join("broken.zip");
    std::fs::write(&archive, b"PK\x03\x04 this is not really a zip").unwrap();
    let result = extract_zip(&archive, dir.path().join("out"));
    assert!(matches!(result, Err(Error::Corrupted(_)) | Err(Error::Io(_))));
}
