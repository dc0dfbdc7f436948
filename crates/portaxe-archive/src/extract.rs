use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::sanitize::sanitize_entry_path;

/// What a native extraction wrote, relative to its destination.
#[derive(Clone, Debug, Default)]
pub struct ExtractReport {
    pub files:       Vec<PathBuf>,
    pub directories: usize,
    pub bytes:       u64,
}

/// Unpack a ZIP archive into `dest`.
///
/// All entry names are validated before the first byte is written, so a
/// hostile archive leaves `dest` untouched.
pub fn extract_zip(archive: impl AsRef<Path>, dest: impl AsRef<Path>) -> Result<ExtractReport> {
    let archive_path = archive.as_ref();
    let dest = dest.as_ref();

    let file = File::open(archive_path).map_err(|source| Error::ExtractionFailed {
        path: archive_path.to_path_buf(),
        source,
    })?;
    let mut zip = zip::ZipArchive::new(BufReader::new(file))?;

    let mut targets = Vec::with_capacity(zip.len());
    for index in 0..zip.len() {
        let entry = zip.by_index_raw(index)?;
        let target = sanitize_entry_path(entry.name(), dest)?;
        targets.push((target, entry.is_dir()));
    }

    fs::create_dir_all(dest).map_err(|source| Error::DirectoryCreationFailed {
        path: dest.to_path_buf(),
        source,
    })?;

    let mut report = ExtractReport::default();
    for (index, (target, is_dir)) in targets.into_iter().enumerate() {
        if is_dir {
            create_dir(&target)?;
            report.directories += 1;
            continue;
        }
        if let Some(parent) = target.parent() {
            create_dir(parent)?;
        }

        let mut entry = zip.by_index(index)?;
        let out = File::create(&target).map_err(|source| Error::ExtractionFailed {
            path: target.clone(),
            source,
        })?;
        let mut writer = BufWriter::new(out);
        let written = io::copy(&mut entry, &mut writer).map_err(|source| Error::ExtractionFailed {
            path: target.clone(),
            source,
        })?;
        writer.into_inner().map_err(|e| Error::ExtractionFailed {
            path:   target.clone(),
            source: e.into_error(),
        })?;

        report.bytes += written;
        if let Ok(relative) = target.strip_prefix(dest) {
            report.files.push(relative.to_path_buf());
        }
    }

    tracing::debug!(
        archive = %archive_path.display(),
        files = report.files.len(),
        bytes = report.bytes,
        "zip extracted"
    );
    Ok(report)
}

fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|source| Error::DirectoryCreationFailed {
        path: path.to_path_buf(),
        source,
    })
}
