use crate::{Error, Result};
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// List every regular file below `root` as a path relative to `root`.
///
/// The result is sorted, so two trees with the same content always list in the
/// same order regardless of directory iteration order. Symlinks are never
/// followed and never listed.
pub fn list_files(root: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let root = root.as_ref();
    let mut files = Vec::new();

    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = entry.map_err(|e| Error::Read {
            path:   e.path().unwrap_or(root).to_path_buf(),
            source: e.into(),
        })?;
        let file_type = entry.file_type();
        if file_type.is_symlink() {
            tracing::warn!(path = %entry.path().display(), "symlink skipped");
            continue;
        }
        if !file_type.is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(root)
            .map_err(|_| Error::OutsideBase {
                path: entry.path().to_path_buf(),
                base: root.to_path_buf(),
            })?
            .to_path_buf();
        files.push(relative);
    }
    Ok(files)
}

/// Render a relative path with `/` separators, independent of the host platform.
pub fn to_slash_path(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
