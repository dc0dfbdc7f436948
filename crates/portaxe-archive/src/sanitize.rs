use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Resolve an archive entry name to a path under `base`.
///
/// Backslashes are treated as separators regardless of host. Absolute names,
/// drive prefixes, and `..` segments that climb above the entry root are
/// rejected instead of being silently rewritten.
pub fn sanitize_entry_path(entry: &str, base: impl AsRef<Path>) -> Result<PathBuf> {
    let relative = normalize_entry(entry)?;
    Ok(base.as_ref().join(relative))
}

fn normalize_entry(entry: &str) -> Result<PathBuf> {
    if entry.contains('\0') {
        return Err(Error::InvalidPath(entry.replace('\0', "\\0")));
    }
    let unified = entry.replace('\\', "/");
    if unified.starts_with('/') || has_drive_prefix(&unified) {
        return Err(Error::ZipSlip {
            entry: entry.to_string(),
        });
    }

    let mut result = PathBuf::new();
    let mut depth = 0usize;
    for component in Path::new(&unified).components() {
        match component {
            Component::Normal(part) => {
                result.push(part);
                depth += 1;
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if depth == 0 {
                    return Err(Error::ZipSlip {
                        entry: entry.to_string(),
                    });
                }
                result.pop();
                depth -= 1;
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(Error::ZipSlip {
                    entry: entry.to_string(),
                });
            }
        }
    }

    if depth == 0 {
        return Err(Error::InvalidPath(entry.to_string()));
    }
    Ok(result)
}

fn has_drive_prefix(name: &str) -> bool {
    let bytes = name.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}
