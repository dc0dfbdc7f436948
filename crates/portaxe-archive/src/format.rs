use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Container formats recognised by their leading magic bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    SevenZip,
    Rar,
    Cab,
}

const HEADER_LEN: usize = 8;

pub fn detect_format(data: &[u8]) -> Option<ArchiveFormat> {
    match data {
        [0x50, 0x4B, 0x03, 0x04, ..] | [0x50, 0x4B, 0x05, 0x06, ..] => Some(ArchiveFormat::Zip),
        [0x37, 0x7A, 0xBC, 0xAF, 0x27, 0x1C, ..] => Some(ArchiveFormat::SevenZip),
        [b'R', b'a', b'r', b'!', 0x1A, 0x07, 0x00, ..]
        | [b'R', b'a', b'r', b'!', 0x1A, 0x07, 0x01, 0x00, ..] => Some(ArchiveFormat::Rar),
        [b'M', b'S', b'C', b'F', 0x00, 0x00, 0x00, 0x00, ..] => Some(ArchiveFormat::Cab),
        _ => None,
    }
}

/// Sniff the format of a file on disk. Short files are not an error.
pub fn detect_from_path(path: impl AsRef<Path>) -> io::Result<Option<ArchiveFormat>> {
    let mut header = Vec::with_capacity(HEADER_LEN);
    File::open(path)?
        .take(HEADER_LEN as u64)
        .read_to_end(&mut header)?;
    Ok(detect_format(&header))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_zip_format() {
        let zip_header = [0x50, 0x4B, 0x03, 0x04, 0x14, 0x00, 0x00, 0x00];
        assert_eq!(detect_format(&zip_header), Some(ArchiveFormat::Zip));
    }

    #[test]
    fn detect_empty_zip_format() {
        let eocd = [0x50, 0x4B, 0x05, 0x06, 0x00, 0x00];
        assert_eq!(detect_format(&eocd), Some(ArchiveFormat::Zip));
    }

    #[test]
    fn detect_seven_zip_format() {
        let header = [0x37, 0x7A, 0xBC, 0xAF, 0x27, 0x1C, 0x00, 0x04];
        assert_eq!(detect_format(&header), Some(ArchiveFormat::SevenZip));
    }

    #[test]
    fn detect_rar_formats() {
        assert_eq!(detect_format(b"Rar!\x1A\x07\x00\x00"), Some(ArchiveFormat::Rar));
        assert_eq!(detect_format(b"Rar!\x1A\x07\x01\x00"), Some(ArchiveFormat::Rar));
    }

    #[test]
    fn detect_cab_format() {
        assert_eq!(detect_format(b"MSCF\0\0\0\0"), Some(ArchiveFormat::Cab));
    }

    #[test]
    fn detect_unknown_format() {
        assert_eq!(detect_format(b"MZ\x90\x00"), None);
        assert_eq!(detect_format(&[]), None);
    }

    #[test]
    fn detect_from_short_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny");
        std::fs::write(&path, b"PK").unwrap();
        assert_eq!(detect_from_path(&path).unwrap(), None);
    }
}
