use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use crate::{Result, Sha256Hasher, VerifiedReader, VerifyError};

/// Digest and size of one file, as recorded in a manifest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileDigest {
    /// Lowercase hex SHA-256.
    pub sha256: String,
    pub size:   u64,
}

/// Hash a stream to completion.
pub fn digest_reader<R: Read>(reader: R) -> io::Result<FileDigest> {
    let mut verified = VerifiedReader::new(reader, Sha256Hasher::new());
    io::copy(&mut verified, &mut io::sink())?;
    let size = verified.bytes_read();
    Ok(FileDigest {
        sha256: hex::encode(verified.into_digest()),
        size,
    })
}

/// Hash the bytes currently on disk at `path`.
pub fn digest_file(path: impl AsRef<Path>) -> Result<FileDigest> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| VerifyError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    digest_reader(BufReader::new(file)).map_err(|source| VerifyError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Recompute the digest of `path` and compare it with a recorded one.
pub fn verify_file(path: impl AsRef<Path>, expected: &FileDigest) -> Result<()> {
    let path = path.as_ref();
    let expected_bytes = hex::decode(&expected.sha256)
        .map_err(|_| VerifyError::InvalidDigest(expected.sha256.clone()))?;

    let file = File::open(path).map_err(|source| VerifyError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mut verified = VerifiedReader::new(BufReader::new(file), Sha256Hasher::new());
    io::copy(&mut verified, &mut io::sink()).map_err(|source| VerifyError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    if verified.bytes_read() != expected.size {
        return Err(VerifyError::SizeMismatch {
            path:     path.to_path_buf(),
            expected: expected.size,
            actual:   verified.bytes_read(),
        });
    }
    verified.finish(&expected_bytes)
}
