//! MD5 verification of downloaded artifacts
//!
//! GameBanana publishes MD5 checksums for its files, so MD5 is what we
//! compare against. This is a corruption check, not a cryptographic one.

use md5::{Digest, Md5};
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncReadExt;
use tracing::debug;

use crate::error::{FileOperation, InstallError, Result};

const HASH_CHUNK_SIZE: usize = 8192;

/// Verify a file against an expected MD5 hex digest.
///
/// An empty `expected` means the catalog published no checksum; that passes
/// trivially rather than failing. Comparison is case-insensitive.
pub async fn verify_md5(path: &Path, expected: &str) -> Result<bool> {
    if expected.is_empty() {
        debug!("no checksum published for {}, skipping verification", path.display());
        return Ok(true);
    }

    let actual = compute_md5(path).await?;
    let matches = actual.eq_ignore_ascii_case(expected);
    debug!(
        "md5 verification for {}: expected={}, actual={}, matched={}",
        path.display(),
        expected,
        actual,
        matches
    );
    Ok(matches)
}

/// Compute the MD5 hex digest of a file, reading in fixed-size chunks
pub async fn compute_md5(path: &Path) -> Result<String> {
    let mut file = fs::File::open(path)
        .await
        .map_err(InstallError::fs(path, FileOperation::Read))?;

    let mut hasher = Md5::new();
    let mut buffer = [0u8; HASH_CHUNK_SIZE];
    loop {
        let read = file
            .read(&mut buffer)
            .await
            .map_err(InstallError::fs(path, FileOperation::Read))?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}
