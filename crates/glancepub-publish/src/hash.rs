//! MD5 content verification.
//!
//! Glance records image checksums as MD5 digests; these helpers compute a
//! file's digest and compare it with the checksum carried by a unit.

use std::io::Read;
use std::path::Path;

use glancepub_common::error::{GlancepubError, Result};
use glancepub_common::types::ImageChecksum;

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Computes the MD5 checksum of a file.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read.
pub fn md5_file(path: &Path) -> Result<ImageChecksum> {
    tracing::debug!(path = %path.display(), "computing MD5 checksum");
    let mut file = std::fs::File::open(path).map_err(GlancepubError::io(path))?;
    let mut context = md5::Context::new();
    let mut buffer = vec![0u8; READ_BUFFER_SIZE];
    loop {
        let read = file.read(&mut buffer).map_err(GlancepubError::io(path))?;
        if read == 0 {
            break;
        }
        context.consume(&buffer[..read]);
    }
    ImageChecksum::from_hex(format!("{:x}", context.compute()))
}

/// Validates that a file matches the expected checksum.
///
/// # Errors
///
/// Returns `GlancepubError::HashMismatch` if the checksums differ.
pub fn validate_checksum(path: &Path, expected: &ImageChecksum) -> Result<()> {
    let actual = md5_file(path)?;
    if &actual != expected {
        return Err(GlancepubError::HashMismatch {
            resource: path.display().to_string(),
            expected: expected.as_hex().to_string(),
            actual: actual.as_hex().to_string(),
        });
    }
    Ok(())
}
