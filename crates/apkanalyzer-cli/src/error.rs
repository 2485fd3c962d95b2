//! Error conversion utilities for CLI.
//!
//! Converts apkanalyzer-core's typed errors (thiserror) into single-line
//! contextual errors (anyhow) naming the archive and entry involved.

use anyhow::anyhow;
use apkanalyzer_core::ApkError;
use std::path::Path;

/// Converts `ApkError` to a user-facing anyhow error with context
pub fn convert_apk_error(err: ApkError, archive: &Path) -> anyhow::Error {
    match err {
        ApkError::Unsupported { kind, path } => {
            anyhow!(
                "Unsupported archive '{}': {kind} files cannot be analyzed",
                path.display()
            )
        }
        ApkError::Io { path, source } if source.kind() == std::io::ErrorKind::NotFound => {
            anyhow!("File not found: {}", path.display())
        }
        ApkError::Io { path, source } => {
            anyhow!("I/O error while reading '{}': {source}", path.display())
        }
        ApkError::InvalidArchive { path, reason } => {
            anyhow!("Invalid archive '{}': {reason}", path.display())
        }
        ApkError::EntryNotFound { archive, entry } => {
            anyhow!("File '{entry}' not found in '{}'", archive.display())
        }
        // already phrased for the user
        err @ (ApkError::NotBinaryResource { .. } | ApkError::Output(_)) => anyhow::Error::from(err),
        _ => anyhow::Error::from(err)
            .context(format!("Error processing archive '{}'", archive.display())),
    }
}

/// Adds archive context to a core result
pub fn add_archive_context<T>(
    result: Result<T, ApkError>,
    archive: &Path,
) -> anyhow::Result<T> {
    result.map_err(|e| convert_apk_error(e, archive))
}
