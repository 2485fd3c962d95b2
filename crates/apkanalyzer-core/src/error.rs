//! Error types for archive inspection operations.

use std::path::Path;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using `ApkError`.
pub type Result<T> = std::result::Result<T, ApkError>;

/// Errors that can occur while opening, navigating or decoding archives.
#[derive(Error, Debug)]
pub enum ApkError {
    /// I/O operation on a filesystem path failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// Path the operation was performed on.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Container kind is recognized but deliberately not supported.
    #[error("unsupported archive format ({kind}): {}", path.display())]
    Unsupported {
        /// Human-readable container kind, e.g. "app bundle".
        kind: &'static str,
        /// The offending container.
        path: PathBuf,
    },

    /// Container is corrupted or not a zip.
    #[error("invalid archive {}: {reason}", path.display())]
    InvalidArchive {
        /// The container path.
        path: PathBuf,
        /// Reason reported by the zip reader.
        reason: String,
    },

    /// Entry does not exist inside the archive.
    #[error("entry '{entry}' not found in {}", archive.display())]
    EntryNotFound {
        /// The container path.
        archive: PathBuf,
        /// The entry path inside the container.
        entry: String,
    },

    /// Operation attempted on an archive that was already closed.
    #[error("archive is closed: {}", path.display())]
    ArchiveClosed {
        /// The container path.
        path: PathBuf,
    },

    /// Bytes handed to the binary XML decoder are not binary XML.
    #[error("{name} is not a binary XML document")]
    NotBinaryXml {
        /// Logical file name of the document.
        name: String,
    },

    /// Entry asked for as a compiled XML resource is not one.
    #[error("The supplied file is not a binary XML resource.")]
    NotBinaryResource {
        /// The entry path inside the container.
        entry: String,
    },

    /// Binary XML document is truncated or structurally invalid.
    #[error("malformed binary XML: {0}")]
    MalformedXml(String),

    /// Textual manifest could not be parsed.
    #[error("invalid manifest: {0}")]
    Manifest(String),

    /// Writing command output failed.
    #[error("failed to write output: {0}")]
    Output(#[source] std::io::Error),
}

impl ApkError {
    pub(crate) fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Returns `true` if the error means a file or entry does not exist.
    ///
    /// # Examples
    ///
    /// ```
    /// use apkanalyzer_core::ApkError;
    /// use std::path::PathBuf;
    ///
    /// let err = ApkError::EntryNotFound {
    ///     archive: PathBuf::from("app.apk"),
    ///     entry: "classes.dex".to_string(),
    /// };
    /// assert!(err.is_not_found());
    /// ```
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::EntryNotFound { .. } => true,
            Self::Io { source, .. } => source.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }

    /// Returns `true` if the container kind is deliberately unsupported.
    #[must_use]
    pub const fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }

    /// Returns `true` if the error came from decoding document contents
    /// rather than from the archive layer.
    #[must_use]
    pub const fn is_decoding(&self) -> bool {
        matches!(
            self,
            Self::NotBinaryXml { .. }
                | Self::NotBinaryResource { .. }
                | Self::MalformedXml(_)
                | Self::Manifest(_)
        )
    }
}

impl From<quick_xml::Error> for ApkError {
    fn from(err: quick_xml::Error) -> Self {
        Self::Manifest(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for ApkError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Self::Manifest(err.to_string())
    }
}
