//! Container kind detection.

use std::fmt;
use std::path::Path;

use crate::ApkError;
use crate::Result;

/// Container kinds distinguished by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveKind {
    /// Android application package (`.apk`).
    Apk,
    /// Android App Bundle (`.aab`), not supported.
    AppBundle,
    /// Instant app bundle (`.zip`), not supported.
    InstantAppBundle,
    /// Any other zip-compatible container (jar, aar, unknown extension).
    Zip,
}

/// Extensions of nested entries that can be opened as inner archives.
pub const INNER_ARCHIVE_EXTENSIONS: [&str; 3] = ["zip", "apk", "jar"];

impl ArchiveKind {
    /// Detects the container kind from the last extension of `path`,
    /// ignoring ASCII case.
    ///
    /// # Examples
    ///
    /// ```
    /// use apkanalyzer_core::ArchiveKind;
    /// use std::path::Path;
    ///
    /// assert_eq!(ArchiveKind::detect(Path::new("app.APK")), ArchiveKind::Apk);
    /// assert_eq!(ArchiveKind::detect(Path::new("lib.jar")), ArchiveKind::Zip);
    /// assert_eq!(ArchiveKind::detect(Path::new("app.aab")), ArchiveKind::AppBundle);
    /// ```
    pub fn detect(path: &Path) -> Self {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("apk") => Self::Apk,
            Some("aab") => Self::AppBundle,
            Some("zip") => Self::InstantAppBundle,
            _ => Self::Zip,
        }
    }

    /// Detects the kind of an archive nested inside another one.
    ///
    /// Only `.apk`, `.jar` and `.zip` entries qualify. Nested zips are plain
    /// payloads rather than instant app bundles, so they mount as generic
    /// zips.
    ///
    /// # Errors
    ///
    /// Returns [`ApkError::Unsupported`] for any other extension.
    pub fn detect_inner(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        if !INNER_ARCHIVE_EXTENSIONS.contains(&extension.as_str()) {
            return Err(ApkError::Unsupported {
                kind: "inner entry",
                path: path.to_path_buf(),
            });
        }

        Ok(match Self::detect(path) {
            Self::InstantAppBundle => Self::Zip,
            kind => kind,
        })
    }

    /// Fails for kinds that are recognized but deliberately not handled.
    ///
    /// # Errors
    ///
    /// Returns [`ApkError::Unsupported`] for app bundles and instant app bundles.
    pub fn ensure_supported(self, path: &Path) -> Result<Self> {
        match self {
            Self::AppBundle | Self::InstantAppBundle => Err(ApkError::Unsupported {
                kind: self.name(),
                path: path.to_path_buf(),
            }),
            Self::Apk | Self::Zip => Ok(self),
        }
    }

    /// Human-readable name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Apk => "apk",
            Self::AppBundle => "app bundle",
            Self::InstantAppBundle => "instant app bundle",
            Self::Zip => "zip",
        }
    }
}

impl fmt::Display for ArchiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
