//! Archive abstraction and format-specific backends.
//!
//! Every backend mounts its container through [`ZipFileSystem`]; backends
//! differ only in which entries they consider binary-encoded. Callers never
//! branch on the container kind, they ask the [`Archive`] instead.

pub mod apk;
pub mod detect;
pub mod zip;
pub mod zipfs;

use std::fmt;
use std::path::Path;

use crate::Result;

pub use apk::ApkArchive;
pub use detect::ArchiveKind;
pub use self::zip::ZipArchive;
pub use zipfs::EntryPath;
pub use zipfs::ZipFileSystem;

/// An opened, navigable view over a container file.
pub trait Archive: fmt::Debug {
    /// Canonical path of the container file.
    fn path(&self) -> &Path;

    /// Container kind this archive was opened as.
    fn kind(&self) -> ArchiveKind;

    /// Root node from which every entry can be resolved.
    ///
    /// # Errors
    ///
    /// Returns [`ApkError::ArchiveClosed`](crate::ApkError::ArchiveClosed)
    /// once the archive is closed.
    fn content_root(&self) -> Result<EntryPath<'_>>;

    /// Whether `bytes`, read from `entry`, are Android binary XML.
    ///
    /// Depends only on the entry location and the leading bytes.
    fn is_binary_xml(&self, entry: &EntryPath<'_>, bytes: &[u8]) -> Result<bool>;

    /// Whether `bytes` use any binary encoding known to this backend.
    fn is_binary_format(&self, entry: &EntryPath<'_>, bytes: &[u8]) -> Result<bool> {
        self.is_binary_xml(entry, bytes)
    }

    /// Releases native resources. Closing twice is a no-op.
    fn close(&self) -> Result<()>;

    /// Whether [`close`](Self::close) has been called.
    fn is_closed(&self) -> bool;
}
