//! Scoped handle over a cached archive.

use std::fmt;
use std::path::Path;
use std::rc::Rc;

use tracing::debug;

use super::ArchiveManager;
use crate::Result;
use crate::archive::Archive;
use crate::archive::EntryPath;

/// One use of a cached archive.
///
/// Obtained from [`ArchiveManager::open_archive`]. Several contexts may
/// share the same archive. Dropping a context never closes the archive;
/// archives live until [`ArchiveManager::close`].
pub struct ArchiveContext<'m> {
    manager: &'m ArchiveManager,
    archive: Rc<dyn Archive>,
}

impl<'m> ArchiveContext<'m> {
    pub(super) fn new(manager: &'m ArchiveManager, archive: Rc<dyn Archive>) -> Self {
        manager.context_opened();
        debug!(path = %archive.path().display(), "archive context acquired");
        Self { manager, archive }
    }

    /// The shared archive.
    pub fn archive(&self) -> &dyn Archive {
        self.archive.as_ref()
    }

    /// Canonical path of the archive.
    pub fn path(&self) -> &Path {
        self.archive.path()
    }

    /// Root of the archive's content tree.
    ///
    /// # Errors
    ///
    /// Returns [`ApkError::ArchiveClosed`](crate::ApkError::ArchiveClosed)
    /// if the archive has been closed.
    pub fn content_root(&self) -> Result<EntryPath<'_>> {
        self.archive.content_root()
    }

    /// Ends this use of the archive. Equivalent to dropping the context.
    pub fn close(self) {}

    #[cfg(test)]
    pub(super) fn shared(&self) -> &Rc<dyn Archive> {
        &self.archive
    }
}

impl Drop for ArchiveContext<'_> {
    fn drop(&mut self) {
        self.manager.context_released();
        debug!(path = %self.archive.path().display(), "archive context released");
    }
}

impl fmt::Debug for ArchiveContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArchiveContext")
            .field("archive", &self.archive)
            .finish_non_exhaustive()
    }
}
