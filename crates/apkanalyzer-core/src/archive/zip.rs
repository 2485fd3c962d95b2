//! Generic zip / jar backend.

use std::path::Path;

use super::Archive;
use super::ArchiveKind;
use super::EntryPath;
use super::ZipFileSystem;
use crate::ApkError;
use crate::Result;

/// Any zip-compatible container. Recognizes no binary formats.
#[derive(Debug)]
pub struct ZipArchive {
    fs: ZipFileSystem,
}

impl ZipArchive {
    /// Mounts the zip file at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self {
            fs: ZipFileSystem::mount(path)?,
        })
    }

    pub(crate) fn mount(&self) -> &ZipFileSystem {
        &self.fs
    }

    pub(crate) fn ensure_open(&self) -> Result<()> {
        if self.fs.is_closed() {
            return Err(ApkError::ArchiveClosed {
                path: self.fs.path().to_path_buf(),
            });
        }
        Ok(())
    }
}

impl Archive for ZipArchive {
    fn path(&self) -> &Path {
        self.fs.path()
    }

    fn kind(&self) -> ArchiveKind {
        ArchiveKind::Zip
    }

    fn content_root(&self) -> Result<EntryPath<'_>> {
        self.fs.root()
    }

    fn is_binary_xml(&self, _entry: &EntryPath<'_>, _bytes: &[u8]) -> Result<bool> {
        self.ensure_open()?;
        Ok(false)
    }

    fn close(&self) -> Result<()> {
        self.fs.close();
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.fs.is_closed()
    }
}
