//! Pluggable archive construction.

use std::fmt;
use std::path::Path;
use std::path::PathBuf;
use std::rc::Rc;

use crate::ApkError;
use crate::Result;
use crate::archive::ApkArchive;
use crate::archive::Archive;
use crate::archive::ArchiveKind;
use crate::archive::ZipArchive;

/// A freshly opened archive plus any temporary directory its backend
/// allocated while opening it.
#[derive(Debug)]
pub struct Mounted {
    /// The opened archive.
    pub archive: Rc<dyn Archive>,
    /// Directory to delete once the archive is closed.
    pub temp_dir: Option<PathBuf>,
}

impl Mounted {
    /// Wraps an archive that needed no temporary directory.
    pub fn new(archive: impl Archive + 'static) -> Self {
        Self {
            archive: Rc::new(archive),
            temp_dir: None,
        }
    }
}

/// Opens archives of a detected kind.
///
/// [`ArchiveManager`](super::ArchiveManager) only ever calls this for
/// supported kinds, after canonicalizing the path.
pub trait BackendFactory: fmt::Debug {
    /// Opens the container at `path` as `kind`.
    ///
    /// # Errors
    ///
    /// Propagates I/O and format errors from the backend.
    fn open(&self, kind: ArchiveKind, path: &Path) -> Result<Mounted>;
}

/// The zip-backed implementations shipped with this crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeBackends;

impl BackendFactory for NativeBackends {
    fn open(&self, kind: ArchiveKind, path: &Path) -> Result<Mounted> {
        match kind {
            ArchiveKind::Apk => Ok(Mounted::new(ApkArchive::open(path)?)),
            ArchiveKind::Zip => Ok(Mounted::new(ZipArchive::open(path)?)),
            ArchiveKind::AppBundle | ArchiveKind::InstantAppBundle => {
                Err(ApkError::Unsupported {
                    kind: kind.name(),
                    path: path.to_path_buf(),
                })
            }
        }
    }
}
