//! Read-only zip mount exposing entries as a navigable tree.
//!
//! The central directory is read once when the file is mounted; entry
//! contents are decompressed on demand through the held handle. Closing the
//! mount drops the handle, after which every operation that touches the tree
//! fails with [`ApkError::ArchiveClosed`].

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::io::Read;
use std::path::Path;
use std::path::PathBuf;

use crate::ApkError;
use crate::Result;

type ZipReader = zip::ZipArchive<BufReader<File>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Node {
    File { index: usize, size: u64 },
    Dir,
}

/// A zip file mounted as a read-only filesystem.
pub struct ZipFileSystem {
    path: PathBuf,
    index: BTreeMap<String, Node>,
    handle: RefCell<Option<ZipReader>>,
}

impl ZipFileSystem {
    /// Mounts the zip file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ApkError::Io`] if the file cannot be opened and
    /// [`ApkError::InvalidArchive`] if it is not a readable zip.
    pub fn mount(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| ApkError::io(path, e))?;
        let mut reader =
            zip::ZipArchive::new(BufReader::new(file)).map_err(|e| ApkError::InvalidArchive {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let mut index = BTreeMap::new();
        index.insert(String::new(), Node::Dir);

        for i in 0..reader.len() {
            let entry = reader.by_index_raw(i).map_err(|e| ApkError::InvalidArchive {
                path: path.to_path_buf(),
                reason: format!("failed to read entry #{i}: {e}"),
            })?;

            let is_dir = entry.is_dir();
            let size = entry.size();
            let Some(name) = normalize(entry.name()) else {
                continue;
            };

            insert_parents(&mut index, &name);
            if is_dir {
                index.insert(name, Node::Dir);
            } else {
                // directories always win over same-named files
                index.entry(name).or_insert(Node::File { index: i, size });
            }
        }

        Ok(Self {
            path: path.to_path_buf(),
            index,
            handle: RefCell::new(Some(reader)),
        })
    }

    /// Path of the mounted zip file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the root node.
    ///
    /// # Errors
    ///
    /// Returns [`ApkError::ArchiveClosed`] once the mount is closed.
    pub fn root(&self) -> Result<EntryPath<'_>> {
        self.ensure_open()?;
        Ok(EntryPath {
            fs: self,
            path: String::new(),
        })
    }

    /// Releases the zip handle. Calling it again is a no-op.
    pub fn close(&self) {
        self.handle.borrow_mut().take();
    }

    /// Returns `true` after [`close`](Self::close).
    pub fn is_closed(&self) -> bool {
        self.handle.borrow().is_none()
    }

    /// Number of files (not directories) in the mount.
    pub fn file_count(&self) -> usize {
        self.index
            .values()
            .filter(|node| matches!(node, Node::File { .. }))
            .count()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(ApkError::ArchiveClosed {
                path: self.path.clone(),
            });
        }
        Ok(())
    }

    fn lookup(&self, name: &str) -> Result<Option<Node>> {
        self.ensure_open()?;
        Ok(self.index.get(name).copied())
    }

    fn read(&self, name: &str) -> Result<Vec<u8>> {
        let Some(Node::File { index, size }) = self.lookup(name)? else {
            return Err(ApkError::EntryNotFound {
                archive: self.path.clone(),
                entry: name.to_string(),
            });
        };

        let mut handle = self.handle.borrow_mut();
        let reader = handle.as_mut().ok_or_else(|| ApkError::ArchiveClosed {
            path: self.path.clone(),
        })?;
        let mut entry = reader
            .by_index(index)
            .map_err(|e| ApkError::InvalidArchive {
                path: self.path.clone(),
                reason: format!("failed to open entry '{name}': {e}"),
            })?;

        let mut bytes = Vec::with_capacity(usize::try_from(size).unwrap_or(0));
        entry
            .read_to_end(&mut bytes)
            .map_err(|e| ApkError::InvalidArchive {
                path: self.path.clone(),
                reason: format!("failed to read entry '{name}': {e}"),
            })?;
        Ok(bytes)
    }

    fn descendants<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a String> + 'a {
        let prefix = if name.is_empty() {
            String::new()
        } else {
            format!("{name}/")
        };
        self.index
            .range(prefix.clone()..)
            .map(|(key, _)| key)
            .take_while(move |key| key.starts_with(&prefix))
            .filter(|key| !key.is_empty())
    }
}

impl fmt::Debug for ZipFileSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZipFileSystem")
            .field("path", &self.path)
            .field("entries", &self.index.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// A node in a mounted archive, addressed by a `/`-separated path.
///
/// Resolving never touches the archive; existence is only checked when the
/// node is queried or read.
#[derive(Clone)]
pub struct EntryPath<'a> {
    fs: &'a ZipFileSystem,
    path: String,
}

impl<'a> EntryPath<'a> {
    /// Resolves `relative` against this node.
    ///
    /// A leading `/` resolves from the content root. `.` and empty segments
    /// are ignored, `..` moves to the parent and stops at the root.
    #[must_use]
    pub fn resolve(&self, relative: &str) -> Self {
        let mut segments: Vec<&str> = if relative.starts_with('/') || self.path.is_empty() {
            Vec::new()
        } else {
            self.path.split('/').collect()
        };

        for segment in relative.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    segments.pop();
                }
                other => segments.push(other),
            }
        }

        Self {
            fs: self.fs,
            path: segments.join("/"),
        }
    }

    /// Path relative to the content root, without a leading `/`.
    pub fn as_str(&self) -> &str {
        &self.path
    }

    /// Last path segment; empty for the root.
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or_default()
    }

    /// Returns `true` for the content root.
    pub fn is_root(&self) -> bool {
        self.path.is_empty()
    }

    /// Path of the archive this node belongs to.
    pub fn archive_path(&self) -> &'a Path {
        self.fs.path()
    }

    /// Whether the node names an existing file or directory.
    pub fn exists(&self) -> Result<bool> {
        Ok(self.fs.lookup(&self.path)?.is_some())
    }

    /// Whether the node names a directory (explicit or implied).
    pub fn is_dir(&self) -> Result<bool> {
        Ok(matches!(self.fs.lookup(&self.path)?, Some(Node::Dir)))
    }

    /// Uncompressed size of a file entry.
    pub fn size(&self) -> Result<u64> {
        match self.fs.lookup(&self.path)? {
            Some(Node::File { size, .. }) => Ok(size),
            Some(Node::Dir) => Ok(0),
            None => Err(self.not_found()),
        }
    }

    /// Reads the whole entry.
    ///
    /// # Errors
    ///
    /// [`ApkError::EntryNotFound`] if the node is missing or a directory,
    /// [`ApkError::ArchiveClosed`] after the archive was closed.
    pub fn read_bytes(&self) -> Result<Vec<u8>> {
        self.fs.read(&self.path)
    }

    /// Direct children, sorted by name.
    pub fn children(&self) -> Result<Vec<Self>> {
        if !self.is_dir()? {
            return Err(self.not_found());
        }
        Ok(self
            .fs
            .descendants(&self.path)
            .filter(|key| {
                let rest = if self.path.is_empty() {
                    key.as_str()
                } else {
                    &key[self.path.len() + 1..]
                };
                !rest.contains('/')
            })
            .map(|key| Self {
                fs: self.fs,
                path: key.clone(),
            })
            .collect())
    }

    /// Every file and directory below this node, depth first, sorted.
    pub fn walk(&self) -> Result<Vec<Self>> {
        if !self.is_dir()? {
            return Err(self.not_found());
        }
        Ok(self
            .fs
            .descendants(&self.path)
            .map(|key| Self {
                fs: self.fs,
                path: key.clone(),
            })
            .collect())
    }

    fn not_found(&self) -> ApkError {
        ApkError::EntryNotFound {
            archive: self.fs.path.clone(),
            entry: self.path.clone(),
        }
    }
}

impl fmt::Display for EntryPath<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.path)
    }
}

impl fmt::Debug for EntryPath<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntryPath")
            .field("archive", &self.fs.path)
            .field("path", &self.path)
            .finish()
    }
}

fn normalize(raw: &str) -> Option<String> {
    let joined = raw
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/");
    (!joined.is_empty()).then_some(joined)
}

fn insert_parents(index: &mut BTreeMap<String, Node>, name: &str) {
    let mut end = 0;
    while let Some(pos) = name[end..].find('/') {
        end += pos;
        index.insert(name[..end].to_string(), Node::Dir);
        end += 1;
    }
}
