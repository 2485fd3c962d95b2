//! Archive lifecycle: open, cache, unpack nested archives, tear down.
//!
//! [`ArchiveManager`] memoizes one archive per canonical path and hands out
//! [`ArchiveContext`]s that share it. Nested archives are unpacked into
//! temporary directories that the manager owns. [`ArchiveManager::close`]
//! closes every archive first and only then deletes the temporary
//! directories, so no backend ever sees its backing files vanish.
//!
//! # Examples
//!
//! ```no_run
//! use apkanalyzer_core::ArchiveManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut manager = ArchiveManager::new();
//! {
//!     let context = manager.open_archive("app.apk")?;
//!     let root = context.content_root()?;
//!     for entry in root.children()? {
//!         println!("{entry}");
//!     }
//! }
//! let report = manager.close();
//! assert!(report.is_clean());
//! # Ok(())
//! # }
//! ```

mod backend;
mod context;

use std::cell::Cell;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::rc::Rc;

use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::ApkError;
use crate::ManagerConfig;
use crate::Result;
use crate::archive::Archive;
use crate::archive::ArchiveKind;

pub use backend::BackendFactory;
pub use backend::Mounted;
pub use backend::NativeBackends;
pub use context::ArchiveContext;

/// Registry of open archives and the temporary directories they depend on.
///
/// Single-threaded: registries live behind `RefCell`, and contexts borrow
/// the manager, so [`close`](Self::close) cannot run while any context is
/// alive.
#[derive(Debug)]
pub struct ArchiveManager {
    config: ManagerConfig,
    backends: Box<dyn BackendFactory>,
    archives: RefCell<HashMap<PathBuf, Rc<dyn Archive>>>,
    temp_dirs: RefCell<BTreeMap<PathBuf, Vec<PathBuf>>>,
    // (parent canonical path, entry) -> extracted canonical path
    unpacked: RefCell<HashMap<(PathBuf, String), PathBuf>>,
    live_contexts: Cell<usize>,
}

/// A cleanup step that failed during [`ArchiveManager::close`].
#[derive(Debug)]
pub struct CleanupFailure {
    /// The archive or directory that could not be cleaned up.
    pub path: PathBuf,
    /// What went wrong.
    pub error: ApkError,
}

/// Summary of an [`ArchiveManager::close`] call.
#[derive(Debug, Default)]
pub struct CloseReport {
    /// Archives closed successfully.
    pub archives_closed: usize,
    /// Temporary directories deleted (or already gone).
    pub temp_dirs_removed: usize,
    /// Steps that failed. Cleanup continued past each of them.
    pub failures: Vec<CleanupFailure>,
}

impl CloseReport {
    /// Returns `true` if every archive closed and every directory was removed.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

impl Default for ArchiveManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveManager {
    /// Creates a manager with default configuration and the native backends.
    pub fn new() -> Self {
        Self::with_config(ManagerConfig::default())
    }

    /// Creates a manager with `config` and the native backends.
    pub fn with_config(config: ManagerConfig) -> Self {
        Self::with_backends(config, Box::new(NativeBackends))
    }

    /// Creates a manager that opens archives through `backends`.
    pub fn with_backends(config: ManagerConfig, backends: Box<dyn BackendFactory>) -> Self {
        Self {
            config,
            backends,
            archives: RefCell::new(HashMap::new()),
            temp_dirs: RefCell::new(BTreeMap::new()),
            unpacked: RefCell::new(HashMap::new()),
            live_contexts: Cell::new(0),
        }
    }

    /// Opens the archive at `path`, or reuses it if already open.
    ///
    /// The path is canonicalized first, so different spellings of the same
    /// file share one archive. The container kind comes from the extension
    /// of `path` as given, not of the symlink-resolved file: `.apk` opens as
    /// an APK, `.aab` and `.zip` are rejected, anything else opens as a
    /// generic zip.
    ///
    /// # Errors
    ///
    /// - [`ApkError::Io`] if the path cannot be canonicalized or read
    /// - [`ApkError::Unsupported`] for app bundles and instant app bundles
    /// - [`ApkError::InvalidArchive`] if the file is not a valid zip
    ///
    /// A failed open leaves nothing cached, so it can be retried.
    pub fn open_archive(&self, path: impl AsRef<Path>) -> Result<ArchiveContext<'_>> {
        let path = path.as_ref();
        let canonical = fs::canonicalize(path).map_err(|e| ApkError::io(path, e))?;

        let cached = self.archives.borrow().get(&canonical).cloned();
        if let Some(archive) = cached {
            debug!(path = %canonical.display(), "archive cache hit");
            return Ok(ArchiveContext::new(self, archive));
        }

        let kind = ArchiveKind::detect(path).ensure_supported(path)?;
        info!(path = %canonical.display(), %kind, "opening archive");
        let mounted = self.backends.open(kind, &canonical)?;
        Ok(self.register(canonical, mounted, None))
    }

    /// Unpacks the archive stored at `entry` inside `parent` and opens it.
    ///
    /// The entry is written into a fresh temporary directory owned by the
    /// manager and removed by [`close`](Self::close). Only `.apk`, `.jar`
    /// and `.zip` entries qualify; a nested `.zip` opens as a generic zip.
    /// Opening the same entry of the same parent again reuses the unpacked
    /// archive.
    ///
    /// # Errors
    ///
    /// - [`ApkError::Unsupported`] if the entry extension does not name an archive
    /// - [`ApkError::EntryNotFound`] if the entry does not exist
    /// - [`ApkError::Io`] if the temporary copy cannot be written
    /// - any error from opening the unpacked archive
    pub fn open_inner_archive(
        &self,
        parent: &ArchiveContext<'_>,
        entry: &str,
    ) -> Result<ArchiveContext<'_>> {
        let root = parent.content_root()?;
        let node = root.resolve(entry);
        let key = (parent.path().to_path_buf(), node.as_str().to_string());

        let cached = self
            .unpacked
            .borrow()
            .get(&key)
            .and_then(|extracted| self.archives.borrow().get(extracted).cloned());
        if let Some(archive) = cached {
            debug!(entry = %node, "inner archive cache hit");
            return Ok(ArchiveContext::new(self, archive));
        }

        let kind = ArchiveKind::detect_inner(Path::new(node.file_name()))?;
        let bytes = node.read_bytes()?;

        let parent_dir = self.config.temp_parent();
        let dir = tempfile::Builder::new()
            .prefix(&self.config.temp_prefix)
            .tempdir_in(&parent_dir)
            .map_err(|e| ApkError::io(&parent_dir, e))?
            .keep();
        debug!(entry = %node, dir = %dir.display(), "unpacking inner archive");

        let target = dir.join(node.file_name());
        let mounted = fs::write(&target, &bytes)
            .map_err(|e| ApkError::io(&target, e))
            .and_then(|()| fs::canonicalize(&target).map_err(|e| ApkError::io(&target, e)))
            .and_then(|canonical| {
                info!(path = %canonical.display(), %kind, "opening inner archive");
                let mounted = self.backends.open(kind, &canonical)?;
                Ok((canonical, mounted))
            });

        match mounted {
            Ok((canonical, mounted)) => {
                self.unpacked.borrow_mut().insert(key, canonical.clone());
                Ok(self.register(canonical, mounted, Some(dir)))
            }
            Err(err) => {
                if let Err(e) = remove_dir(&dir) {
                    warn!(dir = %dir.display(), error = %e, "failed to remove temporary directory");
                }
                Err(err)
            }
        }
    }

    fn register(
        &self,
        canonical: PathBuf,
        mounted: Mounted,
        extracted_to: Option<PathBuf>,
    ) -> ArchiveContext<'_> {
        let dirs: Vec<PathBuf> = extracted_to.into_iter().chain(mounted.temp_dir).collect();
        if !dirs.is_empty() {
            self.temp_dirs
                .borrow_mut()
                .entry(canonical.clone())
                .or_default()
                .extend(dirs);
        }
        self.archives
            .borrow_mut()
            .insert(canonical, Rc::clone(&mounted.archive));
        ArchiveContext::new(self, mounted.archive)
    }

    /// Closes every cached archive, then deletes every recorded temporary
    /// directory.
    ///
    /// Failures are logged and collected in the report; cleanup always runs
    /// to the end. Afterwards the registries are empty and the manager can
    /// be used again.
    pub fn close(&mut self) -> CloseReport {
        let mut report = CloseReport::default();

        let mut archives: Vec<_> = self.archives.get_mut().drain().collect();
        archives.sort_by(|a, b| a.0.cmp(&b.0));
        for (path, archive) in archives {
            match archive.close() {
                Ok(()) => {
                    info!(path = %path.display(), "closed archive");
                    report.archives_closed += 1;
                }
                Err(error) => {
                    warn!(path = %path.display(), %error, "failed to close archive");
                    report.failures.push(CleanupFailure { path, error });
                }
            }
        }

        self.unpacked.get_mut().clear();
        let temp_dirs = std::mem::take(self.temp_dirs.get_mut());
        for (archive, dirs) in temp_dirs {
            for dir in dirs {
                match remove_dir(&dir) {
                    Ok(()) => {
                        info!(archive = %archive.display(), dir = %dir.display(), "deleted temporary directory");
                        report.temp_dirs_removed += 1;
                    }
                    Err(error) => {
                        warn!(dir = %dir.display(), %error, "failed to delete temporary directory");
                        report.failures.push(CleanupFailure { path: dir, error });
                    }
                }
            }
        }

        report
    }

    /// Number of archives currently cached.
    pub fn cached_archives(&self) -> usize {
        self.archives.borrow().len()
    }

    /// Whether an archive is cached under the canonical form of `path`.
    pub fn is_cached(&self, path: impl AsRef<Path>) -> bool {
        fs::canonicalize(path)
            .map(|canonical| self.archives.borrow().contains_key(&canonical))
            .unwrap_or(false)
    }

    /// Every temporary directory the manager will delete on close.
    pub fn temp_dirs(&self) -> Vec<PathBuf> {
        self.temp_dirs.borrow().values().flatten().cloned().collect()
    }

    /// Number of [`ArchiveContext`]s currently alive.
    pub fn live_contexts(&self) -> usize {
        self.live_contexts.get()
    }

    fn context_opened(&self) {
        self.live_contexts.set(self.live_contexts.get() + 1);
    }

    fn context_released(&self) {
        self.live_contexts
            .set(self.live_contexts.get().saturating_sub(1));
    }
}

impl Drop for ArchiveManager {
    fn drop(&mut self) {
        if self.archives.get_mut().is_empty() && self.temp_dirs.get_mut().is_empty() {
            return;
        }
        let report = self.close();
        if !report.is_clean() {
            warn!(
                failures = report.failures.len(),
                "archive manager dropped with cleanup failures"
            );
        }
    }
}

/// Removes `dir` recursively. A directory that is already gone counts as
/// removed.
fn remove_dir(dir: &Path) -> Result<()> {
    match fs::remove_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(dir = %dir.display(), "temporary directory already gone");
            Ok(())
        }
        Err(e) => Err(ApkError::io(dir, e)),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::archive::EntryPath;
    use crate::archive::ZipArchive;
    use crate::test_utils::write_test_apk;
    use crate::test_utils::write_test_zip;
    use tempfile::TempDir;

    /// Wraps a real zip mount and records what happens to it.
    #[derive(Debug)]
    struct ProbeArchive {
        inner: ZipArchive,
        kind: ArchiveKind,
        temp_dir: Option<PathBuf>,
        fail_close: bool,
        log: Rc<RefCell<Vec<String>>>,
    }

    impl Archive for ProbeArchive {
        fn path(&self) -> &Path {
            self.inner.path()
        }

        fn kind(&self) -> ArchiveKind {
            self.kind
        }

        fn content_root(&self) -> Result<EntryPath<'_>> {
            self.inner.content_root()
        }

        fn is_binary_xml(&self, entry: &EntryPath<'_>, bytes: &[u8]) -> Result<bool> {
            self.inner.is_binary_xml(entry, bytes)
        }

        fn close(&self) -> Result<()> {
            let name = self.path().file_name().unwrap().to_string_lossy().into_owned();
            let temp_exists = self.temp_dir.as_ref().is_none_or(|dir| dir.exists());
            self.log
                .borrow_mut()
                .push(format!("close {name} temp_exists={temp_exists}"));
            self.inner.close()?;
            if self.fail_close {
                return Err(ApkError::InvalidArchive {
                    path: self.path().to_path_buf(),
                    reason: "refusing to close".to_string(),
                });
            }
            Ok(())
        }

        fn is_closed(&self) -> bool {
            self.inner.is_closed()
        }
    }

    #[derive(Debug, Default)]
    struct ProbeBackends {
        opened: Rc<Cell<usize>>,
        log: Rc<RefCell<Vec<String>>>,
        allocate_temp: bool,
        fail_close_for: Option<&'static str>,
    }

    impl BackendFactory for ProbeBackends {
        fn open(&self, kind: ArchiveKind, path: &Path) -> Result<Mounted> {
            self.opened.set(self.opened.get() + 1);
            let temp_dir = self
                .allocate_temp
                .then(|| TempDir::new().unwrap().keep());
            let fail_close = self
                .fail_close_for
                .is_some_and(|name| path.ends_with(name));
            let archive = ProbeArchive {
                inner: ZipArchive::open(path)?,
                kind,
                temp_dir: temp_dir.clone(),
                fail_close,
                log: Rc::clone(&self.log),
            };
            Ok(Mounted {
                archive: Rc::new(archive),
                temp_dir,
            })
        }
    }

    fn probe_manager(backends: ProbeBackends) -> ArchiveManager {
        ArchiveManager::with_backends(ManagerConfig::default(), Box::new(backends))
    }

    fn fixture(temp: &TempDir, name: &str) -> PathBuf {
        write_test_zip(temp.path(), name, &[("a.txt", b"a".as_slice())])
    }

    #[test]
    fn test_open_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let path = fixture(&temp, "app.apk");
        let opened = Rc::new(Cell::new(0));
        let manager = probe_manager(ProbeBackends {
            opened: Rc::clone(&opened),
            ..Default::default()
        });

        let first = manager.open_archive(&path).unwrap();
        let second = manager.open_archive(&path).unwrap();
        let respelled = manager
            .open_archive(temp.path().join(".").join("app.apk"))
            .unwrap();

        assert_eq!(opened.get(), 1);
        assert!(Rc::ptr_eq(first.shared(), second.shared()));
        assert!(Rc::ptr_eq(first.shared(), respelled.shared()));
        assert_eq!(manager.cached_archives(), 1);
        assert_eq!(manager.live_contexts(), 3);
    }

    #[test]
    fn test_contexts_do_not_close_archive() {
        let temp = TempDir::new().unwrap();
        let path = fixture(&temp, "lib.jar");
        let manager = ArchiveManager::new();

        let context = manager.open_archive(&path).unwrap();
        context.close();
        assert_eq!(manager.live_contexts(), 0);

        let context = manager.open_archive(&path).unwrap();
        assert!(!context.archive().is_closed());
        assert!(context.content_root().unwrap().resolve("a.txt").exists().unwrap());
    }

    #[test]
    fn test_archives_closed_before_temp_dirs_removed() {
        let temp = TempDir::new().unwrap();
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut manager = probe_manager(ProbeBackends {
            log: Rc::clone(&log),
            allocate_temp: true,
            ..Default::default()
        });

        drop(manager.open_archive(fixture(&temp, "a.apk")).unwrap());
        drop(manager.open_archive(fixture(&temp, "b.apk")).unwrap());
        let dirs = manager.temp_dirs();
        assert_eq!(dirs.len(), 2);

        let report = manager.close();

        assert!(report.is_clean());
        assert_eq!(report.archives_closed, 2);
        assert_eq!(report.temp_dirs_removed, 2);
        assert_eq!(
            *log.borrow(),
            vec![
                "close a.apk temp_exists=true".to_string(),
                "close b.apk temp_exists=true".to_string(),
            ]
        );
        assert!(dirs.iter().all(|dir| !dir.exists()));
        assert_eq!(manager.cached_archives(), 0);
        assert!(manager.temp_dirs().is_empty());
    }

    #[test]
    fn test_cleanup_continues_past_failures() {
        let temp = TempDir::new().unwrap();
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut manager = probe_manager(ProbeBackends {
            log: Rc::clone(&log),
            allocate_temp: true,
            fail_close_for: Some("a.apk"),
            ..Default::default()
        });

        drop(manager.open_archive(fixture(&temp, "a.apk")).unwrap());
        drop(manager.open_archive(fixture(&temp, "b.apk")).unwrap());
        let dirs = manager.temp_dirs();

        let report = manager.close();

        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].path.ends_with("a.apk"));
        assert_eq!(report.archives_closed, 1);
        assert_eq!(report.temp_dirs_removed, 2);
        assert_eq!(log.borrow().len(), 2);
        assert!(dirs.iter().all(|dir| !dir.exists()));
    }

    #[test]
    fn test_missing_temp_dir_is_not_a_failure() {
        let temp = TempDir::new().unwrap();
        let mut manager = probe_manager(ProbeBackends {
            allocate_temp: true,
            ..Default::default()
        });

        drop(manager.open_archive(fixture(&temp, "a.apk")).unwrap());
        for dir in manager.temp_dirs() {
            fs::remove_dir_all(dir).unwrap();
        }

        let report = manager.close();
        assert!(report.is_clean());
        assert_eq!(report.temp_dirs_removed, 1);
    }

    #[test]
    fn test_reopen_after_close_mounts_again() {
        let temp = TempDir::new().unwrap();
        let path = fixture(&temp, "app.apk");
        let opened = Rc::new(Cell::new(0));
        let mut manager = probe_manager(ProbeBackends {
            opened: Rc::clone(&opened),
            ..Default::default()
        });

        drop(manager.open_archive(&path).unwrap());
        manager.close();
        let context = manager.open_archive(&path).unwrap();

        assert_eq!(opened.get(), 2);
        assert!(!context.archive().is_closed());
        assert!(context.content_root().is_ok());
    }

    #[test]
    fn test_failed_open_leaves_no_cache_entry() {
        let temp = TempDir::new().unwrap();
        let corrupt = temp.path().join("broken.apk");
        fs::write(&corrupt, b"definitely not a zip").unwrap();
        let manager = ArchiveManager::new();

        let err = manager.open_archive(&corrupt).unwrap_err();
        assert!(matches!(err, ApkError::InvalidArchive { .. }));
        assert_eq!(manager.cached_archives(), 0);

        let err = manager.open_archive(temp.path().join("missing.apk")).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(manager.cached_archives(), 0);
    }

    #[test]
    fn test_unsupported_kinds_never_reach_backend() {
        let temp = TempDir::new().unwrap();
        let opened = Rc::new(Cell::new(0));
        let manager = probe_manager(ProbeBackends {
            opened: Rc::clone(&opened),
            ..Default::default()
        });

        for name in ["bundle.aab", "instant.zip", "INSTANT.ZIP"] {
            let err = manager.open_archive(fixture(&temp, name)).unwrap_err();
            assert!(err.is_unsupported(), "{name} should be unsupported");
        }
        assert_eq!(opened.get(), 0);
        assert_eq!(manager.cached_archives(), 0);
    }

    #[test]
    fn test_kind_follows_extension() {
        let temp = TempDir::new().unwrap();
        let manager = ArchiveManager::new();

        let apk = manager.open_archive(write_test_apk(temp.path(), "app.apk")).unwrap();
        assert_eq!(apk.archive().kind(), ArchiveKind::Apk);
        let jar = manager.open_archive(fixture(&temp, "lib.jar")).unwrap();
        assert_eq!(jar.archive().kind(), ArchiveKind::Zip);
        let other = manager.open_archive(fixture(&temp, "data.bin")).unwrap();
        assert_eq!(other.archive().kind(), ArchiveKind::Zip);
    }

    #[test]
    fn test_inner_archive_unpacked_and_removed() {
        let temp = TempDir::new().unwrap();
        let inner = fs::read(write_test_apk(temp.path(), "split.apk")).unwrap();
        let nested = fs::read(fixture(&temp, "nested.zip")).unwrap();
        let outer = write_test_zip(
            temp.path(),
            "bundle.jar",
            &[
                ("splits/split.apk", inner.as_slice()),
                ("libs/nested.zip", nested.as_slice()),
                ("notes.txt", b"not an archive".as_slice()),
            ],
        );
        let scratch = TempDir::new().unwrap();
        let mut manager = ArchiveManager::with_config(ManagerConfig {
            temp_root: Some(scratch.path().to_path_buf()),
            ..Default::default()
        });

        {
            let parent = manager.open_archive(&outer).unwrap();
            let split = manager.open_inner_archive(&parent, "splits/split.apk").unwrap();
            assert_eq!(split.archive().kind(), ArchiveKind::Apk);
            let root = split.content_root().unwrap();
            assert!(root.resolve("AndroidManifest.xml").exists().unwrap());

            let nested = manager.open_inner_archive(&parent, "/libs/nested.zip").unwrap();
            assert_eq!(nested.archive().kind(), ArchiveKind::Zip);

            let err = manager.open_inner_archive(&parent, "notes.txt").unwrap_err();
            assert!(err.is_unsupported());
            let err = manager.open_inner_archive(&parent, "missing.apk").unwrap_err();
            assert!(err.is_not_found());
        }

        let dirs = manager.temp_dirs();
        assert_eq!(dirs.len(), 2);
        assert!(dirs.iter().all(|dir| dir.starts_with(scratch.path())));

        let report = manager.close();
        assert!(report.is_clean());
        assert_eq!(report.archives_closed, 3);
        assert_eq!(report.temp_dirs_removed, 2);
        assert!(dirs.iter().all(|dir| !dir.exists()));
        assert_eq!(fs::read_dir(scratch.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_inner_archive_open_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let inner = fs::read(write_test_apk(temp.path(), "split.apk")).unwrap();
        let outer = write_test_zip(
            temp.path(),
            "bundle.jar",
            &[("splits/split.apk", inner.as_slice())],
        );
        let scratch = TempDir::new().unwrap();
        let mut manager = ArchiveManager::with_config(ManagerConfig {
            temp_root: Some(scratch.path().to_path_buf()),
            ..Default::default()
        });

        {
            let parent = manager.open_archive(&outer).unwrap();
            let first = manager.open_inner_archive(&parent, "splits/split.apk").unwrap();
            let second = manager.open_inner_archive(&parent, "/splits/./split.apk").unwrap();
            assert!(Rc::ptr_eq(first.shared(), second.shared()));
        }
        assert_eq!(manager.cached_archives(), 2);
        assert_eq!(manager.temp_dirs().len(), 1);
        assert_eq!(fs::read_dir(scratch.path()).unwrap().count(), 1);

        manager.close();
        let parent = manager.open_archive(&outer).unwrap();
        drop(manager.open_inner_archive(&parent, "splits/split.apk").unwrap());
        assert_eq!(manager.temp_dirs().len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_kind_follows_given_path_not_link_target() {
        let temp = TempDir::new().unwrap();
        let blob = fixture(&temp, "blob");
        let link = temp.path().join("app.apk");
        std::os::unix::fs::symlink(&blob, &link).unwrap();
        let manager = ArchiveManager::new();

        let context = manager.open_archive(&link).unwrap();
        assert_eq!(context.archive().kind(), ArchiveKind::Apk);
        assert_eq!(context.path(), fs::canonicalize(&blob).unwrap().as_path());
    }

    #[test]
    fn test_failed_inner_open_removes_its_temp_dir() {
        let temp = TempDir::new().unwrap();
        let outer = write_test_zip(
            temp.path(),
            "outer.jar",
            &[("broken.apk", b"not a zip".as_slice())],
        );
        let scratch = TempDir::new().unwrap();
        let manager = ArchiveManager::with_config(ManagerConfig {
            temp_root: Some(scratch.path().to_path_buf()),
            ..Default::default()
        });

        let parent = manager.open_archive(&outer).unwrap();
        let err = manager.open_inner_archive(&parent, "broken.apk").unwrap_err();
        assert!(matches!(err, ApkError::InvalidArchive { .. }));
        assert!(manager.temp_dirs().is_empty());
        assert_eq!(fs::read_dir(scratch.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_drop_closes_archives() {
        let temp = TempDir::new().unwrap();
        let log = Rc::new(RefCell::new(Vec::new()));
        let dirs;
        {
            let manager = probe_manager(ProbeBackends {
                log: Rc::clone(&log),
                allocate_temp: true,
                ..Default::default()
            });
            drop(manager.open_archive(fixture(&temp, "a.apk")).unwrap());
            dirs = manager.temp_dirs();
        }
        assert_eq!(log.borrow().len(), 1);
        assert!(dirs.iter().all(|dir| !dir.exists()));
    }
}
