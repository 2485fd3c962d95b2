//! Inspection operations behind the command-line actions.
//!
//! Every operation opens the archive through the shared
//! [`ArchiveManager`], builds its complete output in memory and only then
//! writes it, so a failing operation never leaves partial output behind.

use std::fmt::Write as _;
use std::io::Write;
use std::path::Path;

use tracing::debug;

use crate::ApkError;
use crate::ArchiveManager;
use crate::ManifestData;
use crate::Result;
use crate::archive::apk::ANDROID_MANIFEST_XML;
use crate::xml::decode_xml;

/// Placeholder printed for manifest values that are not declared.
pub const UNKNOWN: &str = "UNKNOWN";

/// Runs inspection operations and writes their results to `out`.
///
/// # Examples
///
/// ```no_run
/// use apkanalyzer_core::ApkAnalyzer;
/// use apkanalyzer_core::ArchiveManager;
/// use std::path::Path;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let manager = ArchiveManager::new();
/// let mut out = Vec::new();
/// ApkAnalyzer::new(&manager, &mut out).apk_summary(Path::new("app.apk"))?;
/// assert!(String::from_utf8(out)?.ends_with('\n'));
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ApkAnalyzer<'m, W: Write> {
    manager: &'m ArchiveManager,
    out: W,
}

impl<'m, W: Write> ApkAnalyzer<'m, W> {
    /// Creates an analyzer opening archives through `manager`.
    pub fn new(manager: &'m ArchiveManager, out: W) -> Self {
        Self { manager, out }
    }

    /// Returns the output writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Prints `application id<TAB>version code<TAB>version name`.
    pub fn apk_summary(&mut self, apk: &Path) -> Result<()> {
        let manifest = self.manifest_data(apk)?;
        let line = format!(
            "{}\t{}\t{}\n",
            display_or_unknown(manifest.package.as_ref()),
            display_or_unknown(manifest.version_code.as_ref()),
            display_or_unknown(manifest.version_name.as_ref()),
        );
        self.emit(line.as_bytes())
    }

    /// Prints the decoded manifest.
    pub fn manifest_print(&mut self, apk: &Path) -> Result<()> {
        let xml = self.decoded_manifest(apk)?;
        self.emit(&xml)
    }

    /// Prints the application id (manifest package).
    pub fn manifest_app_id(&mut self, apk: &Path) -> Result<()> {
        let manifest = self.manifest_data(apk)?;
        self.emit_line(display_or_unknown(manifest.package.as_ref()))
    }

    /// Prints the version name.
    pub fn manifest_version_name(&mut self, apk: &Path) -> Result<()> {
        let manifest = self.manifest_data(apk)?;
        self.emit_line(display_or_unknown(manifest.version_name.as_ref()))
    }

    /// Prints the version code.
    pub fn manifest_version_code(&mut self, apk: &Path) -> Result<()> {
        let manifest = self.manifest_data(apk)?;
        self.emit_line(display_or_unknown(manifest.version_code.as_ref()))
    }

    /// Prints the minimum SDK: an API level, or a preview codename.
    pub fn manifest_min_sdk(&mut self, apk: &Path) -> Result<()> {
        let manifest = self.manifest_data(apk)?;
        self.emit_line(manifest.min_sdk_version().to_string())
    }

    /// Prints the target SDK, which defaults to the minimum SDK.
    pub fn manifest_target_sdk(&mut self, apk: &Path) -> Result<()> {
        let manifest = self.manifest_data(apk)?;
        self.emit_line(manifest.target_sdk_version().to_string())
    }

    /// Prints `true` or `false`.
    pub fn manifest_debuggable(&mut self, apk: &Path) -> Result<()> {
        let manifest = self.manifest_data(apk)?;
        self.emit_line(manifest.is_debuggable().to_string())
    }

    /// Prints a compiled XML resource in textual form.
    ///
    /// # Errors
    ///
    /// [`ApkError::NotBinaryResource`] if the archive does not consider the
    /// entry binary XML.
    pub fn res_xml(&mut self, apk: &Path, file: &str) -> Result<()> {
        let xml = {
            let context = self.manager.open_archive(apk)?;
            let root = context.content_root()?;
            let entry = root.resolve(file);
            let bytes = entry.read_bytes()?;
            if !context.archive().is_binary_xml(&entry, &bytes)? {
                return Err(ApkError::NotBinaryResource {
                    entry: entry.as_str().to_string(),
                });
            }
            decode_xml(entry.file_name(), &bytes)?
        };
        self.emit(&xml)
    }

    /// Lists every file and directory, `/`-prefixed, directories with a
    /// trailing `/`.
    pub fn files_list(&mut self, apk: &Path) -> Result<()> {
        let listing = {
            let context = self.manager.open_archive(apk)?;
            let root = context.content_root()?;
            let mut listing = String::from("/\n");
            for node in root.walk()? {
                let suffix = if node.is_dir()? { "/" } else { "" };
                // writing into a String cannot fail
                let _ = writeln!(listing, "{node}{suffix}");
            }
            listing
        };
        self.emit(listing.as_bytes())
    }

    /// Prints the raw bytes of an entry.
    pub fn files_cat(&mut self, apk: &Path, file: &str) -> Result<()> {
        let bytes = {
            let context = self.manager.open_archive(apk)?;
            let root = context.content_root()?;
            root.resolve(file).read_bytes()?
        };
        self.emit(&bytes)
    }

    fn decoded_manifest(&self, apk: &Path) -> Result<Vec<u8>> {
        let context = self.manager.open_archive(apk)?;
        let root = context.content_root()?;
        let bytes = root.resolve(ANDROID_MANIFEST_XML).read_bytes()?;
        debug!(path = %context.path().display(), bytes = bytes.len(), "read manifest");
        decode_xml(ANDROID_MANIFEST_XML, &bytes)
    }

    fn manifest_data(&self, apk: &Path) -> Result<ManifestData> {
        ManifestData::parse(&self.decoded_manifest(apk)?)
    }

    fn emit_line(&mut self, value: impl AsRef<str>) -> Result<()> {
        let line = format!("{}\n", value.as_ref());
        self.emit(line.as_bytes())
    }

    fn emit(&mut self, bytes: &[u8]) -> Result<()> {
        self.out.write_all(bytes).map_err(ApkError::Output)?;
        self.out.flush().map_err(ApkError::Output)
    }
}

fn display_or_unknown<T: ToString>(value: Option<&T>) -> String {
    value.map_or_else(|| UNKNOWN.to_string(), ToString::to_string)
}
