//! Android application package backend.

use std::path::Path;

use super::Archive;
use super::ArchiveKind;
use super::EntryPath;
use super::ZipArchive;
use crate::Result;
use crate::xml;

/// Manifest location at the root of every APK.
pub const ANDROID_MANIFEST_XML: &str = "AndroidManifest.xml";

/// Compiled resource table at the root of every APK.
pub const RESOURCES_ARSC: &str = "resources.arsc";

/// Leading bytes of a compiled resource table (`RES_TABLE_TYPE`, header size 12).
pub const RESOURCE_TABLE_MAGIC: [u8; 4] = [0x02, 0x00, 0x0C, 0x00];

/// Leading bytes of a dex file.
pub const DEX_MAGIC: [u8; 4] = *b"dex\n";

/// An APK mounted like any zip, with Android-specific binary detection.
#[derive(Debug)]
pub struct ApkArchive {
    inner: ZipArchive,
}

impl ApkArchive {
    /// Mounts the APK at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self {
            inner: ZipArchive::open(path)?,
        })
    }
}

impl Archive for ApkArchive {
    fn path(&self) -> &Path {
        self.inner.path()
    }

    fn kind(&self) -> ArchiveKind {
        ArchiveKind::Apk
    }

    fn content_root(&self) -> Result<EntryPath<'_>> {
        self.inner.mount().root()
    }

    /// The manifest and `.xml` files under `res/` are compiled by aapt; any
    /// of them whose bytes carry the binary XML header is binary XML. Raw
    /// XML elsewhere (or left uncompiled under `res/raw`) is not.
    fn is_binary_xml(&self, entry: &EntryPath<'_>, bytes: &[u8]) -> Result<bool> {
        self.inner.ensure_open()?;
        let name = entry.as_str();
        let compiled_location =
            name == ANDROID_MANIFEST_XML || (name.starts_with("res/") && has_extension(name, "xml"));
        Ok(compiled_location && xml::is_binary_xml(bytes))
    }

    fn is_binary_format(&self, entry: &EntryPath<'_>, bytes: &[u8]) -> Result<bool> {
        if self.is_binary_xml(entry, bytes)? {
            return Ok(true);
        }
        let name = entry.as_str();
        Ok((name == RESOURCES_ARSC && bytes.starts_with(&RESOURCE_TABLE_MAGIC))
            || (has_extension(name, "dex") && bytes.starts_with(&DEX_MAGIC)))
    }

    fn close(&self) -> Result<()> {
        self.inner.close()
    }

    fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }
}

fn has_extension(name: &str, extension: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(extension))
}
