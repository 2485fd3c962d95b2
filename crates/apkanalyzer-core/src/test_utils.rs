//! Test utilities for building zip fixtures and binary XML documents.
//!
//! # Panics
//!
//! All functions in this module may panic on I/O errors since they are
//! designed for test use only where panics are acceptable.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use zip::write::SimpleFileOptions;
use zip::write::ZipWriter;

use crate::xml::ANDROID_NAMESPACE_URI;

/// Writes a zip archive named `name` into `dir` and returns its path.
///
/// Each entry is a tuple of (path, content). A path ending in `/` becomes
/// an explicit directory entry.
///
/// # Examples
///
/// ```
/// use apkanalyzer_core::test_utils::write_test_zip;
///
/// let temp = tempfile::TempDir::new().unwrap();
/// let path = write_test_zip(temp.path(), "lib.jar", &[("a.txt", b"hello".as_slice())]);
/// assert!(path.exists());
/// ```
pub fn write_test_zip(dir: &Path, name: &str, entries: &[(&str, &[u8])]) -> PathBuf {
    let path = dir.join(name);
    let mut zip = ZipWriter::new(File::create(&path).unwrap());

    let options = SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .unix_permissions(0o644);

    for (entry, data) in entries {
        if entry.ends_with('/') {
            zip.add_directory(*entry, options).unwrap();
        } else {
            zip.start_file(*entry, options).unwrap();
            zip.write_all(data).unwrap();
        }
    }

    zip.finish().unwrap();
    path
}

/// Writes a small but complete APK into `dir` and returns its path.
///
/// The manifest declares `com.example`, version code 7, version name
/// `1.0`, `minSdkVersion` 21 and `targetSdkVersion` 33. The archive also
/// carries a compiled layout, a raw asset and a dex stub.
pub fn write_test_apk(dir: &Path, name: &str) -> PathBuf {
    let manifest = BinaryXmlBuilder::manifest("com.example", 7, "1.0")
        .child("uses-sdk")
        .android_int("minSdkVersion", 21)
        .android_int("targetSdkVersion", 33)
        .end()
        .child("application")
        .android_string("label", "Example")
        .end()
        .build();
    let layout = BinaryXmlBuilder::new("LinearLayout")
        .android_string("orientation", "vertical")
        .child("TextView")
        .reference("text", 0x7f0b_0001)
        .end()
        .build();

    write_test_zip(
        dir,
        name,
        &[
            ("AndroidManifest.xml", manifest.as_slice()),
            ("res/layout/main.xml", layout.as_slice()),
            ("assets/readme.txt", b"hello apk\n".as_slice()),
            ("classes.dex", b"dex\n035\0".as_slice()),
        ],
    )
}

const RES_XML_TYPE: u16 = 0x0003;
const RES_STRING_POOL_TYPE: u16 = 0x0001;
const RES_XML_START_NAMESPACE_TYPE: u16 = 0x0100;
const RES_XML_END_NAMESPACE_TYPE: u16 = 0x0101;
const RES_XML_START_ELEMENT_TYPE: u16 = 0x0102;
const RES_XML_END_ELEMENT_TYPE: u16 = 0x0103;
const RES_XML_CDATA_TYPE: u16 = 0x0104;
const NO_ENTRY: u32 = 0xFFFF_FFFF;

const TYPE_REFERENCE: u8 = 0x01;
const TYPE_STRING: u8 = 0x03;
const TYPE_INT_DEC: u8 = 0x10;
const TYPE_INT_HEX: u8 = 0x11;
const TYPE_INT_BOOLEAN: u8 = 0x12;

#[derive(Debug)]
struct Attribute {
    android: bool,
    name: String,
    raw: Option<String>,
    data_type: u8,
    data: u32,
}

#[derive(Debug)]
enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug)]
struct Element {
    name: String,
    attributes: Vec<Attribute>,
    children: Vec<Node>,
}

impl Element {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }
}

/// Builder for compiled (aapt-style) binary XML documents.
///
/// The root element always declares the `android` namespace. Attribute
/// methods apply to the innermost open element; [`child`](Self::child)
/// opens a nested element and [`end`](Self::end) closes it.
///
/// # Examples
///
/// ```
/// use apkanalyzer_core::test_utils::BinaryXmlBuilder;
/// use apkanalyzer_core::xml::is_binary_xml;
///
/// let bytes = BinaryXmlBuilder::manifest("com.example", 7, "1.0")
///     .child("uses-sdk")
///     .android_int("minSdkVersion", 21)
///     .end()
///     .build();
/// assert!(is_binary_xml(&bytes));
/// ```
#[derive(Debug)]
pub struct BinaryXmlBuilder {
    open: Vec<Element>,
}

impl BinaryXmlBuilder {
    /// Starts a document whose root element is `root`.
    #[must_use]
    pub fn new(root: &str) -> Self {
        Self {
            open: vec![Element::new(root)],
        }
    }

    /// Starts a `<manifest>` carrying package, version code and version name.
    #[must_use]
    pub fn manifest(package: &str, version_code: i32, version_name: &str) -> Self {
        Self::new("manifest")
            .attr("package", package)
            .android_int("versionCode", version_code)
            .android_string("versionName", version_name)
    }

    /// Opens a nested element.
    #[must_use]
    pub fn child(mut self, name: &str) -> Self {
        self.open.push(Element::new(name));
        self
    }

    /// Closes the innermost nested element. The root is closed by [`build`](Self::build).
    #[must_use]
    pub fn end(mut self) -> Self {
        if self.open.len() > 1 {
            let element = self.open.pop().unwrap();
            self.current().children.push(Node::Element(element));
        }
        self
    }

    /// Adds text content to the innermost element.
    #[must_use]
    pub fn text(mut self, text: &str) -> Self {
        self.current().children.push(Node::Text(text.to_string()));
        self
    }

    /// Adds an attribute without a namespace, stored as a raw string.
    #[must_use]
    pub fn attr(self, name: &str, value: &str) -> Self {
        self.push(false, name, Some(value), TYPE_STRING, 0)
    }

    /// Adds an `android:` string attribute.
    #[must_use]
    pub fn android_string(self, name: &str, value: &str) -> Self {
        self.push(true, name, Some(value), TYPE_STRING, 0)
    }

    /// Adds an `android:` decimal integer attribute.
    #[must_use]
    pub fn android_int(self, name: &str, value: i32) -> Self {
        self.push(true, name, None, TYPE_INT_DEC, value as u32)
    }

    /// Adds an `android:` boolean attribute.
    #[must_use]
    pub fn android_bool(self, name: &str, value: bool) -> Self {
        let data = if value { NO_ENTRY } else { 0 };
        self.push(true, name, None, TYPE_INT_BOOLEAN, data)
    }

    /// Adds an `android:` resource reference attribute.
    #[must_use]
    pub fn reference(self, name: &str, id: u32) -> Self {
        self.push(true, name, None, TYPE_REFERENCE, id)
    }

    /// Adds an `android:` hexadecimal integer attribute.
    #[must_use]
    pub fn hex(self, name: &str, value: u32) -> Self {
        self.push(true, name, None, TYPE_INT_HEX, value)
    }

    fn push(
        mut self,
        android: bool,
        name: &str,
        raw: Option<&str>,
        data_type: u8,
        data: u32,
    ) -> Self {
        self.current().attributes.push(Attribute {
            android,
            name: name.to_string(),
            raw: raw.map(str::to_string),
            data_type,
            data,
        });
        self
    }

    fn current(&mut self) -> &mut Element {
        self.open.last_mut().unwrap()
    }

    /// Closes every open element and encodes the document.
    #[must_use]
    pub fn build(mut self) -> Vec<u8> {
        while self.open.len() > 1 {
            self = self.end();
        }
        let root = self.open.pop().unwrap();

        let mut pool = Pool::default();
        let prefix = pool.intern("android");
        let uri = pool.intern(ANDROID_NAMESPACE_URI);

        let mut body = Vec::new();
        namespace_chunk(&mut body, RES_XML_START_NAMESPACE_TYPE, prefix, uri);
        encode_element(&mut body, &mut pool, &root, uri);
        namespace_chunk(&mut body, RES_XML_END_NAMESPACE_TYPE, prefix, uri);

        let strings = pool.encode();
        let mut out = Vec::new();
        chunk_header(&mut out, RES_XML_TYPE, 8, 8 + strings.len() + body.len());
        out.extend_from_slice(&strings);
        out.extend_from_slice(&body);
        out
    }
}

#[derive(Default)]
struct Pool {
    strings: Vec<String>,
}

impl Pool {
    fn intern(&mut self, value: &str) -> u32 {
        if let Some(i) = self.strings.iter().position(|s| s == value) {
            return i as u32;
        }
        self.strings.push(value.to_string());
        (self.strings.len() - 1) as u32
    }

    /// UTF-16 `ResStringPool` chunk.
    fn encode(&self) -> Vec<u8> {
        let header_size = 28;
        let mut data = Vec::new();
        let mut offsets = Vec::new();
        for s in &self.strings {
            offsets.push(data.len() as u32);
            let units: Vec<u16> = s.encode_utf16().collect();
            data.extend_from_slice(&(units.len() as u16).to_le_bytes());
            for unit in units {
                data.extend_from_slice(&unit.to_le_bytes());
            }
            data.extend_from_slice(&[0, 0]);
        }
        while data.len() % 4 != 0 {
            data.push(0);
        }

        let strings_start = header_size + offsets.len() * 4;
        let mut out = Vec::new();
        chunk_header(
            &mut out,
            RES_STRING_POOL_TYPE,
            header_size as u16,
            strings_start + data.len(),
        );
        put_u32(&mut out, self.strings.len() as u32);
        put_u32(&mut out, 0); // style count
        put_u32(&mut out, 0); // flags: UTF-16
        put_u32(&mut out, strings_start as u32);
        put_u32(&mut out, 0); // styles start
        for offset in offsets {
            put_u32(&mut out, offset);
        }
        out.extend_from_slice(&data);
        out
    }
}

fn encode_element(out: &mut Vec<u8>, pool: &mut Pool, element: &Element, android_uri: u32) {
    let name = pool.intern(&element.name);
    let attribute_count = element.attributes.len();

    node_header(out, RES_XML_START_ELEMENT_TYPE, 16 + 20 + 20 * attribute_count);
    put_u32(out, NO_ENTRY);
    put_u32(out, name);
    put_u16(out, 20); // attribute start
    put_u16(out, 20); // attribute size
    put_u16(out, attribute_count as u16);
    put_u16(out, 0); // id index
    put_u16(out, 0); // class index
    put_u16(out, 0); // style index

    for attribute in &element.attributes {
        let namespace = if attribute.android {
            android_uri
        } else {
            NO_ENTRY
        };
        let attribute_name = pool.intern(&attribute.name);
        let (raw, data) = match &attribute.raw {
            Some(raw) => {
                let index = pool.intern(raw);
                (index, index)
            }
            None => (NO_ENTRY, attribute.data),
        };
        put_u32(out, namespace);
        put_u32(out, attribute_name);
        put_u32(out, raw);
        put_u16(out, 8);
        out.push(0);
        out.push(attribute.data_type);
        put_u32(out, data);
    }

    for child in &element.children {
        match child {
            Node::Element(child) => encode_element(out, pool, child, android_uri),
            Node::Text(text) => {
                let index = pool.intern(text);
                node_header(out, RES_XML_CDATA_TYPE, 28);
                put_u32(out, index);
                put_u16(out, 8);
                out.push(0);
                out.push(TYPE_STRING);
                put_u32(out, index);
            }
        }
    }

    node_header(out, RES_XML_END_ELEMENT_TYPE, 24);
    put_u32(out, NO_ENTRY);
    put_u32(out, name);
}

fn namespace_chunk(out: &mut Vec<u8>, chunk_type: u16, prefix: u32, uri: u32) {
    node_header(out, chunk_type, 24);
    put_u32(out, prefix);
    put_u32(out, uri);
}

/// `ResXMLTree_node`: chunk header, line number, comment.
fn node_header(out: &mut Vec<u8>, chunk_type: u16, size: usize) {
    chunk_header(out, chunk_type, 16, size);
    put_u32(out, 1);
    put_u32(out, NO_ENTRY);
}

fn chunk_header(out: &mut Vec<u8>, chunk_type: u16, header_size: u16, size: usize) {
    put_u16(out, chunk_type);
    put_u16(out, header_size);
    put_u32(out, size as u32);
}

fn put_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn put_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::is_binary_xml;

    #[test]
    fn test_builder_sizes_are_consistent() {
        let bytes = BinaryXmlBuilder::manifest("com.example", 7, "1.0")
            .child("uses-sdk")
            .android_int("minSdkVersion", 21)
            .build();
        assert!(is_binary_xml(&bytes));
        let declared = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        assert_eq!(declared as usize, bytes.len());
    }

    #[test]
    fn test_write_test_zip_directory_entry() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = write_test_zip(
            temp.path(),
            "dirs.zip",
            &[("empty/", b"".as_slice()), ("a.txt", b"a".as_slice())],
        );
        let archive = zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
        assert_eq!(archive.len(), 2);
    }
}
