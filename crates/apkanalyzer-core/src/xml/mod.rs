//! Android binary XML decoding.
//!
//! aapt compiles `AndroidManifest.xml` and the XML resources under `res/`
//! into a chunked binary format: a string pool followed by namespace,
//! element and text nodes whose names and values index into that pool.
//! [`decode_xml`] walks those chunks and re-emits indented textual XML.
//!
//! # Examples
//!
//! ```no_run
//! use apkanalyzer_core::xml::decode_xml;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let bytes = std::fs::read("AndroidManifest.xml")?;
//! let text = decode_xml("AndroidManifest.xml", &bytes)?;
//! print!("{}", String::from_utf8_lossy(&text));
//! # Ok(())
//! # }
//! ```

pub(crate) mod chunk;
mod value;

use quick_xml::Writer;
use quick_xml::events::BytesDecl;
use quick_xml::events::BytesEnd;
use quick_xml::events::BytesStart;
use quick_xml::events::BytesText;
use quick_xml::events::Event;
use tracing::trace;

use crate::ApkError;
use crate::Result;
use chunk::Bytes;
use chunk::ChunkHeader;
use chunk::StringPool;

pub use value::TypedValue;

/// Leading bytes of every binary XML document (`RES_XML_TYPE`, header size 8).
pub const BINARY_XML_MAGIC: [u8; 4] = [0x03, 0x00, 0x08, 0x00];

/// Namespace URI bound to the `android` prefix in manifests and resources.
pub const ANDROID_NAMESPACE_URI: &str = "http://schemas.android.com/apk/res/android";

/// Returns `true` if `bytes` start with the binary XML header.
pub fn is_binary_xml(bytes: &[u8]) -> bool {
    bytes.starts_with(&BINARY_XML_MAGIC)
}

/// Decodes a binary XML document into UTF-8 textual XML.
///
/// `name` is only used for error messages.
///
/// # Errors
///
/// [`ApkError::NotBinaryXml`] if the bytes lack the binary XML header,
/// [`ApkError::MalformedXml`] if the document is truncated or inconsistent.
pub fn decode_xml(name: &str, bytes: &[u8]) -> Result<Vec<u8>> {
    if !is_binary_xml(bytes) {
        return Err(ApkError::NotBinaryXml {
            name: name.to_string(),
        });
    }

    let data = Bytes::new(bytes);
    let root = ChunkHeader::read(data, 0, data.len())?;
    let mut decoder = Decoder::new();

    let mut offset = root.body();
    while offset + 8 <= root.end {
        let chunk = ChunkHeader::read(data, offset, root.end)?;
        decoder.chunk(data, &chunk)?;
        offset = chunk.end;
    }

    let mut out = decoder.finish()?;
    out.push(b'\n');
    trace!(name, input = bytes.len(), output = out.len(), "decoded binary XML");
    Ok(out)
}

struct Namespace {
    prefix: String,
    uri: String,
}

struct Decoder {
    writer: Writer<Vec<u8>>,
    pool: StringPool,
    namespaces: Vec<Namespace>,
    pending_declarations: Vec<(String, String)>,
    pending_start: Option<BytesStart<'static>>,
    depth: usize,
}

impl Decoder {
    fn new() -> Self {
        Self {
            writer: Writer::new_with_indent(Vec::new(), b' ', 4),
            pool: StringPool::default(),
            namespaces: Vec::new(),
            pending_declarations: Vec::new(),
            pending_start: None,
            depth: 0,
        }
    }

    fn chunk(&mut self, data: Bytes<'_>, chunk: &ChunkHeader) -> Result<()> {
        match chunk.chunk_type {
            chunk::RES_STRING_POOL_TYPE => {
                self.pool = StringPool::parse(data, chunk)?;
                if self.depth == 0 && self.pending_start.is_none() {
                    self.write(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
                }
            }
            chunk::RES_XML_START_NAMESPACE_TYPE => {
                let body = chunk.body();
                let prefix = self.pool.get(data.u32_at(body)?).unwrap_or_default();
                let uri = self.pool.require(data.u32_at(body + 4)?)?;
                self.namespaces.push(Namespace {
                    prefix: prefix.to_string(),
                    uri: uri.to_string(),
                });
                self.pending_declarations
                    .push((prefix.to_string(), uri.to_string()));
            }
            chunk::RES_XML_END_NAMESPACE_TYPE => {
                self.namespaces.pop();
            }
            chunk::RES_XML_START_ELEMENT_TYPE => self.start_element(data, chunk)?,
            chunk::RES_XML_END_ELEMENT_TYPE => self.end_element(data, chunk)?,
            chunk::RES_XML_CDATA_TYPE => {
                let text = self.pool.require(data.u32_at(chunk.body())?)?.to_string();
                self.flush_start()?;
                self.write(Event::Text(BytesText::new(&text)))?;
            }
            chunk::RES_XML_RESOURCE_MAP_TYPE => {}
            other => trace!(chunk_type = other, "skipping binary XML chunk"),
        }
        Ok(())
    }

    fn start_element(&mut self, data: Bytes<'_>, chunk: &ChunkHeader) -> Result<()> {
        self.flush_start()?;

        let ext = chunk.body();
        let name = self.qualified_name(data.u32_at(ext)?, data.u32_at(ext + 4)?)?;
        let attribute_start = usize::from(data.u16_at(ext + 8)?);
        let attribute_size = usize::from(data.u16_at(ext + 10)?);
        let attribute_count = usize::from(data.u16_at(ext + 12)?);

        let mut start = BytesStart::new(name);
        for (prefix, uri) in self.pending_declarations.drain(..) {
            let key = if prefix.is_empty() {
                "xmlns".to_string()
            } else {
                format!("xmlns:{prefix}")
            };
            start.push_attribute((key.as_str(), uri.as_str()));
        }

        for i in 0..attribute_count {
            let at = ext + attribute_start + i * attribute_size;
            if at + 20 > chunk.end {
                return Err(ApkError::MalformedXml(format!(
                    "attribute {i} runs past its element chunk"
                )));
            }
            let key = self.qualified_name(data.u32_at(at)?, data.u32_at(at + 4)?)?;
            let raw = data.u32_at(at + 8)?;
            let value = match self.pool.get(raw) {
                Some(raw) => raw.to_string(),
                None => {
                    TypedValue::new(data.u8_at(at + 15)?, data.u32_at(at + 16)?)
                        .render(&self.pool)?
                }
            };
            start.push_attribute((key.as_str(), value.as_str()));
        }

        self.pending_start = Some(start);
        self.depth += 1;
        Ok(())
    }

    fn end_element(&mut self, data: Bytes<'_>, chunk: &ChunkHeader) -> Result<()> {
        if self.depth == 0 {
            return Err(ApkError::MalformedXml(
                "end element without a matching start".to_string(),
            ));
        }
        self.depth -= 1;

        let body = chunk.body();
        let name = self.qualified_name(data.u32_at(body)?, data.u32_at(body + 4)?)?;
        match self.pending_start.take() {
            Some(start) => self.write(Event::Empty(start)),
            None => self.write(Event::End(BytesEnd::new(name))),
        }
    }

    fn qualified_name(&self, namespace: u32, name: u32) -> Result<String> {
        let local = self.pool.require(name)?;
        let prefix = self.pool.get(namespace).and_then(|uri| {
            self.namespaces
                .iter()
                .rev()
                .find(|ns| ns.uri == uri)
                .map(|ns| ns.prefix.as_str())
        });
        Ok(match prefix {
            Some(prefix) if !prefix.is_empty() => format!("{prefix}:{local}"),
            _ => local.to_string(),
        })
    }

    fn flush_start(&mut self) -> Result<()> {
        if let Some(start) = self.pending_start.take() {
            self.write(Event::Start(start))?;
        }
        Ok(())
    }

    fn write(&mut self, event: Event<'_>) -> Result<()> {
        self.writer
            .write_event(event)
            .map_err(|e| ApkError::MalformedXml(format!("failed to write XML: {e}")))
    }

    fn finish(mut self) -> Result<Vec<u8>> {
        if self.depth != 0 {
            return Err(ApkError::MalformedXml(format!(
                "document ended with {} unclosed element(s)",
                self.depth
            )));
        }
        self.flush_start()?;
        Ok(self.writer.into_inner())
    }
}
