//! Low-level chunk and string pool parsing for Android binary XML.

use crate::ApkError;
use crate::Result;

pub const RES_STRING_POOL_TYPE: u16 = 0x0001;
pub const RES_XML_START_NAMESPACE_TYPE: u16 = 0x0100;
pub const RES_XML_END_NAMESPACE_TYPE: u16 = 0x0101;
pub const RES_XML_START_ELEMENT_TYPE: u16 = 0x0102;
pub const RES_XML_END_ELEMENT_TYPE: u16 = 0x0103;
pub const RES_XML_CDATA_TYPE: u16 = 0x0104;
pub const RES_XML_RESOURCE_MAP_TYPE: u16 = 0x0180;

pub const NO_ENTRY: u32 = 0xFFFF_FFFF;
pub const STRING_FLAG_UTF8: u32 = 0x0000_0100;

/// Bounds-checked little-endian reads at absolute offsets.
#[derive(Clone, Copy)]
pub struct Bytes<'a> {
    data: &'a [u8],
}

impl<'a> Bytes<'a> {
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    pub const fn len(&self) -> usize {
        self.data.len()
    }

    pub fn u8_at(&self, offset: usize) -> Result<u8> {
        self.data.get(offset).copied().ok_or_else(|| truncated(offset))
    }

    pub fn u16_at(&self, offset: usize) -> Result<u16> {
        let end = offset.checked_add(2).ok_or_else(|| truncated(offset))?;
        match self.data.get(offset..end) {
            Some(&[a, b]) => Ok(u16::from_le_bytes([a, b])),
            _ => Err(truncated(offset)),
        }
    }

    pub fn u32_at(&self, offset: usize) -> Result<u32> {
        let end = offset.checked_add(4).ok_or_else(|| truncated(offset))?;
        match self.data.get(offset..end) {
            Some(&[a, b, c, d]) => Ok(u32::from_le_bytes([a, b, c, d])),
            _ => Err(truncated(offset)),
        }
    }

    pub fn slice(&self, offset: usize, len: usize) -> Result<&'a [u8]> {
        let end = offset.checked_add(len).ok_or_else(|| truncated(offset))?;
        self.data.get(offset..end).ok_or_else(|| truncated(offset))
    }
}

fn truncated(offset: usize) -> ApkError {
    ApkError::MalformedXml(format!("unexpected end of document at offset {offset}"))
}

/// `ResChunk_header`: type, header size, total size.
#[derive(Debug, Clone, Copy)]
pub struct ChunkHeader {
    pub chunk_type: u16,
    pub header_size: u16,
    pub start: usize,
    pub end: usize,
}

impl ChunkHeader {
    /// Reads the chunk header at `start`, checking that the chunk fits in
    /// `limit`.
    pub fn read(bytes: Bytes<'_>, start: usize, limit: usize) -> Result<Self> {
        let chunk_type = bytes.u16_at(start)?;
        let header_size = bytes.u16_at(start + 2)?;
        let chunk_size = bytes.u32_at(start + 4)? as usize;

        if chunk_size < usize::from(header_size) || header_size < 8 {
            return Err(ApkError::MalformedXml(format!(
                "invalid chunk sizes at offset {start}: header {header_size}, chunk {chunk_size}"
            )));
        }
        let end = start
            .checked_add(chunk_size)
            .filter(|end| *end <= limit)
            .ok_or_else(|| {
                ApkError::MalformedXml(format!("chunk at offset {start} extends past its parent"))
            })?;

        Ok(Self {
            chunk_type,
            header_size,
            start,
            end,
        })
    }

    /// Offset of the first byte after the header.
    pub fn body(&self) -> usize {
        self.start + usize::from(self.header_size)
    }
}

/// Decoded `ResStringPool`.
#[derive(Debug, Default)]
pub struct StringPool {
    strings: Vec<String>,
}

impl StringPool {
    pub fn parse(bytes: Bytes<'_>, header: &ChunkHeader) -> Result<Self> {
        let string_count = bytes.u32_at(header.start + 8)? as usize;
        let flags = bytes.u32_at(header.start + 16)?;
        let strings_start = bytes.u32_at(header.start + 20)? as usize;
        let utf8 = flags & STRING_FLAG_UTF8 != 0;

        let offsets_at = header.body();
        let strings_base = header.start + strings_start;
        // every offset takes 4 bytes, which bounds a sane count
        if string_count > (header.end - header.start) / 4 {
            return Err(ApkError::MalformedXml(format!(
                "string pool claims {string_count} strings in {} bytes",
                header.end - header.start
            )));
        }

        let limit = Bytes::new(bytes.slice(0, header.end)?);
        let mut strings = Vec::with_capacity(string_count);
        for i in 0..string_count {
            let offset = strings_base + bytes.u32_at(offsets_at + i * 4)? as usize;
            let text = if utf8 {
                read_utf8(limit, offset)?
            } else {
                read_utf16(limit, offset)?
            };
            strings.push(text);
        }

        Ok(Self { strings })
    }

    /// Looks up an index, treating `0xFFFFFFFF` as "no string".
    pub fn get(&self, index: u32) -> Option<&str> {
        if index == NO_ENTRY {
            return None;
        }
        self.strings.get(index as usize).map(String::as_str)
    }

    /// Like [`get`](Self::get) but an out-of-range index is an error.
    pub fn require(&self, index: u32) -> Result<&str> {
        self.get(index).ok_or_else(|| {
            ApkError::MalformedXml(format!("string index {index} is outside the string pool"))
        })
    }
}

fn read_utf8(bytes: Bytes<'_>, offset: usize) -> Result<String> {
    // character count, then byte count, each one or two bytes
    let (_, skip) = read_utf8_length(bytes, offset)?;
    let (len, skip2) = read_utf8_length(bytes, offset + skip)?;
    let raw = bytes.slice(offset + skip + skip2, len)?;
    Ok(String::from_utf8_lossy(raw).into_owned())
}

fn read_utf8_length(bytes: Bytes<'_>, offset: usize) -> Result<(usize, usize)> {
    let first = bytes.u8_at(offset)?;
    if first & 0x80 == 0 {
        Ok((usize::from(first), 1))
    } else {
        let second = bytes.u8_at(offset + 1)?;
        Ok(((usize::from(first & 0x7F) << 8) | usize::from(second), 2))
    }
}

fn read_utf16(bytes: Bytes<'_>, offset: usize) -> Result<String> {
    let first = bytes.u16_at(offset)?;
    let (len, skip) = if first & 0x8000 == 0 {
        (usize::from(first), 2)
    } else {
        let second = bytes.u16_at(offset + 2)?;
        ((usize::from(first & 0x7FFF) << 16) | usize::from(second), 4)
    };
    let raw = bytes.slice(offset + skip, len.checked_mul(2).ok_or_else(|| truncated(offset))?)?;
    let units: Vec<u16> = raw
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    Ok(String::from_utf16_lossy(&units))
}
