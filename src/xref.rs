//! The cross-reference subsystem: locating the trailer, parsing classical
//! xref tables and xref streams, merging incremental updates, and resolving
//! indirect references (including objects stored inside object streams).

use log::debug;

use crate::errors::PdfError;
use crate::filters::{decode_stream, decoded_bytes};
use crate::object::{Dictionary, Object};
use crate::parser::ObjectParser;

const STARTXREF: &[u8] = b"startxref";

/// One cross-reference entry.
///
/// Exactly one of `byte_offset` or the `(parent_stream_object_number,
/// index_in_parent_stream)` pair is populated for a usable entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XrefEntry {
    pub object_number: u32,
    pub generation: u16,
    pub byte_offset: Option<u64>,
    pub parent_stream_object_number: Option<u32>,
    pub index_in_parent_stream: Option<usize>,
    pub is_in_use: bool,
}

impl XrefEntry {
    pub fn free(object_number: u32, generation: u16) -> Self {
        XrefEntry {
            object_number,
            generation,
            byte_offset: None,
            parent_stream_object_number: None,
            index_in_parent_stream: None,
            is_in_use: false,
        }
    }

    pub fn in_use(object_number: u32, generation: u16, byte_offset: u64) -> Self {
        XrefEntry {
            object_number,
            generation,
            byte_offset: Some(byte_offset),
            parent_stream_object_number: None,
            index_in_parent_stream: None,
            is_in_use: true,
        }
    }

    pub fn compressed(object_number: u32, parent: u32, index: usize) -> Self {
        XrefEntry {
            object_number,
            generation: 0,
            byte_offset: None,
            parent_stream_object_number: Some(parent),
            index_in_parent_stream: Some(index),
            is_in_use: true,
        }
    }
}

/// The merged cross-reference table of a document.
#[derive(Debug, Clone, Default)]
pub struct XRef {
    pub entries: Vec<XrefEntry>,
    pub trailer: Dictionary,
}

impl XRef {
    /// Load the cross-reference of a whole file: locate the last `startxref`,
    /// parse the section it points at, then follow the `Prev` chain, merging
    /// older sections underneath the newer ones.
    pub fn read(parser: &mut ObjectParser) -> Result<XRef, PdfError> {
        seek_to_xref_token(parser)?;
        let mut xref = read_section(parser)?;

        let mut visited_offsets = vec![];
        loop {
            let prev = match xref.trailer.get_i64("Prev") {
                Some(p) if p >= 0 => p as usize,
                _ => break,
            };
            if visited_offsets.contains(&prev) {
                break; // corrupt Prev loop
            }
            visited_offsets.push(prev);
            // remove so an older trailer's own Prev drives the next round
            xref.trailer.remove("Prev");

            parser.seek(prev);
            let older = read_section(parser)?;
            for (key, value) in older.trailer.iter() {
                if !xref.trailer.contains_key(key.as_str().as_ref()) {
                    xref.trailer.set(key.clone(), value.clone());
                }
            }
            xref.merge(older);
        }
        Ok(xref)
    }

    pub fn append(&mut self, entry: XrefEntry) {
        self.entries.push(entry);
    }

    /// Merge `other` (an older incremental section) into `self`. Entries
    /// already present keep priority; duplicates are dropped. Uniqueness is
    /// by `(object_number, generation)` or, for compressed entries, by
    /// `(parent_stream_object_number, index_in_parent_stream)`.
    pub fn merge(&mut self, other: XRef) {
        for entry in other.entries {
            let duplicate = self.entries.iter().any(|existing| {
                (existing.object_number == entry.object_number
                    && existing.generation == entry.generation)
                    || (entry.parent_stream_object_number.is_some()
                        && existing.parent_stream_object_number
                            == entry.parent_stream_object_number
                        && existing.index_in_parent_stream == entry.index_in_parent_stream)
            });
            if !duplicate {
                self.entries.push(entry);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The first entry for an object number, in merge order.
    pub fn entry_for(&self, object_number: u32) -> Option<&XrefEntry> {
        self.entries
            .iter()
            .find(|e| e.object_number == object_number)
    }

    /// Resolve an object number to its object.
    ///
    /// Free or absent entries resolve to `None`. The parser position is
    /// restored afterwards, so resolution can happen mid-parse.
    pub fn get(
        &self,
        object_number: u32,
        parser: &mut ObjectParser,
    ) -> Result<Option<Object>, PdfError> {
        let entry = match self.entry_for(object_number) {
            Some(e) => e.clone(),
            None => return Ok(None),
        };
        if !entry.is_in_use {
            return Ok(None);
        }

        if let Some(offset) = entry.byte_offset {
            let rewind = parser.tell();
            parser.seek(offset as usize);
            let result = parser.read_indirect_object(Some(self));
            parser.seek(rewind);
            let (_, object) = result?;
            return Ok(Some(object));
        }

        if let (Some(parent), Some(index)) = (
            entry.parent_stream_object_number,
            entry.index_in_parent_stream,
        ) {
            return self.get_from_object_stream(parent, index, parser);
        }
        Ok(None)
    }

    /// Resolve entry type 2: decode the parent object stream and read the
    /// object at the requested index from its payload.
    fn get_from_object_stream(
        &self,
        parent: u32,
        index: usize,
        parser: &mut ObjectParser,
    ) -> Result<Option<Object>, PdfError> {
        let parent_obj = self.get(parent, parser)?.unwrap_or(Object::Null);
        let mut stream = match parent_obj {
            Object::Stream(s) => s,
            other => {
                return Err(PdfError::Type {
                    expected: "object stream",
                    received: other.type_name(),
                })
            }
        };

        let first = match stream.dict.get("First") {
            Some(Object::Integer(i)) if *i >= 0 => *i as usize,
            Some(Object::Reference(r)) => {
                match self.get(r.object_number, parser)?.and_then(|o| o.as_i64()) {
                    Some(i) if i >= 0 => i as usize,
                    _ => {
                        return Err(PdfError::Type {
                            expected: "integer First",
                            received: "reference",
                        })
                    }
                }
            }
            Some(other) => {
                return Err(PdfError::Type {
                    expected: "integer First",
                    received: other.type_name(),
                })
            }
            None => {
                return Err(PdfError::Type {
                    expected: "integer First",
                    received: "null",
                })
            }
        };

        if let Err(e) = decode_stream(&mut stream) {
            debug!("unable to inflate object stream {}: {}", parent, e);
            return Err(e);
        }
        let payload = decoded_bytes(&stream);
        if first > payload.len() {
            return Ok(None);
        }
        if let Some(n) = stream.dict.get_i64("N") {
            if index as i64 >= n {
                return Ok(None);
            }
        }

        // objects are concatenated after `First`; the index-th one is
        // reached by reading sequentially
        let mut sub = ObjectParser::new(&payload[first..]);
        let mut object = Object::Null;
        for _ in 0..=index {
            object = sub.read_object(None)?;
        }
        Ok(Some(object))
    }
}

/// Scan backward from the end of the file in 1024-byte windows (overlapping
/// by the keyword length) for the last occurrence of `keyword`.
fn find_backwards(bytes: &[u8], keyword: &[u8]) -> Option<usize> {
    const WINDOW: usize = 1024;
    if bytes.len() < keyword.len() {
        return None;
    }
    let mut end = bytes.len();
    loop {
        let start = end.saturating_sub(WINDOW);
        let window = &bytes[start..end];
        if let Some(idx) = window
            .windows(keyword.len())
            .rposition(|w| w == keyword)
        {
            return Some(start + idx);
        }
        if start == 0 {
            return None;
        }
        end = start + keyword.len() - 1;
    }
}

/// Position the parser at the beginning of the newest xref section.
fn seek_to_xref_token(parser: &mut ObjectParser) -> Result<(), PdfError> {
    let start = match find_backwards(parser.bytes(), STARTXREF) {
        Some(start) => start,
        None => {
            // recovery mode: a table with no startxref pointer at all
            let table = find_backwards(parser.bytes(), b"xref")
                .ok_or(PdfError::StartXrefNotFound)?;
            parser.seek(table);
            return Ok(());
        }
    };
    parser.seek(start);
    let tok = parser.next_non_comment_token()?;

    // recovery mode: the scan landed on a bare xref table
    if tok.is_keyword("xref") {
        parser.seek(start);
        return Ok(());
    }
    if tok.is_keyword("startxref") {
        let offset_tok = parser.next_non_comment_token()?;
        let offset = offset_tok
            .text()
            .parse::<usize>()
            .map_err(|_| PdfError::syntax(offset_tok.offset, "invalid startxref offset"))?;
        parser.seek(offset);
        return Ok(());
    }
    Err(PdfError::syntax(tok.offset, "invalid startxref section"))
}

/// Parse one xref section at the current position: either a classical table
/// or an xref stream.
fn read_section(parser: &mut ObjectParser) -> Result<XRef, PdfError> {
    let rewind = parser.tell();
    let tok = parser.next_non_comment_token()?;
    if tok.is_keyword("xref") {
        read_classical_table(parser)
    } else {
        parser.seek(rewind);
        read_xref_stream(parser)
    }
}

/// Classical table: subsections of `<first> <count>` followed by 20-byte
/// entries, terminated by the `trailer` dictionary.
fn read_classical_table(parser: &mut ObjectParser) -> Result<XRef, PdfError> {
    let mut xref = XRef::default();
    loop {
        let tok = parser.next_non_comment_token()?;
        if tok.is_keyword("trailer") {
            let trailer = parser.read_object(None)?;
            match trailer {
                Object::Dictionary(d) => {
                    xref.trailer = d;
                    return Ok(xref);
                }
                other => {
                    return Err(PdfError::Type {
                        expected: "trailer dictionary",
                        received: other.type_name(),
                    })
                }
            }
        }

        let first = tok
            .text()
            .parse::<u32>()
            .map_err(|_| PdfError::syntax(tok.offset, "expected xref subsection start"))?;
        let count_tok = parser.next_non_comment_token()?;
        let count = count_tok
            .text()
            .parse::<u32>()
            .map_err(|_| PdfError::syntax(count_tok.offset, "expected xref subsection count"))?;

        for i in 0..count {
            let offset_tok = parser.next_non_comment_token()?;
            let gen_tok = parser.next_non_comment_token()?;
            let kind_tok = parser.next_non_comment_token()?;
            let offset = offset_tok
                .text()
                .parse::<u64>()
                .map_err(|_| PdfError::syntax(offset_tok.offset, "malformed xref entry offset"))?;
            let generation = gen_tok
                .text()
                .parse::<u16>()
                .map_err(|_| PdfError::syntax(gen_tok.offset, "malformed xref entry generation"))?;
            let entry = if kind_tok.is_keyword("n") {
                XrefEntry::in_use(first + i, generation, offset)
            } else if kind_tok.is_keyword("f") {
                XrefEntry::free(first + i, generation)
            } else {
                return Err(PdfError::syntax(
                    kind_tok.offset,
                    "xref entry must be marked n or f",
                ));
            };
            xref.append(entry);
        }
    }
}

/// XRef stream: `/Type /XRef` with `W` field widths and `Index` subsections;
/// fields are big-endian unsigned integers.
fn read_xref_stream(parser: &mut ObjectParser) -> Result<XRef, PdfError> {
    let (_, object) = parser.read_indirect_object(None)?;
    let mut stream = match object {
        Object::Stream(s) => s,
        other => {
            return Err(PdfError::Type {
                expected: "xref stream",
                received: other.type_name(),
            })
        }
    };

    let widths: Vec<usize> = stream
        .dict
        .get("W")
        .and_then(Object::as_array)
        .map(|a| a.iter().filter_map(|o| o.as_i64()).map(|i| i as usize).collect())
        .unwrap_or_default();
    if widths.len() != 3 {
        return Err(PdfError::Type {
            expected: "W array of three field widths",
            received: "array",
        });
    }

    let size = stream.dict.get_i64("Size").unwrap_or(0);
    let subsections: Vec<(u32, u32)> = match stream.dict.get("Index").and_then(Object::as_array) {
        Some(index) => index
            .chunks(2)
            .filter_map(|pair| match pair {
                [a, b] => Some((a.as_i64()? as u32, b.as_i64()? as u32)),
                _ => None,
            })
            .collect(),
        None => vec![(0, size as u32)],
    };

    decode_stream(&mut stream)?;
    let data = decoded_bytes(&stream);
    let entry_width: usize = widths.iter().sum();

    let mut xref = XRef::default();
    let mut pos = 0usize;
    for (first, count) in subsections {
        for i in 0..count {
            if pos + entry_width > data.len() {
                break;
            }
            let mut fields = [0u64; 3];
            for (f, w) in fields.iter_mut().zip(&widths) {
                for _ in 0..*w {
                    *f = *f << 8 | data[pos] as u64;
                    pos += 1;
                }
            }
            // a zero-width first field defaults to type 1
            let entry_type = if widths[0] == 0 { 1 } else { fields[0] };
            let object_number = first + i;
            let entry = match entry_type {
                0 => XrefEntry::free(object_number, fields[2] as u16),
                1 => XrefEntry::in_use(object_number, fields[2] as u16, fields[1]),
                2 => XrefEntry::compressed(object_number, fields[1] as u32, fields[2] as usize),
                _ => continue, // reserved types are ignored
            };
            xref.append(entry);
        }
    }
    xref.trailer = stream.dict.clone();
    Ok(xref)
}
