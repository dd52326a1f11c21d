//! ToUnicode CMap parsing.
//!
//! A CMap body is PDF syntax, so it goes through the regular [`Lexer`]:
//! source and destination codes arrive as already-decoded hex strings, and
//! the PostScript plumbing around the `bfchar`/`bfrange` blocks is skipped
//! as ordinary tokens.

use std::collections::BTreeMap;

use crate::errors::PdfError;
use crate::lexer::{Lexer, TokenKind};

/// The mapping from a character code to one or more Unicode code points.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToUnicodeCMap {
    pub mappings: BTreeMap<u32, Vec<u32>>,
}

/// Which mapping block the token stream is currently inside.
#[derive(Copy, Clone, PartialEq, Eq)]
enum Block {
    None,
    Chars,
    Ranges,
}

impl ToUnicodeCMap {
    /// Parses a ToUnicode CMap from the decoded stream text.
    pub fn parse(input: &str) -> Result<ToUnicodeCMap, PdfError> {
        let mut mappings = BTreeMap::new();
        let mut lexer = Lexer::new(input.as_bytes());
        let mut block = Block::None;
        // hex operands accumulated for the mapping currently being read
        let mut operands: Vec<Vec<u8>> = Vec::new();

        loop {
            let tok = lexer.next_token()?;
            match tok.kind {
                TokenKind::EndOfFile => break,
                TokenKind::Other => {
                    match tok.lexeme.as_slice() {
                        b"beginbfchar" => block = Block::Chars,
                        b"beginbfrange" => block = Block::Ranges,
                        b"endbfchar" | b"endbfrange" => block = Block::None,
                        _ => continue,
                    }
                    operands.clear();
                }
                TokenKind::HexString if block == Block::Chars => {
                    // pairs: <source> <destination>
                    operands.push(tok.lexeme);
                    if let [src, dst] = operands.as_slice() {
                        mappings.insert(code_value(src), unicode_scalars(dst));
                        operands.clear();
                    }
                }
                TokenKind::HexString if block == Block::Ranges => {
                    // triples: <low> <high> <first destination>
                    operands.push(tok.lexeme);
                    if let [low, high, dst] = operands.as_slice() {
                        insert_range(
                            &mut mappings,
                            code_value(low),
                            code_value(high),
                            unicode_scalars(dst),
                        );
                        operands.clear();
                    }
                }
                TokenKind::StartArray if block == Block::Ranges => {
                    // <low> <high> [ <dst> <dst> … ]: one destination per code
                    let destinations = read_destination_array(&mut lexer)?;
                    if let [low, high] = operands.as_slice() {
                        let low = code_value(low);
                        let high = code_value(high);
                        let expected = u64::from(high).saturating_sub(u64::from(low)) + 1;
                        if destinations.len() as u64 != expected {
                            return Err(PdfError::syntax(
                                tok.offset,
                                format!(
                                    "bfrange array has {} destinations for {} codes",
                                    destinations.len(),
                                    expected
                                ),
                            ));
                        }
                        for (i, dst) in destinations.into_iter().enumerate() {
                            mappings.insert(low + i as u32, dst);
                        }
                    }
                    operands.clear();
                }
                _ => {}
            }
        }
        Ok(ToUnicodeCMap { mappings })
    }

    /// The Unicode rendering of a character code, when mapped.
    pub fn map(&self, code: u32) -> Option<String> {
        let scalars = self.mappings.get(&code)?;
        let mut out = String::new();
        for &s in scalars {
            out.push(char::from_u32(s)?);
        }
        Some(out)
    }
}

/// A hex string as one big-endian code value (truncated to 32 bits).
fn code_value(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0u32, |acc, &b| acc << 8 | u32::from(b))
}

/// A destination hex string: a single code value, or a UTF-16BE sequence
/// when it spans more than two bytes.
fn unicode_scalars(bytes: &[u8]) -> Vec<u32> {
    if bytes.len() <= 2 {
        return vec![code_value(bytes)];
    }
    let units: Vec<u16> = bytes.chunks(2).map(|c| code_value(c) as u16).collect();
    char::decode_utf16(units)
        .map(|r| r.map(u32::from).unwrap_or(0xFFFD))
        .collect()
}

/// Expand `low..=high`, advancing the last scalar of the destination by one
/// per code.
fn insert_range(mappings: &mut BTreeMap<u32, Vec<u32>>, low: u32, high: u32, mut dst: Vec<u32>) {
    for code in low..=high {
        mappings.insert(code, dst.clone());
        if let Some(last) = dst.last_mut() {
            *last += 1;
        }
    }
}

fn read_destination_array(lexer: &mut Lexer) -> Result<Vec<Vec<u32>>, PdfError> {
    let mut out = Vec::new();
    loop {
        let tok = lexer.next_token()?;
        match tok.kind {
            TokenKind::EndArray => return Ok(out),
            TokenKind::HexString => out.push(unicode_scalars(&tok.lexeme)),
            TokenKind::EndOfFile => {
                return Err(PdfError::syntax(
                    tok.offset,
                    "unterminated bfrange destination array",
                ))
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bfchar() {
        let cmap = ToUnicodeCMap::parse(
            "2 beginbfchar\n<0048> <0048>\n<0003> <20AC>\nendbfchar",
        )
        .unwrap();
        assert_eq!(cmap.map(0x48).as_deref(), Some("H"));
        assert_eq!(cmap.map(0x03).as_deref(), Some("\u{20AC}"));
        assert_eq!(cmap.map(0x49), None);
    }

    #[test]
    fn test_bfchar_multi_scalar_destination() {
        // an ff ligature expands to two scalars
        let cmap = ToUnicodeCMap::parse(
            "1 beginbfchar\n<0010> <00660066>\nendbfchar",
        )
        .unwrap();
        assert_eq!(cmap.map(0x10).as_deref(), Some("ff"));
    }

    #[test]
    fn test_bfrange_consecutive() {
        let cmap =
            ToUnicodeCMap::parse("1 beginbfrange\n<0041> <0043> <0061>\nendbfrange").unwrap();
        assert_eq!(cmap.map(0x41).as_deref(), Some("a"));
        assert_eq!(cmap.map(0x42).as_deref(), Some("b"));
        assert_eq!(cmap.map(0x43).as_deref(), Some("c"));
    }

    #[test]
    fn test_bfrange_array_form() {
        let cmap = ToUnicodeCMap::parse(
            "1 beginbfrange\n<0001> <0002> [ <0058> <0059> ]\nendbfrange",
        )
        .unwrap();
        assert_eq!(cmap.map(1).as_deref(), Some("X"));
        assert_eq!(cmap.map(2).as_deref(), Some("Y"));
    }

    #[test]
    fn test_bfrange_array_length_mismatch() {
        let result = ToUnicodeCMap::parse(
            "1 beginbfrange\n<0001> <0003> [ <0041> <0042> ]\nendbfrange",
        );
        assert!(matches!(result, Err(PdfError::Syntax { .. })));
    }

    #[test]
    fn test_header_tokens_are_skipped() {
        let cmap = ToUnicodeCMap::parse(
            "/CIDInit /ProcSet findresource begin\n\
             12 dict begin\n\
             begincmap\n\
             /CIDSystemInfo <</Registry (Adobe) /Ordering (UCS) /Supplement 0>> def\n\
             1 beginbfchar\n<0041> <0042>\nendbfchar\n\
             endcmap end end",
        )
        .unwrap();
        assert_eq!(cmap.map(0x41).as_deref(), Some("B"));
        assert_eq!(cmap.mappings.len(), 1);
    }
}
