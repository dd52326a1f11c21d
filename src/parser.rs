//! Composite object reader on top of the [`Lexer`]: arrays, dictionaries,
//! streams and indirect references.

use crate::errors::PdfError;
use crate::lexer::{Lexer, Token, TokenKind};
use crate::object::{Dictionary, Name, Object, PdfString, Reference, Stream};
use crate::xref::XRef;

/// One item of a content stream: either an operand or an operator mnemonic.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentItem {
    Operand(Object),
    Operator { mnemonic: String, offset: usize },
}

/// Reads whole objects from a byte slice. Positions are explicit (seek/tell)
/// so the xref machinery can jump to an offset, parse, and jump back.
pub struct ObjectParser<'a> {
    lexer: Lexer<'a>,
}

impl<'a> ObjectParser<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        ObjectParser {
            lexer: Lexer::new(bytes),
        }
    }

    pub fn bytes(&self) -> &'a [u8] {
        self.lexer.bytes()
    }

    pub fn tell(&self) -> usize {
        self.lexer.tell()
    }

    pub fn seek(&mut self, pos: usize) {
        self.lexer.seek(pos);
    }

    pub fn next_token(&mut self) -> Result<Token, PdfError> {
        self.lexer.next_token()
    }

    pub fn next_non_comment_token(&mut self) -> Result<Token, PdfError> {
        self.lexer.next_non_comment_token()
    }

    /// Read one object starting at the current position.
    ///
    /// `xref` is consulted when a stream's `Length` is an indirect reference;
    /// passing `None` is fine for self-contained buffers (content streams,
    /// object stream payloads).
    pub fn read_object(&mut self, xref: Option<&XRef>) -> Result<Object, PdfError> {
        let tok = self.next_non_comment_token()?;
        self.read_object_from(tok, xref)
    }

    fn read_object_from(&mut self, tok: Token, xref: Option<&XRef>) -> Result<Object, PdfError> {
        match tok.kind {
            TokenKind::Number => self.maybe_reference(tok),
            TokenKind::String => Ok(Object::String(PdfString::literal(tok.lexeme))),
            TokenKind::HexString => Ok(Object::String(PdfString::hexadecimal(tok.lexeme))),
            TokenKind::Name => Ok(Object::Name(Name::new(tok.lexeme))),
            TokenKind::StartArray => self.read_array_body(xref),
            TokenKind::StartDict => {
                let dict = self.read_dict_body(xref)?;
                self.maybe_stream(dict, xref)
            }
            TokenKind::Other => match tok.lexeme.as_slice() {
                b"true" => Ok(Object::Boolean(true)),
                b"false" => Ok(Object::Boolean(false)),
                b"null" => Ok(Object::Null),
                _ => Err(PdfError::syntax(
                    tok.offset,
                    format!("unexpected keyword {:?} in object position", tok.text()),
                )),
            },
            TokenKind::EndOfFile => {
                Err(PdfError::syntax(tok.offset, "unexpected end of input"))
            }
            _ => Err(PdfError::syntax(
                tok.offset,
                format!("unexpected token {:?} in object position", tok.kind),
            )),
        }
    }

    /// A number may be the start of `N G R`. Look ahead; fall back to the
    /// plain number when the pattern does not complete.
    fn maybe_reference(&mut self, first: Token) -> Result<Object, PdfError> {
        let number = parse_number(&first)?;
        let object_number = match &number {
            Object::Integer(i) if *i >= 0 && *i <= u32::MAX as i64 => *i as u32,
            _ => return Ok(number),
        };

        let rewind = self.tell();
        let second = self.next_non_comment_token()?;
        if second.kind == TokenKind::Number {
            if let Ok(Object::Integer(generation)) = parse_number(&second) {
                if (0..=u16::MAX as i64).contains(&generation) {
                    let third = self.next_non_comment_token()?;
                    if third.kind == TokenKind::Ref {
                        return Ok(Object::Reference(Reference::new(
                            object_number,
                            generation as u16,
                        )));
                    }
                }
            }
        }
        self.seek(rewind);
        Ok(number)
    }

    fn read_array_body(&mut self, xref: Option<&XRef>) -> Result<Object, PdfError> {
        let mut items = Vec::new();
        loop {
            let tok = self.next_non_comment_token()?;
            match tok.kind {
                TokenKind::EndArray => return Ok(Object::Array(items)),
                TokenKind::EndOfFile => {
                    return Err(PdfError::syntax(tok.offset, "unterminated array"))
                }
                _ => items.push(self.read_object_from(tok, xref)?),
            }
        }
    }

    fn read_dict_body(&mut self, xref: Option<&XRef>) -> Result<Dictionary, PdfError> {
        let mut dict = Dictionary::new();
        loop {
            let tok = self.next_non_comment_token()?;
            match tok.kind {
                TokenKind::EndDict => return Ok(dict),
                TokenKind::Name => {
                    let key = Name::new(tok.lexeme);
                    let value = self.read_object(xref)?;
                    dict.set(key, value);
                }
                TokenKind::EndOfFile => {
                    return Err(PdfError::syntax(tok.offset, "unterminated dictionary"))
                }
                _ => {
                    return Err(PdfError::syntax(
                        tok.offset,
                        "dictionary key must be a name",
                    ))
                }
            }
        }
    }

    /// A dictionary immediately followed by the `stream` keyword begins a
    /// stream; the raw payload is `Length` bytes after the end-of-line.
    fn maybe_stream(&mut self, dict: Dictionary, xref: Option<&XRef>) -> Result<Object, PdfError> {
        let rewind = self.tell();
        let tok = self.next_non_comment_token()?;
        if !tok.is_keyword("stream") {
            self.seek(rewind);
            return Ok(Object::Dictionary(dict));
        }

        let length = match dict.get("Length") {
            Some(Object::Integer(i)) if *i >= 0 => *i as usize,
            Some(Object::Reference(r)) => {
                let resolved = xref
                    .and_then(|x| x.get(r.object_number, self).ok().flatten())
                    .unwrap_or(Object::Null);
                match resolved.as_i64() {
                    Some(i) if i >= 0 => i as usize,
                    _ => {
                        return Err(PdfError::Type {
                            expected: "integer Length",
                            received: resolved.type_name(),
                        })
                    }
                }
            }
            Some(other) => {
                return Err(PdfError::Type {
                    expected: "integer Length",
                    received: other.type_name(),
                })
            }
            None => {
                return Err(PdfError::Type {
                    expected: "integer Length",
                    received: "null",
                })
            }
        };

        self.lexer.skip_stream_eol();
        let data = self.lexer.read_bytes(length)?.to_vec();

        let end = self.next_non_comment_token()?;
        if !end.is_keyword("endstream") {
            return Err(PdfError::syntax(
                end.offset,
                format!("expected endstream, found {:?}", end.text()),
            ));
        }
        Ok(Object::Stream(Stream::new(dict, data)))
    }

    /// Parse the indirect object framing `N G obj … endobj` at the current
    /// position and return the contained object.
    pub fn read_indirect_object(
        &mut self,
        xref: Option<&XRef>,
    ) -> Result<(Reference, Object), PdfError> {
        let num_tok = self.next_non_comment_token()?;
        let gen_tok = self.next_non_comment_token()?;
        let obj_tok = self.next_non_comment_token()?;
        let object_number = integer_from(&num_tok)?;
        let generation = integer_from(&gen_tok)?;
        if !obj_tok.is_keyword("obj") {
            return Err(PdfError::syntax(
                obj_tok.offset,
                format!("expected obj keyword, found {:?}", obj_tok.text()),
            ));
        }
        let object = self.read_object(xref)?;
        // `endobj` is consumed when present; some writers omit it
        let rewind = self.tell();
        match self.next_non_comment_token() {
            Ok(tok) if tok.is_keyword("endobj") => {}
            _ => self.seek(rewind),
        }
        Ok((
            Reference::new(object_number as u32, generation as u16),
            object,
        ))
    }

    /// Read the next operand or operator of a content stream. `None` at end
    /// of input.
    pub fn read_content_item(&mut self) -> Result<Option<ContentItem>, PdfError> {
        let tok = self.next_non_comment_token()?;
        match tok.kind {
            TokenKind::EndOfFile => Ok(None),
            TokenKind::Other => Ok(Some(ContentItem::Operator {
                mnemonic: tok.text().into_owned(),
                offset: tok.offset,
            })),
            TokenKind::Ref => Ok(Some(ContentItem::Operator {
                mnemonic: "R".to_string(),
                offset: tok.offset,
            })),
            TokenKind::Number => {
                // content streams contain no indirect references, keep plain
                Ok(Some(ContentItem::Operand(parse_number(&tok)?)))
            }
            _ => {
                let obj = self.read_object_from(tok, None)?;
                Ok(Some(ContentItem::Operand(obj)))
            }
        }
    }
}

fn integer_from(tok: &Token) -> Result<i64, PdfError> {
    if tok.kind != TokenKind::Number {
        return Err(PdfError::syntax(tok.offset, "expected a number"));
    }
    match parse_number(tok)? {
        Object::Integer(i) if i >= 0 => Ok(i),
        _ => Err(PdfError::syntax(tok.offset, "expected a non-negative integer")),
    }
}

fn parse_number(tok: &Token) -> Result<Object, PdfError> {
    let text = tok.text();
    if tok.lexeme.contains(&b'.') {
        text.parse::<f64>()
            .map(Object::Real)
            .map_err(|_| PdfError::syntax(tok.offset, "malformed real number"))
    } else {
        match text.parse::<i64>() {
            Ok(i) => Ok(Object::Integer(i)),
            // out-of-range integers degrade to reals
            Err(_) => text
                .parse::<f64>()
                .map(Object::Real)
                .map_err(|_| PdfError::syntax(tok.offset, "malformed number")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_scalars() {
        let mut p = ObjectParser::new(b"null true false 42 -1.5");
        assert_eq!(p.read_object(None).unwrap(), Object::Null);
        assert_eq!(p.read_object(None).unwrap(), Object::Boolean(true));
        assert_eq!(p.read_object(None).unwrap(), Object::Boolean(false));
        assert_eq!(p.read_object(None).unwrap(), Object::Integer(42));
        assert_eq!(p.read_object(None).unwrap(), Object::Real(-1.5));
    }

    #[test]
    fn test_read_reference_vs_number() {
        let mut p = ObjectParser::new(b"[7 0 R 7 0 8]");
        let arr = match p.read_object(None).unwrap() {
            Object::Array(a) => a,
            other => panic!("expected array, got {:?}", other),
        };
        assert_eq!(
            arr,
            vec![
                Object::Reference(Reference::new(7, 0)),
                Object::Integer(7),
                Object::Integer(0),
                Object::Integer(8),
            ]
        );
    }

    #[test]
    fn test_read_nested_dict() {
        let mut p = ObjectParser::new(b"<< /A << /B [1 2] >> /C (str) >>");
        let dict = match p.read_object(None).unwrap() {
            Object::Dictionary(d) => d,
            other => panic!("expected dictionary, got {:?}", other),
        };
        let inner = dict.get("A").unwrap().as_dict().unwrap();
        assert_eq!(
            inner.get("B").unwrap().as_array().unwrap(),
            &[Object::Integer(1), Object::Integer(2)]
        );
        assert_eq!(dict.get("C").unwrap().as_string().unwrap().bytes, b"str");
    }

    #[test]
    fn test_read_stream() {
        let mut p = ObjectParser::new(b"<< /Length 5 >>\nstream\nhello\nendstream");
        let stream = match p.read_object(None).unwrap() {
            Object::Stream(s) => s,
            other => panic!("expected stream, got {:?}", other),
        };
        assert_eq!(stream.data, b"hello");
        assert!(stream.decoded_bytes.is_none());
    }

    #[test]
    fn test_dict_key_must_be_name() {
        let mut p = ObjectParser::new(b"<< (A) 1 >>");
        assert!(matches!(
            p.read_object(None),
            Err(PdfError::Syntax { .. })
        ));
    }

    #[test]
    fn test_indirect_object_framing() {
        let mut p = ObjectParser::new(b"12 0 obj << /K 1 >> endobj");
        let (r, obj) = p.read_indirect_object(None).unwrap();
        assert_eq!(r, Reference::new(12, 0));
        assert_eq!(obj.as_dict().unwrap().get_i64("K"), Some(1));
    }

    #[test]
    fn test_content_items() {
        let mut p = ObjectParser::new(b"BT /F1 12 Tf (Hi) Tj ET");
        let mut ops = Vec::new();
        while let Some(item) = p.read_content_item().unwrap() {
            ops.push(item);
        }
        assert_eq!(ops.len(), 7);
        assert!(matches!(&ops[0], ContentItem::Operator { mnemonic, .. } if mnemonic == "BT"));
        assert!(matches!(&ops[1], ContentItem::Operand(Object::Name(n)) if n == &"F1"));
        assert!(matches!(&ops[4], ContentItem::Operand(Object::String(s)) if s.bytes == b"Hi"));
    }
}
