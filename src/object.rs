//! The raw PDF object model: everything a file can contain, after
//! tokenization and before interpretation.

use std::collections::BTreeMap;
use std::fmt;

use crate::errors::PdfError;

/// A PDF name: the interned identifier written `/Foo` in the file. `#XX`
/// escapes have already been decoded, so the payload is raw bytes (almost
/// always ASCII in practice).
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Name(pub Vec<u8>);

impl Name {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Name(bytes.into())
    }

    /// Lossy UTF-8 view, for display and for keying caches.
    pub fn as_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.0)
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.as_str())
    }
}

impl From<&str> for Name {
    fn from(s: &str) -> Self {
        Name(s.as_bytes().to_vec())
    }
}

impl PartialEq<str> for Name {
    fn eq(&self, other: &str) -> bool {
        self.0 == other.as_bytes()
    }
}

impl PartialEq<&str> for Name {
    fn eq(&self, other: &&str) -> bool {
        self.0 == other.as_bytes()
    }
}

/// Whether a string was written in literal `(…)` or hexadecimal `<…>` form.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StringFormat {
    Literal,
    Hexadecimal,
}

/// A PDF string: a raw byte sequence. The format is remembered only as a
/// parse artifact; the bytes are what matter.
#[derive(Clone, PartialEq, Eq)]
pub struct PdfString {
    pub bytes: Vec<u8>,
    pub format: StringFormat,
}

impl PdfString {
    pub fn literal(bytes: impl Into<Vec<u8>>) -> Self {
        PdfString {
            bytes: bytes.into(),
            format: StringFormat::Literal,
        }
    }

    pub fn hexadecimal(bytes: impl Into<Vec<u8>>) -> Self {
        PdfString {
            bytes: bytes.into(),
            format: StringFormat::Hexadecimal,
        }
    }

    /// Lossy UTF-8 view of the payload.
    pub fn as_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }
}

impl fmt::Debug for PdfString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.format {
            StringFormat::Literal => write!(f, "({})", self.as_str()),
            StringFormat::Hexadecimal => {
                write!(f, "<")?;
                for b in &self.bytes {
                    write!(f, "{:02X}", b)?;
                }
                write!(f, ">")
            }
        }
    }
}

/// A dictionary: a mapping from names to objects.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dictionary {
    map: BTreeMap<Name, Object>,
}

impl Dictionary {
    pub fn new() -> Self {
        Dictionary::default()
    }

    pub fn get(&self, key: &str) -> Option<&Object> {
        self.map.get(&Name::from(key))
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Object> {
        self.map.get_mut(&Name::from(key))
    }

    pub fn set(&mut self, key: impl Into<Name>, value: Object) {
        self.map.insert(key.into(), value);
    }

    pub fn remove(&mut self, key: &str) -> Option<Object> {
        self.map.remove(&Name::from(key))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.map.contains_key(&Name::from(key))
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Name, &Object)> {
        self.map.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&Name, &mut Object)> {
        self.map.iter_mut()
    }

    /// Convenience lookup for required integer entries (`Length`, `First`, …).
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Object::as_i64)
    }

    /// Convenience lookup for name entries, compared as UTF-8.
    pub fn get_name(&self, key: &str) -> Option<&Name> {
        match self.get(key) {
            Some(Object::Name(n)) => Some(n),
            _ => None,
        }
    }
}

impl FromIterator<(Name, Object)> for Dictionary {
    fn from_iter<I: IntoIterator<Item = (Name, Object)>>(iter: I) -> Self {
        Dictionary {
            map: iter.into_iter().collect(),
        }
    }
}

/// A stream object: a dictionary plus a byte payload.
///
/// `decoded_bytes` is the synthetic slot the filter chain fills in:
/// `None` means not yet decoded, `Some` is the idempotently cached result
/// (empty after a decode failure, so consumers observe empty bytes).
#[derive(Debug, Clone, PartialEq)]
pub struct Stream {
    pub dict: Dictionary,
    pub data: Vec<u8>,
    pub decoded_bytes: Option<Vec<u8>>,
}

impl Stream {
    pub fn new(dict: Dictionary, data: Vec<u8>) -> Self {
        Stream {
            dict,
            data,
            decoded_bytes: None,
        }
    }
}

/// An indirect reference in operand position: `12 0 R`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Reference {
    pub object_number: u32,
    pub generation: u16,
}

impl Reference {
    pub fn new(object_number: u32, generation: u16) -> Self {
        Reference {
            object_number,
            generation,
        }
    }
}

/// Any value a PDF file can contain.
///
/// Every non-scalar is owned by exactly one container, so containment forms
/// an acyclic tree by construction; `Reference` is the only way a cycle can
/// be expressed and is never followed during containment walks.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    Null,
    Boolean(bool),
    Integer(i64),
    Real(f64),
    Name(Name),
    String(PdfString),
    Array(Vec<Object>),
    Dictionary(Dictionary),
    Stream(Stream),
    Reference(Reference),
}

impl Object {
    /// The human-readable type tag, used in type errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            Object::Null => "null",
            Object::Boolean(_) => "boolean",
            Object::Integer(_) => "integer",
            Object::Real(_) => "real",
            Object::Name(_) => "name",
            Object::String(_) => "string",
            Object::Array(_) => "array",
            Object::Dictionary(_) => "dictionary",
            Object::Stream(_) => "stream",
            Object::Reference(_) => "reference",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Object::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Object::Integer(i) => Some(*i),
            Object::Real(r) if r.fract() == 0.0 => Some(*r as i64),
            _ => None,
        }
    }

    /// Any number as `f64`; the matrix and text machinery goes through this.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Object::Integer(i) => Some(*i as f64),
            Object::Real(r) => Some(*r),
            _ => None,
        }
    }

    pub fn as_name(&self) -> Option<&Name> {
        match self {
            Object::Name(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&PdfString> {
        match self {
            Object::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Object]> {
        match self {
            Object::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&Dictionary> {
        match self {
            Object::Dictionary(d) => Some(d),
            Object::Stream(s) => Some(&s.dict),
            _ => None,
        }
    }

    pub fn as_stream(&self) -> Option<&Stream> {
        match self {
            Object::Stream(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_stream_mut(&mut self) -> Option<&mut Stream> {
        match self {
            Object::Stream(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<Reference> {
        match self {
            Object::Reference(r) => Some(*r),
            _ => None,
        }
    }

    /// Like [`Object::as_f64`] but failing with a [`PdfError::Type`].
    pub fn expect_f64(&self) -> Result<f64, PdfError> {
        self.as_f64().ok_or(PdfError::Type {
            expected: "number",
            received: self.type_name(),
        })
    }

    /// Like [`Object::as_name`] but failing with a [`PdfError::Type`].
    pub fn expect_name(&self) -> Result<&Name, PdfError> {
        self.as_name().ok_or(PdfError::Type {
            expected: "name",
            received: self.type_name(),
        })
    }
}

impl From<i64> for Object {
    fn from(i: i64) -> Self {
        Object::Integer(i)
    }
}

impl From<f64> for Object {
    fn from(r: f64) -> Self {
        Object::Real(r)
    }
}

impl From<bool> for Object {
    fn from(b: bool) -> Self {
        Object::Boolean(b)
    }
}

impl From<Name> for Object {
    fn from(n: Name) -> Self {
        Object::Name(n)
    }
}
