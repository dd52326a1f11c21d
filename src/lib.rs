//! # readpdf
//!
//! readpdf is a library for reading PDF documents: it parses the file into a
//! navigable object graph and replays every page's content stream as a
//! sequence of rendering events (glyphs, images, page boundaries) that
//! downstream consumers turn into extracted text, fonts and page metadata.
//!
//! # Getting started
//!
//! ```rust
//! use readpdf::*;
//!
//! // a minimal one-object document: xref table + trailer only
//! let bytes = b"xref\n0 1\n0000000000 65535 f \ntrailer<</Size 1>>\nstartxref\n0\n%%EOF";
//!
//! // listeners observe the rendering events while pages are interpreted
//! let mut listeners: Vec<Box<dyn EventListener>> =
//!     vec![Box::new(TextExtraction::new()), Box::new(FontExtraction::new())];
//!
//! let doc = read_pdf_from_bytes(bytes, &mut listeners).unwrap();
//! assert_eq!(doc.pages.len(), 0);
//!
//! // document metadata goes through one normalized path lookup
//! assert!(doc.info().title().is_none());
//! ```
//!
//! Interpretation is single-threaded and synchronous: events arrive on the
//! calling thread, in emission order, while `read_pdf_from_bytes` runs.

pub mod afm;
pub mod cmap;
pub mod color;
pub mod document;
pub mod document_info;
pub mod errors;
pub mod events;
pub mod filters;
pub mod font;
pub mod graphics_state;
pub mod interpreter;
pub mod lexer;
pub mod listeners;
pub mod matrix;
pub mod object;
pub mod operator;
pub mod operators;
pub mod parser;
pub mod rectangle;
pub mod transform;
pub mod xref;

#[cfg(test)]
mod tests;

pub use crate::color::{Color, ColorSpace, Cmyk, Greyscale, Rgb};
pub use crate::document::{read_pdf_from_bytes, PdfDocument, PdfPage};
pub use crate::document_info::DocumentInfo;
pub use crate::errors::PdfError;
pub use crate::events::{
    BulletListRenderEvent, Event, EventBus, EventListener, GlyphRenderEvent, ImageRenderEvent,
    LineRenderEvent, OrderedListRenderEvent, ParagraphRenderEvent,
};
pub use crate::font::{BuiltinFont, Font, FontDescriptor};
pub use crate::graphics_state::{
    BlendMode, GraphicsState, LineCapStyle, LineDashPattern, LineJoinStyle, RenderingIntent,
    TextRenderingMode,
};
pub use crate::listeners::{FontExtraction, TextExtraction};
pub use crate::matrix::Matrix;
pub use crate::object::{Dictionary, Name, Object, PdfString, Reference, Stream, StringFormat};
pub use crate::rectangle::Rect;
pub use crate::xref::{XRef, XrefEntry};
