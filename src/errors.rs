//! Errors for readpdf

use thiserror::Error;

/// Everything that can go wrong between the first byte of a file and the last
/// rendering event.
///
/// Parsing-level errors (`StartXrefNotFound`, `Syntax`) surface to the
/// ingestion caller; operator-level errors (`Type`, `UnknownOperator`) are
/// logged by the interpreter and do not terminate page interpretation.
#[derive(Debug, Error)]
pub enum PdfError {
    /// The backward scan from the end of the file found no `startxref` keyword.
    #[error("startxref keyword not found near end of file")]
    StartXrefNotFound,

    /// Malformed syntax at a known byte offset.
    #[error("syntax error at byte {byte_offset}: {message}")]
    Syntax { byte_offset: usize, message: String },

    /// A value had the wrong type for the operation at hand.
    #[error("type error: expected {expected}, received {received}")]
    Type {
        expected: &'static str,
        received: &'static str,
    },

    /// A stream filter could not decode its payload. The stream stays marked
    /// undecoded and consumers observe empty decoded bytes.
    #[error("filter {filter} failed to decode stream: {message}")]
    FilterDecode { filter: String, message: String },

    /// An operator mnemonic with no registered handler, encountered outside a
    /// compatibility section.
    #[error("unknown content stream operator {mnemonic:?}")]
    UnknownOperator { mnemonic: String },

    /// Raised by an [`EventListener`](crate::events::EventListener); isolated
    /// by the event bus and never propagated past it.
    #[error("event listener failed: {0}")]
    Listener(String),
}

impl PdfError {
    pub(crate) fn syntax(byte_offset: usize, message: impl Into<String>) -> Self {
        PdfError::Syntax {
            byte_offset,
            message: message.into(),
        }
    }
}
